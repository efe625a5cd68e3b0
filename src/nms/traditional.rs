//! Exact greedy suppression, one class at a time.

use crate::bbox::BBox;
use crate::candidate::{CandidateSet, Detection};
use crate::config::PostConfig;
use crate::nms::iou::{iou, iou_inclusive};
use crate::nms::{greedy_nms, rank_desc, Suppressor};
use crate::trace::{trace_event, trace_span};

/// Greedy NMS.
///
/// Boxes are scaled by `img_size` into input-pixel units before
/// suppression and scaled back for the kept detections.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TraditionalNms {
    /// Use the inclusive pixel convention (`x2 - x1 + 1`) for areas.
    pub inclusive_area: bool,
}

impl Suppressor for TraditionalNms {
    fn suppress_classes(&self, candidates: &CandidateSet, cfg: &PostConfig) -> Vec<Detection> {
        let _span = trace_span!(
            "traditional_nms",
            candidates = candidates.len(),
            classes = candidates.num_classes()
        )
        .entered();

        let scale = cfg.img_size as f32;
        let scaled: Vec<BBox> = candidates.boxes().iter().map(|b| b.scale(scale)).collect();
        let overlap: fn(&BBox, &BBox) -> f32 = if self.inclusive_area {
            iou_inclusive
        } else {
            iou
        };

        let mut kept = Vec::new();
        for class_id in 0..candidates.num_classes() {
            let scores = candidates.class_scores(class_id);
            let mut order: Vec<usize> = (0..candidates.len())
                .filter(|&i| scores[i] > cfg.nms_score_thre)
                .collect();
            if order.is_empty() {
                continue;
            }
            rank_desc(scores, &mut order);
            order.truncate(cfg.top_k);

            for idx in greedy_nms(&scaled, &order, cfg.nms_iou_thre, overlap) {
                let bbox = scaled[idx].unscale(scale);
                kept.push(candidates.detection(idx, class_id, scores[idx], bbox));
            }
        }

        trace_event!("traditional_nms_kept", count = kept.len());
        kept
    }
}
