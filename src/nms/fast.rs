//! Matrix-form suppression.
//!
//! Each class keeps its `top_k` best candidates, builds their full IoU
//! matrix and drops a candidate when any strictly higher-ranked candidate
//! of the same class overlaps it by more than `nms_iou_thre`. Suppressed
//! candidates still suppress lower-ranked ones, so the result can differ
//! from greedy NMS; the work per class is uniform and loop-free over pairs.

use ndarray::{Array1, Axis};

use crate::bbox::BBox;
use crate::candidate::{CandidateSet, Detection};
use crate::config::PostConfig;
use crate::nms::iou::iou_matrix;
use crate::nms::{rank_desc, Suppressor};
use crate::trace::{trace_event, trace_span};

/// Fast NMS.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FastNms {
    /// Also require `score > nms_score_thre` per class. When off, anchors
    /// that passed the filter on another class compete here with their low
    /// score and are only cut by the global `max_detections` ranking.
    pub second_threshold: bool,
}

/// For each column `j`, the largest IoU against any row `i < j`.
///
/// Equivalent to zeroing the lower triangle and diagonal and reducing over
/// rows; the first candidate always gets zero.
pub fn max_iou_with_higher_ranked(boxes: &[BBox]) -> Array1<f32> {
    let mut iou = iou_matrix(boxes, boxes);
    iou.indexed_iter_mut()
        .filter(|((i, j), _)| j <= i)
        .for_each(|(_, v)| *v = 0.0);
    iou.fold_axis(Axis(0), 0.0f32, |acc, &v| acc.max(v))
}

impl Suppressor for FastNms {
    fn suppress_classes(&self, candidates: &CandidateSet, cfg: &PostConfig) -> Vec<Detection> {
        let _span = trace_span!(
            "fast_nms",
            candidates = candidates.len(),
            classes = candidates.num_classes()
        )
        .entered();

        let mut kept = Vec::new();
        for class_id in 0..candidates.num_classes() {
            let scores = candidates.class_scores(class_id);
            let mut order: Vec<usize> = (0..candidates.len()).collect();
            rank_desc(scores, &mut order);
            order.truncate(cfg.top_k);
            if order.is_empty() {
                continue;
            }

            let boxes: Vec<BBox> = order.iter().map(|&i| candidates.boxes()[i]).collect();
            let iou_max = max_iou_with_higher_ranked(&boxes);

            for ((&idx, bbox), &overlap) in order.iter().zip(&boxes).zip(iou_max.iter()) {
                let score = scores[idx];
                if overlap > cfg.nms_iou_thre {
                    continue;
                }
                if self.second_threshold && score <= cfg.nms_score_thre {
                    continue;
                }
                kept.push(candidates.detection(idx, class_id, score, *bbox));
            }
        }

        trace_event!("fast_nms_kept", count = kept.len());
        kept
    }
}
