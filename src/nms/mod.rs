//! Per-class non-maximum suppression.
//!
//! Two strategies share one contract: [`FastNms`] compares every candidate
//! against the higher-ranked ones of its class through a dense IoU matrix,
//! while [`TraditionalNms`] runs exact greedy suppression. Both finish with
//! the same cross-class [`select_top`].

use ndarray::ArrayView1;

use crate::candidate::{select_top, CandidateSet, Detection};
use crate::config::{NmsStrategy, PostConfig};
use crate::util::SegNmsResult;

pub mod fast;
pub mod iou;
pub mod traditional;

pub use fast::FastNms;
pub use traditional::TraditionalNms;

/// Suppression strategy over a filtered candidate set.
pub trait Suppressor {
    /// Runs per-class suppression and returns the kept detections of every
    /// class in no particular order.
    ///
    /// `cfg` must already pass [`PostConfig::validate`]; a zero `img_size`
    /// or non-finite threshold yields meaningless boxes.
    fn suppress_classes(&self, candidates: &CandidateSet, cfg: &PostConfig) -> Vec<Detection>;

    /// Validates `cfg`, runs per-class suppression and keeps the global
    /// top `max_detections`, sorted by descending score.
    fn suppress(
        &self,
        candidates: &CandidateSet,
        cfg: &PostConfig,
    ) -> SegNmsResult<Vec<Detection>> {
        cfg.validate()?;
        Ok(select_top(
            self.suppress_classes(candidates, cfg),
            cfg.max_detections,
        ))
    }
}

/// Strategy resolved once from [`NmsStrategy`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Suppression {
    Fast(FastNms),
    Traditional(TraditionalNms),
}

impl From<NmsStrategy> for Suppression {
    fn from(strategy: NmsStrategy) -> Self {
        match strategy {
            NmsStrategy::Fast { second_threshold } => Self::Fast(FastNms { second_threshold }),
            NmsStrategy::Traditional { inclusive_area } => {
                Self::Traditional(TraditionalNms { inclusive_area })
            }
        }
    }
}

impl Suppressor for Suppression {
    fn suppress_classes(&self, candidates: &CandidateSet, cfg: &PostConfig) -> Vec<Detection> {
        match self {
            Self::Fast(nms) => nms.suppress_classes(candidates, cfg),
            Self::Traditional(nms) => nms.suppress_classes(candidates, cfg),
        }
    }
}

/// Candidate indices ordered by descending score; equal scores keep index
/// order.
pub(crate) fn rank_desc(scores: ArrayView1<'_, f32>, indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| a.cmp(&b))
    });
}

/// Greedy suppression over `order` (already ranked best-first).
///
/// Returns the kept entries of `order`, best-first. A candidate is dropped
/// when its overlap with an earlier kept candidate exceeds `iou_threshold`.
pub fn greedy_nms<T, F>(items: &[T], order: &[usize], iou_threshold: f32, overlap: F) -> Vec<usize>
where
    F: Fn(&T, &T) -> f32,
{
    let mut suppressed = vec![false; order.len()];
    let mut keep = Vec::new();

    for (rank, &idx) in order.iter().enumerate() {
        if suppressed[rank] {
            continue;
        }
        keep.push(idx);
        for (other_rank, &other) in order.iter().enumerate().skip(rank + 1) {
            if suppressed[other_rank] {
                continue;
            }
            if overlap(&items[idx], &items[other]) > iou_threshold {
                suppressed[other_rank] = true;
            }
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::{greedy_nms, rank_desc};
    use crate::bbox::BBox;
    use crate::nms::iou::iou;
    use ndarray::array;

    #[test]
    fn rank_desc_is_stable_on_ties() {
        let scores = array![0.5f32, 0.9, 0.5, 0.1];
        let mut idx = vec![0, 1, 2, 3];
        rank_desc(scores.view(), &mut idx);
        assert_eq!(idx, vec![1, 0, 2, 3]);
    }

    #[test]
    fn greedy_nms_keeps_non_overlapping_chain() {
        let boxes = [
            BBox::new(0.0, 0.0, 10.0, 10.0),
            BBox::new(1.0, 0.0, 11.0, 10.0),
            BBox::new(20.0, 0.0, 30.0, 10.0),
        ];
        let keep = greedy_nms(&boxes, &[0, 1, 2], 0.5, iou);
        assert_eq!(keep, vec![0, 2]);
    }

    #[test]
    fn suppressed_candidates_do_not_suppress() {
        // 1 overlaps 0 and 2, but 0 and 2 are disjoint.
        let boxes = [
            BBox::new(0.0, 0.0, 10.0, 10.0),
            BBox::new(3.0, 0.0, 13.0, 10.0),
            BBox::new(10.0, 0.0, 20.0, 10.0),
        ];
        let keep = greedy_nms(&boxes, &[0, 1, 2], 0.3, iou);
        assert_eq!(keep, vec![0, 2]);
    }
}
