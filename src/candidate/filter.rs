//! Confidence filtering of decoded anchors.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::bbox::BBox;
use crate::candidate::topk::Detection;
use crate::util::{SegNmsError, SegNmsResult};

/// Anchors that survived the confidence filter, with their decoded boxes,
/// per-class scores and mask coefficients gathered into dense storage.
#[derive(Clone, Debug)]
pub struct CandidateSet {
    anchor_idx: Vec<usize>,
    boxes: Vec<BBox>,
    /// Class-major scores, `[C, M]`.
    scores: Array2<f32>,
    /// `[M, K]`.
    coeffs: Array2<f32>,
}

impl CandidateSet {
    /// Builds a candidate set from already-gathered rows.
    ///
    /// `scores` is `[M, C]` (one row per candidate) and is stored transposed.
    pub fn new(
        anchor_idx: Vec<usize>,
        boxes: Vec<BBox>,
        scores: ArrayView2<'_, f32>,
        coeffs: ArrayView2<'_, f32>,
    ) -> SegNmsResult<Self> {
        let m = boxes.len();
        for (what, got) in [
            ("candidate anchor indices", anchor_idx.len()),
            ("candidate score rows", scores.nrows()),
            ("candidate coefficient rows", coeffs.nrows()),
        ] {
            if got != m {
                return Err(SegNmsError::ShapeMismatch {
                    what,
                    expected: m,
                    got,
                });
            }
        }
        Ok(Self {
            anchor_idx,
            boxes,
            scores: scores.t().as_standard_layout().into_owned(),
            coeffs: coeffs.to_owned(),
        })
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether no anchor survived the filter.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Number of foreground classes.
    pub fn num_classes(&self) -> usize {
        self.scores.nrows()
    }

    /// Decoded boxes, one per candidate.
    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    /// Scores of every candidate for `class_id`.
    pub fn class_scores(&self, class_id: usize) -> ArrayView1<'_, f32> {
        self.scores.row(class_id)
    }

    /// Original anchor index of candidate `idx`.
    pub fn anchor_index(&self, idx: usize) -> usize {
        self.anchor_idx[idx]
    }

    /// Mask coefficients of candidate `idx`.
    pub fn coeffs(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.coeffs.row(idx)
    }

    /// Materializes candidate `idx` as a detection of `class_id` with `bbox`.
    pub(crate) fn detection(&self, idx: usize, class_id: usize, score: f32, bbox: BBox) -> Detection {
        Detection {
            bbox,
            class_id,
            score,
            coeffs: self.coeffs.row(idx).to_vec(),
            anchor: self.anchor_idx[idx],
        }
    }
}

/// Keeps anchors whose best foreground score exceeds `threshold`.
///
/// `scores` is `[N, C]` without the background column, `coeffs` is
/// `[N, K]`; both must have one row per entry of `boxes`.
pub fn filter_candidates(
    boxes: &[BBox],
    scores: ArrayView2<'_, f32>,
    coeffs: ArrayView2<'_, f32>,
    threshold: f32,
) -> SegNmsResult<CandidateSet> {
    if scores.nrows() != boxes.len() {
        return Err(SegNmsError::ShapeMismatch {
            what: "class_scores rows",
            expected: boxes.len(),
            got: scores.nrows(),
        });
    }
    if coeffs.nrows() != boxes.len() {
        return Err(SegNmsError::ShapeMismatch {
            what: "mask_coeffs rows",
            expected: boxes.len(),
            got: coeffs.nrows(),
        });
    }
    let keep: Vec<usize> = scores
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().copied().fold(f32::NEG_INFINITY, f32::max) > threshold)
        .map(|(idx, _)| idx)
        .collect();

    let kept_boxes = keep.iter().map(|&idx| boxes[idx]).collect();
    let kept_scores = scores.select(Axis(0), &keep);
    let kept_coeffs = coeffs.select(Axis(0), &keep);
    CandidateSet::new(keep, kept_boxes, kept_scores.view(), kept_coeffs.view())
}

#[cfg(test)]
mod tests {
    use super::filter_candidates;
    use crate::bbox::BBox;
    use crate::SegNmsError;
    use ndarray::{array, Array2};

    fn unit_boxes(n: usize) -> Vec<BBox> {
        (0..n)
            .map(|i| BBox::new(0.0, 0.0, 0.1 * (i + 1) as f32, 0.1))
            .collect()
    }

    #[test]
    fn keeps_rows_whose_max_exceeds_threshold() {
        let scores = array![[0.1f32, 0.2], [0.6, 0.05], [0.3, 0.3], [0.0, 0.9]];
        let coeffs = Array2::<f32>::zeros((4, 3));
        let set = filter_candidates(&unit_boxes(4), scores.view(), coeffs.view(), 0.3).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.anchor_index(0), 1);
        assert_eq!(set.anchor_index(1), 3);
        assert_eq!(set.num_classes(), 2);
        assert_eq!(set.class_scores(1).to_vec(), vec![0.05, 0.9]);
    }

    #[test]
    fn empty_when_nothing_passes() {
        let scores = array![[0.1f32, 0.2], [0.05, 0.05]];
        let coeffs = Array2::<f32>::zeros((2, 4));
        let set = filter_candidates(&unit_boxes(2), scores.view(), coeffs.view(), 0.5).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.num_classes(), 2);
    }

    #[test]
    fn coefficient_row_mismatch_is_an_error() {
        let scores = Array2::from_elem((3, 1), 0.9f32);
        for rows in [1, 5] {
            let coeffs = Array2::<f32>::zeros((rows, 3));
            let err = filter_candidates(&unit_boxes(3), scores.view(), coeffs.view(), 0.1)
                .err()
                .unwrap();
            assert_eq!(
                err,
                SegNmsError::ShapeMismatch {
                    what: "mask_coeffs rows",
                    expected: 3,
                    got: rows,
                }
            );
        }
    }
}
