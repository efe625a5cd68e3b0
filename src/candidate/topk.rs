//! Cross-class ranking and truncation of suppressed detections.

use std::cmp::Ordering;

use crate::bbox::BBox;

/// A detection that survived per-class suppression.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Normalized corner box.
    pub bbox: BBox,
    /// Foreground class index; the background class is never reported.
    pub class_id: usize,
    pub score: f32,
    /// Mask coefficients carried over from the source anchor.
    pub coeffs: Vec<f32>,
    /// Index of the anchor this detection was decoded from.
    pub anchor: usize,
}

fn detection_cmp_desc(a: &Detection, b: &Detection) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.class_id.cmp(&b.class_id))
        .then_with(|| a.anchor.cmp(&b.anchor))
}

/// Sorts detections by descending score with deterministic tie-breaking
/// (class id, then anchor index).
pub fn sort_detections_desc(detections: &mut [Detection]) {
    detections.sort_by(detection_cmp_desc);
}

/// Ranks detections globally across classes and keeps the best
/// `max_detections`.
pub fn select_top(mut detections: Vec<Detection>, max_detections: usize) -> Vec<Detection> {
    sort_detections_desc(&mut detections);
    detections.truncate(max_detections);
    detections
}

/// Pools the output of several suppression passes and selects the best
/// `max_detections` among them.
pub fn merge_top<I>(passes: I, max_detections: usize) -> Vec<Detection>
where
    I: IntoIterator<Item = Vec<Detection>>,
{
    let pooled = passes.into_iter().flatten().collect();
    select_top(pooled, max_detections)
}
