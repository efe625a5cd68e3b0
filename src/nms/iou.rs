//! Pairwise Jaccard overlap.

use ndarray::Array2;

use crate::bbox::BBox;

/// Area of the overlap rectangle, never negative.
pub fn intersection(a: &BBox, b: &BBox) -> f32 {
    let w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    w * h
}

/// Intersection over union. Pairs with an empty union overlap by zero.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let inter = intersection(a, b);
    let union = a.area() + b.area() - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

/// IoU under the inclusive pixel convention, where a box spanning
/// `x1..=x2` covers `x2 - x1 + 1` pixels. Boxes must be in pixel units.
pub fn iou_inclusive(a: &BBox, b: &BBox) -> f32 {
    let side = |lo: f32, hi: f32| (hi - lo + 1.0).max(0.0);
    let inter = side(a.x1.max(b.x1), a.x2.min(b.x2)) * side(a.y1.max(b.y1), a.y2.min(b.y2));
    let area_a = side(a.x1, a.x2) * side(a.y1, a.y2);
    let area_b = side(b.x1, b.x2) * side(b.y1, b.y2);
    let union = area_a + area_b - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

/// Dense `[a.len(), b.len()]` IoU matrix.
pub fn iou_matrix(a: &[BBox], b: &[BBox]) -> Array2<f32> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| iou(&a[i], &b[j]))
}
