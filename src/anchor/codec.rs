//! Anchor-relative box decoding and coordinate sanitizing.

use ndarray::ArrayView2;

use crate::anchor::Anchor;
use crate::bbox::BBox;
use crate::util::{SegNmsError, SegNmsResult};

/// Variance scaling applied to predicted offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxVariance {
    /// Multiplier on center offsets.
    pub center: f32,
    /// Multiplier on log-size offsets.
    pub size: f32,
}

impl BoxVariance {
    /// Raw offsets with no variance scaling.
    pub const UNSCALED: Self = Self {
        center: 1.0,
        size: 1.0,
    };
}

impl Default for BoxVariance {
    /// SSD-style `0.1 / 0.2` variances.
    fn default() -> Self {
        Self {
            center: 0.1,
            size: 0.2,
        }
    }
}

/// Decodes one anchor and its `[dx, dy, dw, dh]` offsets into a corner box
/// normalized to `[0, 1]`.
pub fn decode_box(anchor: &Anchor, offsets: [f32; 4], var: BoxVariance) -> BBox {
    let cx = anchor.cx + offsets[0] * var.center * anchor.w;
    let cy = anchor.cy + offsets[1] * var.center * anchor.h;
    let w = anchor.w * (offsets[2] * var.size).exp();
    let h = anchor.h * (offsets[3] * var.size).exp();
    BBox::from_center(cx, cy, w, h).sanitized(1.0, 1.0)
}

/// Decodes every anchor against its row of `offsets` (`N x 4`).
pub fn decode_boxes(
    anchors: &[Anchor],
    offsets: ArrayView2<'_, f32>,
    var: BoxVariance,
) -> SegNmsResult<Vec<BBox>> {
    if offsets.ncols() != 4 {
        return Err(SegNmsError::ShapeMismatch {
            what: "box_offsets columns",
            expected: 4,
            got: offsets.ncols(),
        });
    }
    if offsets.nrows() != anchors.len() {
        return Err(SegNmsError::ShapeMismatch {
            what: "box_offsets rows",
            expected: anchors.len(),
            got: offsets.nrows(),
        });
    }

    Ok(anchors
        .iter()
        .zip(offsets.rows())
        .map(|(anchor, row)| decode_box(anchor, [row[0], row[1], row[2], row[3]], var))
        .collect())
}

/// Orders a `(min, max)` coordinate pair and clamps both into
/// `[0, max_extent]`.
///
/// NaN inputs collapse to zero so the output always satisfies
/// `0 <= lo <= hi <= max_extent`.
pub fn sanitize_coordinates(a: f32, b: f32, max_extent: f32) -> (f32, f32) {
    let extent = max_extent.max(0.0);
    let a = if a.is_nan() { 0.0 } else { a };
    let b = if b.is_nan() { 0.0 } else { b };
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (lo.clamp(0.0, extent), hi.clamp(0.0, extent))
}
