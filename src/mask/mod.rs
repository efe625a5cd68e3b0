//! Instance mask reconstruction from prototype masks.
//!
//! An instance mask is `sigmoid(P · c)` over the prototype grid, where `P`
//! is the `[H_p, W_p, K]` prototype tensor and `c` the detection's `K`
//! coefficients. The probability map is cropped to the detection box,
//! resized bilinearly to the output image and binarized with a strict
//! `> threshold` test, so an exact `0.5` is background.

use ndarray::{s, Array2, ArrayView1, ArrayView2, ArrayView3};

use crate::anchor::codec::sanitize_coordinates;
use crate::bbox::BBox;
use crate::config::MaskConfig;
use crate::util::math::sigmoid;
use crate::util::{SegNmsError, SegNmsResult};

pub mod resize;

pub use resize::resize_bilinear;

/// Binary mask at output resolution, stored row-major as `0` / `1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceMask {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl InstanceMask {
    /// Thresholds a probability map: values `> threshold` become foreground.
    pub fn from_probabilities(probs: ArrayView2<'_, f32>, threshold: f32) -> Self {
        let (height, width) = probs.dim();
        let data = probs.iter().map(|&p| u8::from(p > threshold)).collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Output width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major `0` / `1` values.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether `(x, y)` is foreground; `None` outside the mask.
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).map(|&v| v != 0)
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Builds binary instance masks for kept detections.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaskReconstructor {
    cfg: MaskConfig,
}

impl MaskReconstructor {
    pub fn new(cfg: MaskConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MaskConfig {
        &self.cfg
    }

    /// Linear combination of the prototypes followed by a sigmoid,
    /// `[H_p, W_p]`.
    ///
    /// Each pixel is an ordered dot product over `K`, so identical inputs
    /// always produce identical maps.
    pub fn assemble(protos: ArrayView3<'_, f32>, coeffs: &[f32]) -> SegNmsResult<Array2<f32>> {
        let (h, w, k) = protos.dim();
        if coeffs.len() != k {
            return Err(SegNmsError::ShapeMismatch {
                what: "mask coefficients",
                expected: k,
                got: coeffs.len(),
            });
        }
        let coeffs = ArrayView1::from(coeffs);
        Ok(Array2::from_shape_fn((h, w), |(y, x)| {
            sigmoid(protos.slice(s![y, x, ..]).dot(&coeffs))
        }))
    }

    /// Zeroes every cell outside `bbox` (normalized), widened by
    /// `crop_padding` cells. Cell `(x, y)` survives when
    /// `x1 <= x < x2` and `y1 <= y < y2` in grid units.
    pub fn crop(&self, mask: &mut Array2<f32>, bbox: &BBox) {
        let (h, w) = mask.dim();
        let (wf, hf) = (w as f32, h as f32);
        let pad = self.cfg.crop_padding;
        let (x1, x2) = sanitize_coordinates(bbox.x1 * wf, bbox.x2 * wf, wf);
        let (y1, y2) = sanitize_coordinates(bbox.y1 * hf, bbox.y2 * hf, hf);
        let (x1, x2) = ((x1 - pad).max(0.0), (x2 + pad).min(wf));
        let (y1, y2) = ((y1 - pad).max(0.0), (y2 + pad).min(hf));

        for ((y, x), v) in mask.indexed_iter_mut() {
            let (xf, yf) = (x as f32, y as f32);
            if xf < x1 || xf >= x2 || yf < y1 || yf >= y2 {
                *v = 0.0;
            }
        }
    }

    /// Full reconstruction of one mask at `out_w x out_h`.
    pub fn reconstruct(
        &self,
        protos: ArrayView3<'_, f32>,
        coeffs: &[f32],
        bbox: &BBox,
        out_w: usize,
        out_h: usize,
    ) -> SegNmsResult<InstanceMask> {
        if out_w == 0 || out_h == 0 {
            return Err(SegNmsError::InvalidDimensions {
                width: out_w,
                height: out_h,
            });
        }
        let mut probs = Self::assemble(protos, coeffs)?;
        if self.cfg.crop {
            self.crop(&mut probs, bbox);
        }
        let resized = resize_bilinear(probs.view(), out_h, out_w);
        Ok(InstanceMask::from_probabilities(
            resized.view(),
            self.cfg.threshold,
        ))
    }
}
