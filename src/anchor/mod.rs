//! Anchor (prior box) generation.
//!
//! Anchors are produced once per configuration as the cross product of the
//! feature-map cells of every pyramid level, the scales assigned to that
//! level, and the shared aspect ratios. Coordinates are normalized to the
//! square network input of side `img_size`. The resulting set is read-only
//! and can be shared between concurrent post-processing calls.

use crate::bbox::BBox;
use crate::util::math::div_ceil;
use crate::util::{SegNmsError, SegNmsResult};

pub mod codec;

/// Stride of the finest pyramid level relative to the network input.
const FINEST_STRIDE: usize = 8;

/// Center-form prior box, normalized to the network input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl Anchor {
    /// Corner form of the anchor itself.
    pub fn to_bbox(self) -> BBox {
        BBox::from_center(self.cx, self.cy, self.w, self.h)
    }
}

/// One feature-map level: its grid and the scales (in input pixels) placed
/// on every cell.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorLevel {
    pub grid_h: usize,
    pub grid_w: usize,
    pub scales: Vec<f32>,
}

impl AnchorLevel {
    /// Number of anchors this level contributes for `num_ratios` ratios.
    pub fn anchor_count(&self, num_ratios: usize) -> usize {
        self.grid_h * self.grid_w * self.scales.len() * num_ratios
    }
}

/// Anchor layout for one network configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorConfig {
    /// Side length of the square network input in pixels.
    pub img_size: usize,
    pub levels: Vec<AnchorLevel>,
    pub aspect_ratios: Vec<f32>,
    /// Forces `h = w` for every ratio (legacy checkpoint layout).
    pub square_anchors: bool,
}

impl AnchorConfig {
    /// Builds a feature-pyramid layout with one scale per level.
    ///
    /// Level 0 has a `ceil(img_size / 8)` grid; every further level halves it
    /// (rounding up), so a 550 input yields grids of 69, 35, 18, 9 and 5.
    pub fn fpn(img_size: usize, scales: &[f32], aspect_ratios: &[f32], square: bool) -> Self {
        let mut levels = Vec::with_capacity(scales.len());
        let mut grid = div_ceil(img_size, FINEST_STRIDE);
        for &scale in scales {
            levels.push(AnchorLevel {
                grid_h: grid,
                grid_w: grid,
                scales: vec![scale],
            });
            grid = div_ceil(grid, 2);
        }
        Self {
            img_size,
            levels,
            aspect_ratios: aspect_ratios.to_vec(),
            square_anchors: square,
        }
    }

    /// Same layout at another input size.
    ///
    /// Grids are recomputed with the pyramid rule of [`AnchorConfig::fpn`]
    /// and every scale becomes `floor(s * img_size / self.img_size)`.
    pub fn resized(&self, img_size: usize) -> Self {
        let factor = img_size as f32 / self.img_size.max(1) as f32;
        let mut grid = div_ceil(img_size, FINEST_STRIDE);
        let levels = self
            .levels
            .iter()
            .map(|level| {
                let resized = AnchorLevel {
                    grid_h: grid,
                    grid_w: grid,
                    scales: level.scales.iter().map(|s| (s * factor).floor()).collect(),
                };
                grid = div_ceil(grid, 2);
                resized
            })
            .collect();
        Self {
            img_size,
            levels,
            aspect_ratios: self.aspect_ratios.clone(),
            square_anchors: self.square_anchors,
        }
    }

    /// Total anchors: sum over levels of cells x scales x ratios.
    pub fn anchor_count(&self) -> usize {
        self.levels
            .iter()
            .map(|level| level.anchor_count(self.aspect_ratios.len()))
            .sum()
    }

    fn validate(&self) -> SegNmsResult<()> {
        if self.img_size == 0 {
            return Err(SegNmsError::InvalidConfig {
                field: "img_size",
                reason: "must be positive",
            });
        }
        if self.levels.is_empty() {
            return Err(SegNmsError::InvalidConfig {
                field: "levels",
                reason: "at least one anchor level is required",
            });
        }
        if self.aspect_ratios.is_empty() {
            return Err(SegNmsError::InvalidConfig {
                field: "aspect_ratios",
                reason: "at least one aspect ratio is required",
            });
        }
        if self
            .aspect_ratios
            .iter()
            .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(SegNmsError::InvalidConfig {
                field: "aspect_ratios",
                reason: "ratios must be finite and positive",
            });
        }
        for level in &self.levels {
            if level.grid_h == 0 || level.grid_w == 0 {
                return Err(SegNmsError::InvalidDimensions {
                    width: level.grid_w,
                    height: level.grid_h,
                });
            }
            if level.scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err(SegNmsError::InvalidConfig {
                    field: "scales",
                    reason: "scales must be finite and positive",
                });
            }
        }
        Ok(())
    }
}

/// Generates the anchor set for `cfg`.
///
/// Ordering is level-major, then row-major over cells, then scales, then
/// aspect ratios; anchor `i` pairs with row `i` of every prediction tensor.
pub fn generate_anchors(cfg: &AnchorConfig) -> SegNmsResult<Vec<Anchor>> {
    cfg.validate()?;
    let img_size = cfg.img_size as f32;
    let mut anchors = Vec::with_capacity(cfg.anchor_count());

    for level in &cfg.levels {
        let gw = level.grid_w as f32;
        let gh = level.grid_h as f32;
        for j in 0..level.grid_h {
            for i in 0..level.grid_w {
                let cx = (i as f32 + 0.5) / gw;
                let cy = (j as f32 + 0.5) / gh;
                for &scale in &level.scales {
                    for &ratio in &cfg.aspect_ratios {
                        let r = ratio.sqrt();
                        let w = scale * r / img_size;
                        let h = if cfg.square_anchors {
                            w
                        } else {
                            scale / r / img_size
                        };
                        anchors.push(Anchor { cx, cy, w, h });
                    }
                }
            }
        }
    }

    Ok(anchors)
}
