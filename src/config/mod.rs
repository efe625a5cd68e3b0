//! Post-processing configuration.
//!
//! [`PostConfig`] is a plain value: derive variants with struct-update
//! syntax (`PostConfig { top_k: 100, ..base }`) and hand it to
//! [`PostProcessor::new`](crate::PostProcessor::new), which validates it
//! before any frame is processed.

use crate::anchor::codec::BoxVariance;
use crate::util::{SegNmsError, SegNmsResult};

pub mod presets;

/// Which suppression routine runs after confidence filtering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NmsStrategy {
    /// Matrix-form suppression against higher-ranked candidates.
    Fast {
        /// Re-apply `nms_score_thre` per class inside suppression.
        second_threshold: bool,
    },
    /// Exact greedy suppression.
    Traditional {
        /// Inclusive pixel area convention (`x2 - x1 + 1`).
        inclusive_area: bool,
    },
}

impl Default for NmsStrategy {
    fn default() -> Self {
        Self::Fast {
            second_threshold: false,
        }
    }
}

/// Mask reconstruction settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskConfig {
    /// Zero the assembled mask outside the detection box.
    pub crop: bool,
    /// Extra prototype cells kept around the box when cropping.
    pub crop_padding: f32,
    /// Probabilities strictly above this value become foreground.
    pub threshold: f32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            crop: true,
            crop_padding: 0.0,
            threshold: 0.5,
        }
    }
}

/// Thresholds and limits for one post-processing configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostConfig {
    /// Candidates kept per class before suppression.
    pub top_k: usize,
    /// Global cap on returned detections.
    pub max_detections: usize,
    /// Overlap above which a lower-ranked box is suppressed.
    pub nms_iou_thre: f32,
    /// Minimum best-class score for an anchor to enter suppression.
    pub nms_score_thre: f32,
    pub nms: NmsStrategy,
    /// Display threshold applied after suppression; `0` disables it.
    pub visual_thre: f32,
    /// Side of the square network input in pixels.
    pub img_size: usize,
    pub variances: BoxVariance,
    pub mask: MaskConfig,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            top_k: 200,
            max_detections: 100,
            nms_iou_thre: 0.5,
            nms_score_thre: 0.05,
            nms: NmsStrategy::default(),
            visual_thre: 0.0,
            img_size: 550,
            variances: BoxVariance::default(),
            mask: MaskConfig::default(),
        }
    }
}

fn check_unit(field: &'static str, value: f32) -> SegNmsResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(SegNmsError::InvalidConfig {
            field,
            reason: "must be a finite value in [0, 1]",
        });
    }
    Ok(())
}

impl PostConfig {
    /// Checks every field; called by the processor constructor.
    pub fn validate(&self) -> SegNmsResult<()> {
        if self.top_k == 0 {
            return Err(SegNmsError::InvalidConfig {
                field: "top_k",
                reason: "must be at least 1",
            });
        }
        if self.max_detections == 0 {
            return Err(SegNmsError::InvalidConfig {
                field: "max_detections",
                reason: "must be at least 1",
            });
        }
        if self.img_size == 0 {
            return Err(SegNmsError::InvalidConfig {
                field: "img_size",
                reason: "must be positive",
            });
        }
        check_unit("nms_iou_thre", self.nms_iou_thre)?;
        check_unit("nms_score_thre", self.nms_score_thre)?;
        check_unit("visual_thre", self.visual_thre)?;

        let var = self.variances;
        if !(var.center.is_finite() && var.center > 0.0 && var.size.is_finite() && var.size > 0.0)
        {
            return Err(SegNmsError::InvalidConfig {
                field: "variances",
                reason: "must be finite and positive",
            });
        }

        if !self.mask.threshold.is_finite() || self.mask.threshold <= 0.0 || self.mask.threshold >= 1.0
        {
            return Err(SegNmsError::InvalidConfig {
                field: "mask.threshold",
                reason: "must lie strictly between 0 and 1",
            });
        }
        if !self.mask.crop_padding.is_finite() || self.mask.crop_padding < 0.0 {
            return Err(SegNmsError::InvalidConfig {
                field: "mask.crop_padding",
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}
