//! End-to-end post-processing of one frame.
//!
//! `decode -> filter -> suppress -> select -> visual threshold ->
//! reconstruct -> finalize`, each stage consuming only the output of the
//! previous one. A [`PostProcessor`] holds the validated configuration, the
//! read-only anchor set and the suppression strategy chosen at construction,
//! so one instance can serve concurrent frames.

use std::sync::Arc;

use ndarray::{s, ArrayView2, ArrayView3};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::anchor::codec::decode_boxes;
use crate::anchor::{generate_anchors, Anchor};
use crate::bbox::{BBox, PixelBox};
use crate::candidate::{filter_candidates, Detection};
use crate::config::presets::Preset;
use crate::config::PostConfig;
use crate::mask::{InstanceMask, MaskReconstructor};
use crate::nms::{Suppression, Suppressor};
use crate::trace::{trace_event, trace_span};
use crate::util::{SegNmsError, SegNmsResult};

/// Raw per-anchor network outputs for one image.
#[derive(Clone, Copy, Debug)]
pub struct RawPrediction<'a> {
    box_offsets: ArrayView2<'a, f32>,
    class_scores: ArrayView2<'a, f32>,
    mask_coeffs: ArrayView2<'a, f32>,
}

impl<'a> RawPrediction<'a> {
    /// Wraps `N x 4` offsets, `N x C` foreground scores and `N x K`
    /// coefficients.
    pub fn new(
        box_offsets: ArrayView2<'a, f32>,
        class_scores: ArrayView2<'a, f32>,
        mask_coeffs: ArrayView2<'a, f32>,
    ) -> SegNmsResult<Self> {
        let n = box_offsets.nrows();
        if box_offsets.ncols() != 4 {
            return Err(SegNmsError::ShapeMismatch {
                what: "box_offsets columns",
                expected: 4,
                got: box_offsets.ncols(),
            });
        }
        if class_scores.nrows() != n {
            return Err(SegNmsError::ShapeMismatch {
                what: "class_scores rows",
                expected: n,
                got: class_scores.nrows(),
            });
        }
        if mask_coeffs.nrows() != n {
            return Err(SegNmsError::ShapeMismatch {
                what: "mask_coeffs rows",
                expected: n,
                got: mask_coeffs.nrows(),
            });
        }
        Ok(Self {
            box_offsets,
            class_scores,
            mask_coeffs,
        })
    }

    /// Like [`RawPrediction::new`] but takes `N x (C + 1)` scores whose
    /// column 0 is the background class; that column is dropped.
    pub fn with_background(
        box_offsets: ArrayView2<'a, f32>,
        class_scores: ArrayView2<'a, f32>,
        mask_coeffs: ArrayView2<'a, f32>,
    ) -> SegNmsResult<Self> {
        if class_scores.ncols() == 0 {
            return Err(SegNmsError::ShapeMismatch {
                what: "class_scores columns",
                expected: 1,
                got: 0,
            });
        }
        Self::new(box_offsets, class_scores.slice_move(s![.., 1..]), mask_coeffs)
    }

    pub fn num_anchors(&self) -> usize {
        self.box_offsets.nrows()
    }

    /// Foreground classes.
    pub fn num_classes(&self) -> usize {
        self.class_scores.ncols()
    }

    pub fn num_coeffs(&self) -> usize {
        self.mask_coeffs.ncols()
    }
}

/// Shared `[H_p, W_p, K]` prototype masks for one image.
#[derive(Clone, Copy, Debug)]
pub struct Prototypes<'a> {
    data: ArrayView3<'a, f32>,
}

impl<'a> Prototypes<'a> {
    pub fn new(data: ArrayView3<'a, f32>) -> SegNmsResult<Self> {
        let (h, w, _) = data.dim();
        if h == 0 || w == 0 {
            return Err(SegNmsError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        Ok(Self { data })
    }

    /// Prototype grid height `H_p`.
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Prototype grid width `W_p`.
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Number of prototype channels `K`.
    pub fn depth(&self) -> usize {
        self.data.dim().2
    }

    /// The underlying `[H_p, W_p, K]` view.
    pub fn view(&self) -> ArrayView3<'a, f32> {
        self.data
    }
}

/// One frame's inputs for [`PostProcessor::process_batch`].
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub raw: RawPrediction<'a>,
    pub protos: Prototypes<'a>,
    pub image_width: usize,
    pub image_height: usize,
}

/// A finalized detection with its mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub class_id: usize,
    pub score: f32,
    /// Normalized box as produced by suppression.
    pub bbox: BBox,
    /// Box in output-image pixels.
    pub pixel_box: PixelBox,
    pub mask: InstanceMask,
}

/// Post-processing result for one image, sorted by descending score.
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    pub image_width: usize,
    pub image_height: usize,
    pub instances: Vec<Instance>,
}

impl Segmentation {
    /// No detections, with the declared output size.
    pub fn empty(image_width: usize, image_height: usize) -> Self {
        Self {
            image_width,
            image_height,
            instances: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Detection post-processor bound to one configuration and anchor set.
#[derive(Clone, Debug)]
pub struct PostProcessor {
    config: PostConfig,
    anchors: Arc<[Anchor]>,
    suppression: Suppression,
    masks: MaskReconstructor,
}

impl PostProcessor {
    /// Validates `config` and binds it to `anchors`.
    pub fn new(config: PostConfig, anchors: impl Into<Arc<[Anchor]>>) -> SegNmsResult<Self> {
        config.validate()?;
        let anchors = anchors.into();
        if anchors.is_empty() {
            return Err(SegNmsError::InvalidConfig {
                field: "anchors",
                reason: "anchor set is empty",
            });
        }
        Ok(Self {
            suppression: Suppression::from(config.nms),
            masks: MaskReconstructor::new(config.mask),
            config,
            anchors,
        })
    }

    /// Generates the preset's anchors and builds a processor for it.
    pub fn from_preset(preset: &Preset) -> SegNmsResult<Self> {
        Self::new(preset.post, generate_anchors(&preset.anchors)?)
    }

    pub fn config(&self) -> &PostConfig {
        &self.config
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    fn check_anchor_count(&self, raw: &RawPrediction<'_>) -> SegNmsResult<()> {
        if raw.num_anchors() != self.anchors.len() {
            return Err(SegNmsError::ShapeMismatch {
                what: "prediction rows vs anchors",
                expected: self.anchors.len(),
                got: raw.num_anchors(),
            });
        }
        Ok(())
    }

    /// Decoding, filtering, suppression and selection, without masks.
    ///
    /// Returns detections sorted by descending score; an empty vector when
    /// no anchor clears `nms_score_thre`.
    pub fn detect(&self, raw: &RawPrediction<'_>) -> SegNmsResult<Vec<Detection>> {
        self.check_anchor_count(raw)?;
        let cfg = &self.config;

        let boxes = decode_boxes(&self.anchors, raw.box_offsets, cfg.variances)?;
        let candidates =
            filter_candidates(&boxes, raw.class_scores, raw.mask_coeffs, cfg.nms_score_thre)?;
        trace_event!("candidates", count = candidates.len());
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        self.suppression.suppress(&candidates, cfg)
    }

    /// Runs the full pipeline for one image and output size.
    pub fn process(
        &self,
        raw: &RawPrediction<'_>,
        protos: &Prototypes<'_>,
        image_width: usize,
        image_height: usize,
    ) -> SegNmsResult<Segmentation> {
        let _span = trace_span!(
            "postprocess",
            anchors = raw.num_anchors(),
            width = image_width,
            height = image_height
        )
        .entered();

        if image_width == 0 || image_height == 0 {
            return Err(SegNmsError::InvalidDimensions {
                width: image_width,
                height: image_height,
            });
        }
        self.check_anchor_count(raw)?;
        if raw.num_coeffs() != protos.depth() {
            return Err(SegNmsError::ShapeMismatch {
                what: "mask_coeffs columns vs prototype depth",
                expected: protos.depth(),
                got: raw.num_coeffs(),
            });
        }

        let mut detections = self.detect(raw)?;
        if self.config.visual_thre > 0.0 {
            detections.retain(|d| d.score >= self.config.visual_thre);
        }
        if detections.is_empty() {
            return Ok(Segmentation::empty(image_width, image_height));
        }

        let instances = self.finalize(detections, protos, image_width, image_height)?;
        trace_event!("instances", count = instances.len());
        Ok(Segmentation {
            image_width,
            image_height,
            instances,
        })
    }

    fn finalize(
        &self,
        detections: Vec<Detection>,
        protos: &Prototypes<'_>,
        image_width: usize,
        image_height: usize,
    ) -> SegNmsResult<Vec<Instance>> {
        let _span = trace_span!("reconstruct_masks", detections = detections.len()).entered();
        detections
            .into_iter()
            .map(|det| {
                let mask = self.masks.reconstruct(
                    protos.view(),
                    &det.coeffs,
                    &det.bbox,
                    image_width,
                    image_height,
                )?;
                Ok(Instance {
                    class_id: det.class_id,
                    score: det.score,
                    bbox: det.bbox,
                    pixel_box: det.bbox.to_pixels(image_width, image_height),
                    mask,
                })
            })
            .collect()
    }

    fn process_frame(&self, frame: &Frame<'_>) -> SegNmsResult<Segmentation> {
        self.process(
            &frame.raw,
            &frame.protos,
            frame.image_width,
            frame.image_height,
        )
    }

    /// Processes independent frames, in parallel with the `rayon` feature.
    ///
    /// Output order matches input order and is identical with or without
    /// the feature. The first failing frame's error is returned.
    pub fn process_batch(&self, frames: &[Frame<'_>]) -> SegNmsResult<Vec<Segmentation>> {
        #[cfg(feature = "rayon")]
        {
            frames.par_iter().map(|f| self.process_frame(f)).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            frames.iter().map(|f| self.process_frame(f)).collect()
        }
    }
}
