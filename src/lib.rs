//! segnms turns raw per-anchor detector outputs into a bounded set of
//! non-overlapping instance detections with binary masks.
//!
//! The pipeline decodes anchor-relative boxes, drops low-confidence anchors,
//! runs per-class non-maximum suppression (matrix-form "fast" or exact
//! greedy), keeps the best detections across classes and rebuilds each
//! instance mask from shared prototype masks. Independent frames can be
//! processed in parallel with the `rayon` feature.

pub mod anchor;
pub mod bbox;
mod candidate;
pub mod config;
pub mod lowlevel;
pub mod mask;
pub mod nms;
mod pipeline;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub mod io;

pub use anchor::codec::BoxVariance;
pub use anchor::{generate_anchors, Anchor, AnchorConfig, AnchorLevel};
pub use bbox::{BBox, PixelBox};
pub use candidate::Detection;
pub use config::presets::{preset, preset_names, Preset};
pub use config::{MaskConfig, NmsStrategy, PostConfig};
pub use mask::InstanceMask;
pub use pipeline::{Frame, Instance, PostProcessor, Prototypes, RawPrediction, Segmentation};
pub use util::{SegNmsError, SegNmsResult};
