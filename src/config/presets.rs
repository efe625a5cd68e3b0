//! Named configuration presets.
//!
//! Presets live in a static table and are resolved by plain name lookup, so
//! the available set can be listed without constructing anything.

use crate::anchor::AnchorConfig;
use crate::config::PostConfig;
use crate::util::{SegNmsError, SegNmsResult};

/// Foreground class names of the 80-class COCO layout.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Foreground class names of the 20-class Pascal VOC layout.
pub const PASCAL_CLASSES: [&str; 20] = [
    "aeroplane", "bicycle", "bird", "boat", "bottle", "bus", "car", "cat", "chair", "cow",
    "diningtable", "dog", "horse", "motorbike", "person", "pottedplant", "sheep", "sofa", "train",
    "tvmonitor",
];

const ASPECT_RATIOS: [f32; 3] = [1.0, 0.5, 2.0];

/// A complete post-processing setup for one trained model.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub post: PostConfig,
    pub anchors: AnchorConfig,
    /// Foreground class names, indexed by `Detection::class_id`.
    pub class_names: &'static [&'static str],
}

impl Preset {
    /// Number of foreground classes.
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Derives the preset at another square input size; anchor scales are
    /// rescaled proportionally.
    pub fn with_img_size(&self, img_size: usize) -> Self {
        Self {
            name: self.name,
            post: PostConfig {
                img_size,
                ..self.post
            },
            anchors: self.anchors.resized(img_size),
            class_names: self.class_names,
        }
    }
}

fn coco_r101() -> Preset {
    let post = PostConfig::default();
    Preset {
        name: "coco_r101",
        anchors: AnchorConfig::fpn(
            post.img_size,
            &[24.0, 48.0, 96.0, 192.0, 384.0],
            &ASPECT_RATIOS,
            true,
        ),
        post,
        class_names: &COCO_CLASSES,
    }
}

fn coco_r50() -> Preset {
    Preset {
        name: "coco_r50",
        ..coco_r101()
    }
}

fn pascal_r50() -> Preset {
    let post = PostConfig::default();
    Preset {
        name: "pascal_r50",
        anchors: AnchorConfig::fpn(
            post.img_size,
            &[32.0, 64.0, 128.0, 256.0, 512.0],
            &ASPECT_RATIOS,
            false,
        ),
        post,
        class_names: &PASCAL_CLASSES,
    }
}

const PRESETS: &[(&str, fn() -> Preset)] = &[
    ("coco_r101", coco_r101),
    ("coco_r50", coco_r50),
    ("pascal_r50", pascal_r50),
];

/// Names of every registered preset, in registration order.
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

/// Looks up a preset by name.
pub fn preset(name: &str) -> SegNmsResult<Preset> {
    PRESETS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, build)| build())
        .ok_or_else(|| SegNmsError::UnknownPreset {
            name: name.to_owned(),
        })
}
