//! Individual post-processing stages.
//!
//! For callers assembling their own pipeline, e.g. merging several
//! suppression passes or reconstructing masks for externally produced
//! detections. Most users only need [`PostProcessor`](crate::PostProcessor).

pub use crate::anchor::codec::{decode_box, decode_boxes, sanitize_coordinates};
pub use crate::candidate::{
    filter_candidates, merge_top, select_top, sort_detections_desc, CandidateSet,
};
pub use crate::mask::{resize_bilinear, MaskReconstructor};
pub use crate::nms::fast::max_iou_with_higher_ranked;
pub use crate::nms::iou::{intersection, iou, iou_inclusive, iou_matrix};
pub use crate::nms::{greedy_nms, FastNms, Suppression, Suppressor, TraditionalNms};
