//! Candidate reduction ahead of suppression and cross-class selection after.
//!
//! `filter` shrinks the anchor set to the rows worth suppressing; `topk`
//! holds the [`Detection`] record and the global ranking shared by both NMS
//! strategies.

pub(crate) mod filter;
pub(crate) mod topk;

pub use filter::{filter_candidates, CandidateSet};
pub use topk::{merge_top, select_top, sort_detections_desc, Detection};
