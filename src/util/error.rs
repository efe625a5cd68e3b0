//! Error types for segnms.

use thiserror::Error;

/// Result alias for segnms operations.
pub type SegNmsResult<T> = std::result::Result<T, SegNmsError>;

/// Errors surfaced by configuration and post-processing calls.
///
/// An empty candidate set is not an error; it yields an empty
/// [`Segmentation`](crate::Segmentation).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SegNmsError {
    /// A configuration value is missing or out of range.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// Input tensors disagree on a dimension.
    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// Output or prototype dimensions are zero.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// No preset is registered under the requested name.
    #[error("unknown preset: {name}")]
    UnknownPreset { name: String },
}
