//! Error types for ndcontrastive.

use thiserror::Error;

/// Errors that can occur in tensor and loss operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    /// Data length does not match the number of elements implied by a shape.
    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Two inputs disagree on one axis.
    #[error("shape mismatch on {axis} of {tensor}: expected {expected}, got {actual}")]
    ShapeMismatch {
        tensor: &'static str,
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Operation requires a tensor of at most the given rank.
    #[error("expected tensor of rank at most {max}, got rank {actual}")]
    RankMismatch { max: usize, actual: usize },

    /// An axis has length zero where at least one element is required.
    #[error("{axis} of {tensor} has length zero")]
    ZeroSizedAxis {
        tensor: &'static str,
        axis: &'static str,
    },

    /// The element count of a shape does not fit in `usize`.
    #[error("element count of shape {shape:?} overflows usize")]
    SizeOverflow { shape: Vec<usize> },

    /// Configuration value outside its valid range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Operation invoked in a state that does not permit it.
    #[error("precondition violated: {message}")]
    PreconditionViolation { message: String },
}
