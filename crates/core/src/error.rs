//! Error types for the tensor core

use thiserror::Error;

use crate::data::ElementType;

/// Result type alias for tensor core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or batching native tensors
#[derive(Debug, Error)]
pub enum Error {
    /// Samples in a batch disagree on element type
    #[error("Element type mismatch: expected {expected}, got {actual}")]
    ElementTypeMismatch {
        /// Element type of the first sample
        expected: ElementType,
        /// Element type of the offending sample
        actual: ElementType,
    },

    /// Samples in a batch disagree on shape, or data does not fit a shape
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A batch must contain at least one sample
    #[error("Cannot stack an empty batch")]
    EmptyBatch,
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::ShapeMismatch(err.to_string())
    }
}
