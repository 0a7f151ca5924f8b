//! Error types for the TensorFlow Serving transport

use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while encoding, decoding or calling the service
#[derive(Debug, Error)]
pub enum Error {
    /// dtype (or element type) with no entry in the type mapping and no
    /// content to fall back on
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Tensor shape cannot describe an in-memory array
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Repeated-value list is neither a splat nor one value per element
    #[error("Content size mismatch for {dtype}: expected {expected} values, got {actual}")]
    ContentSizeMismatch {
        /// Wire dtype name
        dtype: String,
        /// Element count implied by the shape
        expected: usize,
        /// Number of values present
        actual: usize,
    },

    /// Malformed packed or repeated content
    #[error("Invalid tensor content: {0}")]
    InvalidContent(String),

    /// Native tensor error (batching, reshaping)
    #[error("Tensor error: {0}")]
    Core(#[from] tfserving_core::Error),

    /// The remote service answered with a non-OK status
    #[error("RPC failed: {0}")]
    Rpc(Box<tonic::Status>),

    /// Remote call did not finish in time
    #[error("Remote timeout after {timeout_ms}ms: {context}")]
    RemoteTimeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
        /// Additional context
        context: String,
    },

    /// A requested output is absent from the response
    #[error("Output not found in response: {0}")]
    OutputNotFound(String),

    /// Invalid client settings (host, socket path, endpoint)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Error::Rpc(Box::new(status))
    }
}
