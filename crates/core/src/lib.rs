//! Native tensor arrays for the TensorFlow Serving client
//!
//! `tfserving-core` knows nothing about the wire format. It provides the
//! dtype-tagged [`TensorArray`] that the gRPC transport encodes into
//! `TensorProto` messages, plus batching helpers.
//!
//! ```
//! use tfserving_core::{ElementType, TensorArray};
//!
//! let sample = TensorArray::from(vec![0.5f32, 1.5, 2.5]);
//! let batch = TensorArray::stack(&[sample.clone(), sample]).unwrap();
//! assert_eq!(batch.shape(), &[2, 3]);
//! assert_eq!(batch.element_type(), ElementType::Float32);
//! ```

pub mod data;
pub mod error;

pub use data::{Element, ElementType, TensorArray};
pub use error::{Error, Result};

// Re-exported so downstream crates name the exact element types we store
pub use half;
pub use ndarray;
pub use num_complex;
