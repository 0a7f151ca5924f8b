//! gRPC transport for TensorFlow Serving
//!
//! This crate converts between [`tfserving_core::TensorArray`] and the
//! `tensorflow.TensorProto` wire message, and calls the
//! `tensorflow.serving.PredictionService/Predict` RPC.
//!
//! # Features
//!
//! - **Codec**: [`make_tensor_proto`] / [`make_ndarray`] for all 15 mapped dtypes,
//!   packed `tensor_content` and typed repeated fields (including splats)
//! - **Client**: [`InferenceClient`] over TCP or Unix domain sockets, one call per
//!   prediction, bounded by a timeout
//! - **Blocking client**: [`BlockingInferenceClient`] for callers without a runtime
//! - **Signatures**: [`build_signature_def`] for model signature metadata
//! - **Observability**: `tracing` logs and optional Prometheus [`ClientMetrics`]
//!
//! # Example
//!
//! ```
//! use tfserving_grpc::{make_ndarray, make_tensor_proto};
//! use tfserving_core::TensorArray;
//!
//! let tensor = make_tensor_proto(vec![1i32, 2, 3]);
//! assert_eq!(tensor.tensor_content.len(), 12);
//!
//! let array = make_ndarray(&tensor).unwrap();
//! assert_eq!(array, TensorArray::from(vec![1i32, 2, 3]));
//! ```

#![warn(clippy::all)]

pub mod blocking;
pub mod client;
pub mod codec;
pub mod config;
pub mod dtype;
pub mod error;
pub mod metrics;
pub mod signature;
pub mod stub;

// Generated protobuf code
pub mod generated {
    // DataType, TensorProto, TensorShapeProto, TensorInfo, SignatureDef
    pub mod tensorflow {
        tonic::include_proto!("tensorflow");

        // ModelSpec, PredictRequest/Response, PredictionService client (and
        // server traits with the `server` feature)
        pub mod serving {
            tonic::include_proto!("tensorflow.serving");
        }
    }
}

pub use blocking::BlockingInferenceClient;
pub use client::{InferenceClient, Outputs, RPC_TIMEOUT};
pub use codec::{make_ndarray, make_tensor_proto};
pub use config::{ClientConfig, ConfigError};
pub use dtype::{data_type_of, element_type_of, TYPE_MAPPING};
pub use error::{Error, Result};
pub use generated::tensorflow::{DataType, SignatureDef, TensorInfo, TensorProto};
pub use generated::tensorflow::serving::{ModelSpec, PredictRequest, PredictResponse};
pub use metrics::ClientMetrics;
pub use signature::{build_signature_def, tensor_info, PREDICT_METHOD_NAME};
pub use stub::{GrpcPredictionStub, PredictionStub};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
