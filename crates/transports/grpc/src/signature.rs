//! SignatureDef assembly
//!
//! Signatures describe the input/output contract of a served model. They are
//! assembled from their pieces as-is; nothing here checks that tensors
//! actually match them.

use std::collections::HashMap;

use tfserving_core::ElementType;

use crate::dtype::data_type_of;
use crate::generated::tensorflow::{tensor_shape_proto, SignatureDef, TensorInfo, TensorShapeProto};

/// Method name of the TensorFlow Serving predict API
pub const PREDICT_METHOD_NAME: &str = "tensorflow/serving/predict";

/// Build a `SignatureDef` from optional input/output maps and method name
///
/// Entries are cloned; the source maps are left untouched.
pub fn build_signature_def(
    inputs: Option<&HashMap<String, TensorInfo>>,
    outputs: Option<&HashMap<String, TensorInfo>>,
    method_name: Option<&str>,
) -> SignatureDef {
    let mut signature_def = SignatureDef::default();

    if let Some(inputs) = inputs {
        for (name, info) in inputs {
            signature_def.inputs.insert(name.clone(), info.clone());
        }
    }
    if let Some(outputs) = outputs {
        for (name, info) in outputs {
            signature_def.outputs.insert(name.clone(), info.clone());
        }
    }
    if let Some(method_name) = method_name {
        signature_def.method_name = method_name.to_string();
    }

    signature_def
}

/// Describe a tensor for a signature; use `-1` for unknown dimensions
pub fn tensor_info(name: &str, element_type: ElementType, shape: &[i64]) -> TensorInfo {
    TensorInfo {
        name: name.to_string(),
        dtype: data_type_of(element_type) as i32,
        tensor_shape: Some(TensorShapeProto {
            dim: shape
                .iter()
                .map(|&size| tensor_shape_proto::Dim {
                    size,
                    name: String::new(),
                })
                .collect(),
            unknown_rank: false,
        }),
    }
}
