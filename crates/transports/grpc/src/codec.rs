//! Conversion between native tensors and `TensorProto` messages
//!
//! Encoding always produces packed `tensor_content` (strings excepted, see
//! [`make_tensor_proto`]). Decoding accepts both packed content and the
//! typed repeated-value fields, including the single-value "splat" form
//! where one value stands for every element of the shape.

use std::mem::size_of;

use tfserving_core::half::f16;
use tfserving_core::ndarray::{ArrayD, IxDyn};
use tfserving_core::num_complex::{Complex, Complex32, Complex64};
use tfserving_core::{Element, ElementType, TensorArray};

use crate::dtype::{data_type_name, data_type_of, element_type_of};
use crate::generated::tensorflow::{tensor_shape_proto, DataType, TensorProto, TensorShapeProto};
use crate::{Error, Result};

/// Convert a native array into a `TensorProto`
///
/// `f64` arrays are downcast to `f32` first, so `DT_DOUBLE` is never
/// emitted. Elements are written as packed bytes in native byte order,
/// row-major, one byte per `bool`. String tensors have no fixed-width
/// layout and are written to `string_val` instead.
pub fn make_tensor_proto(values: impl Into<TensorArray>) -> TensorProto {
    let array = values.into();

    let element_type = match array.element_type() {
        ElementType::Float64 => ElementType::Float32,
        other => other,
    };

    let mut tensor = TensorProto {
        dtype: data_type_of(element_type) as i32,
        tensor_shape: Some(shape_proto(array.shape())),
        ..Default::default()
    };

    match &array {
        TensorArray::Float16(a) => tensor.tensor_content = pack(a),
        TensorArray::Float32(a) => tensor.tensor_content = pack(a),
        TensorArray::Float64(a) => tensor.tensor_content = pack(&a.mapv(|v| v as f32)),
        TensorArray::Int8(a) => tensor.tensor_content = pack(a),
        TensorArray::Int16(a) => tensor.tensor_content = pack(a),
        TensorArray::Int32(a) => tensor.tensor_content = pack(a),
        TensorArray::Int64(a) => tensor.tensor_content = pack(a),
        TensorArray::UInt8(a) => tensor.tensor_content = pack(a),
        TensorArray::UInt16(a) => tensor.tensor_content = pack(a),
        TensorArray::UInt32(a) => tensor.tensor_content = pack(a),
        TensorArray::UInt64(a) => tensor.tensor_content = pack(a),
        TensorArray::Complex64(a) => tensor.tensor_content = pack(a),
        TensorArray::Complex128(a) => tensor.tensor_content = pack(a),
        TensorArray::Bool(a) => tensor.tensor_content = a.iter().map(|&b| b as u8).collect(),
        TensorArray::String(a) => tensor.string_val = a.iter().cloned().collect(),
    }

    tensor
}

/// Convert a `TensorProto` into a freshly allocated native array
///
/// Non-empty `tensor_content` wins over any typed field. Otherwise the
/// dtype selects a decoder for its repeated-value field; a field holding
/// exactly one value (one real/imaginary pair for complex types) is
/// broadcast to the full shape.
pub fn make_ndarray(tensor: &TensorProto) -> Result<TensorArray> {
    let data_type = DataType::try_from(tensor.dtype)
        .map_err(|_| Error::UnsupportedType(data_type_name(tensor.dtype)))?;
    let shape = tensor_shape(tensor)?;

    if !tensor.tensor_content.is_empty() {
        let element_type = element_type_of(data_type)
            .ok_or_else(|| Error::UnsupportedType(data_type.as_str_name().to_string()))?;
        return decode_packed(element_type, &tensor.tensor_content, &shape);
    }

    let decoder = repeated_decoder(data_type)
        .ok_or_else(|| Error::UnsupportedType(data_type.as_str_name().to_string()))?;
    decoder(tensor, &shape)
}

fn shape_proto(shape: &[usize]) -> TensorShapeProto {
    TensorShapeProto {
        dim: shape
            .iter()
            .map(|&size| tensor_shape_proto::Dim {
                size: size as i64,
                name: String::new(),
            })
            .collect(),
        unknown_rank: false,
    }
}

/// Largest element count that fits in memory at 16 bytes per element
const MAX_ELEMENTS: usize = isize::MAX as usize / 16;

/// Dimensions of `tensor`, empty for scalars
fn tensor_shape(tensor: &TensorProto) -> Result<Vec<usize>> {
    let Some(shape) = &tensor.tensor_shape else {
        return Ok(Vec::new());
    };

    if shape.unknown_rank {
        return Err(Error::InvalidShape("unknown rank".to_string()));
    }

    let dims = shape
        .dim
        .iter()
        .map(|dim| {
            usize::try_from(dim.size)
                .map_err(|_| Error::InvalidShape(format!("dimension of size {}", dim.size)))
        })
        .collect::<Result<Vec<usize>>>()?;

    match dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)) {
        Some(count) if count <= MAX_ELEMENTS => Ok(dims),
        _ => Err(Error::InvalidShape(format!(
            "{:?} exceeds the maximum element count",
            dims
        ))),
    }
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

fn pack<T: bytemuck::Pod>(array: &ArrayD<T>) -> Vec<u8> {
    let mut content = Vec::with_capacity(array.len() * size_of::<T>());
    for value in array.iter() {
        content.extend_from_slice(bytemuck::bytes_of(value));
    }
    content
}

fn decode_packed(element_type: ElementType, content: &[u8], shape: &[usize]) -> Result<TensorArray> {
    match element_type {
        ElementType::Float16 => unpack::<f16>(content, shape),
        ElementType::Float32 => unpack::<f32>(content, shape),
        ElementType::Float64 => unpack::<f64>(content, shape),
        ElementType::Int8 => unpack::<i8>(content, shape),
        ElementType::Int16 => unpack::<i16>(content, shape),
        ElementType::Int32 => unpack::<i32>(content, shape),
        ElementType::Int64 => unpack::<i64>(content, shape),
        ElementType::UInt8 => unpack::<u8>(content, shape),
        ElementType::UInt16 => unpack::<u16>(content, shape),
        ElementType::UInt32 => unpack::<u32>(content, shape),
        ElementType::UInt64 => unpack::<u64>(content, shape),
        ElementType::Complex64 => unpack::<Complex32>(content, shape),
        ElementType::Complex128 => unpack::<Complex64>(content, shape),
        ElementType::Bool => {
            check_packed_len(element_type, content, shape, 1)?;
            reshape(content.iter().map(|&b| b != 0).collect(), shape)
        }
        ElementType::String => {
            let values = unpack_strings(content, element_count(shape))?;
            reshape(values, shape)
        }
    }
}

fn check_packed_len(
    element_type: ElementType,
    content: &[u8],
    shape: &[usize],
    element_size: usize,
) -> Result<()> {
    let expected = element_count(shape).checked_mul(element_size);
    if expected != Some(content.len()) {
        return Err(Error::InvalidContent(format!(
            "{} bytes of packed {} content for shape {:?}, expected {}",
            content.len(),
            element_type,
            shape,
            element_count(shape).saturating_mul(element_size)
        )));
    }
    Ok(())
}

/// Copy packed bytes into an owned, correctly aligned buffer
fn unpack<T: Element + bytemuck::Pod>(content: &[u8], shape: &[usize]) -> Result<TensorArray> {
    check_packed_len(T::ELEMENT_TYPE, content, shape, size_of::<T>())?;
    let values = content
        .chunks_exact(size_of::<T>())
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect();
    reshape(values, shape)
}

/// Packed strings: one varint length per element, then all bytes back to back
fn unpack_strings(content: &[u8], count: usize) -> Result<Vec<Vec<u8>>> {
    // Every element needs at least its one-byte length prefix
    if count > content.len() {
        return Err(Error::InvalidContent(format!(
            "{} bytes cannot hold {} packed strings",
            content.len(),
            count
        )));
    }

    let mut buf = content;
    let mut lengths = Vec::with_capacity(count);
    for _ in 0..count {
        let len = prost::encoding::decode_varint(&mut buf)
            .map_err(|e| Error::InvalidContent(format!("string length: {}", e)))?;
        lengths.push(len as usize);
    }

    let mut values = Vec::with_capacity(count);
    for len in lengths {
        if buf.len() < len {
            return Err(Error::InvalidContent(format!(
                "string of {} bytes overruns packed content",
                len
            )));
        }
        let (value, rest) = buf.split_at(len);
        values.push(value.to_vec());
        buf = rest;
    }

    if !buf.is_empty() {
        return Err(Error::InvalidContent(format!(
            "{} trailing bytes after packed strings",
            buf.len()
        )));
    }
    Ok(values)
}

fn reshape<T: Element>(values: Vec<T>, shape: &[usize]) -> Result<TensorArray> {
    Ok(TensorArray::from_shape_vec(shape, values)?)
}

/// Build an array from a repeated-value list, broadcasting a single value
fn expand<T: Element>(values: Vec<T>, shape: &[usize]) -> Result<TensorArray> {
    let count = element_count(shape);
    match values.len() {
        n if n == count => reshape(values, shape),
        1 => {
            let array = ArrayD::from_elem(IxDyn(shape), values[0].clone());
            Ok(T::into_tensor(array))
        }
        n => Err(Error::ContentSizeMismatch {
            dtype: data_type_of(T::ELEMENT_TYPE).as_str_name().to_string(),
            expected: count,
            actual: n,
        }),
    }
}

/// Group interleaved real/imaginary scalars into complex values
fn pair_up<T: Copy>(parts: &[T]) -> Result<Vec<Complex<T>>> {
    if parts.len() % 2 != 0 {
        return Err(Error::InvalidContent(format!(
            "{} complex components do not form real/imaginary pairs",
            parts.len()
        )));
    }
    Ok(parts
        .chunks_exact(2)
        .map(|pair| Complex::new(pair[0], pair[1]))
        .collect())
}

type RepeatedDecoder = fn(&TensorProto, &[usize]) -> Result<TensorArray>;

/// Decoders for the typed repeated-value fields, keyed by dtype
static REPEATED_DECODERS: &[(DataType, RepeatedDecoder)] = &[
    (DataType::DtHalf, decode_half),
    (DataType::DtFloat, decode_float),
    (DataType::DtDouble, decode_double),
    (DataType::DtInt8, decode_int8),
    (DataType::DtInt16, decode_int16),
    (DataType::DtInt32, decode_int32),
    (DataType::DtInt64, decode_int64),
    (DataType::DtUint8, decode_uint8),
    (DataType::DtUint16, decode_uint16),
    (DataType::DtUint32, decode_uint32),
    (DataType::DtUint64, decode_uint64),
    (DataType::DtBool, decode_bool),
    (DataType::DtComplex64, decode_complex64),
    (DataType::DtComplex128, decode_complex128),
    (DataType::DtString, decode_string),
];

fn repeated_decoder(data_type: DataType) -> Option<RepeatedDecoder> {
    REPEATED_DECODERS
        .iter()
        .find(|(dtype, _)| *dtype == data_type)
        .map(|(_, decoder)| *decoder)
}

fn decode_half(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    // Each int32 carries the raw bits of one float16
    let values = tensor
        .half_val
        .iter()
        .map(|&bits| f16::from_bits(bits as u16))
        .collect();
    expand::<f16>(values, shape)
}

fn decode_float(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.float_val.clone(), shape)
}

fn decode_double(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.double_val.clone(), shape)
}

// The narrow integer types share the int32 field
fn decode_int8(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.int_val.iter().map(|&v| v as i8).collect::<Vec<_>>(), shape)
}

fn decode_int16(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.int_val.iter().map(|&v| v as i16).collect::<Vec<_>>(), shape)
}

fn decode_int32(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.int_val.clone(), shape)
}

fn decode_uint8(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.int_val.iter().map(|&v| v as u8).collect::<Vec<_>>(), shape)
}

fn decode_uint16(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.int_val.iter().map(|&v| v as u16).collect::<Vec<_>>(), shape)
}

fn decode_int64(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.int64_val.clone(), shape)
}

fn decode_uint32(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.uint32_val.clone(), shape)
}

fn decode_uint64(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.uint64_val.clone(), shape)
}

fn decode_bool(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.bool_val.clone(), shape)
}

fn decode_complex64(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(pair_up(&tensor.scomplex_val)?, shape)
}

fn decode_complex128(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(pair_up(&tensor.dcomplex_val)?, shape)
}

fn decode_string(tensor: &TensorProto, shape: &[usize]) -> Result<TensorArray> {
    expand(tensor.string_val.clone(), shape)
}
