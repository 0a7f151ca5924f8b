//! Mapping between native element types and wire `DataType` codes
//!
//! A single table drives both directions so encode and decode can never
//! disagree about a type.

use tfserving_core::ElementType;

use crate::generated::tensorflow::DataType;

/// Every supported element type paired with its wire dtype
pub const TYPE_MAPPING: [(ElementType, DataType); 15] = [
    (ElementType::Float16, DataType::DtHalf),
    (ElementType::Float32, DataType::DtFloat),
    (ElementType::Float64, DataType::DtDouble),
    (ElementType::Int8, DataType::DtInt8),
    (ElementType::Int16, DataType::DtInt16),
    (ElementType::Int32, DataType::DtInt32),
    (ElementType::Int64, DataType::DtInt64),
    (ElementType::UInt8, DataType::DtUint8),
    (ElementType::UInt16, DataType::DtUint16),
    (ElementType::UInt32, DataType::DtUint32),
    (ElementType::UInt64, DataType::DtUint64),
    (ElementType::Bool, DataType::DtBool),
    (ElementType::Complex64, DataType::DtComplex64),
    (ElementType::Complex128, DataType::DtComplex128),
    (ElementType::String, DataType::DtString),
];

/// Wire dtype for a native element type
pub fn data_type_of(element_type: ElementType) -> DataType {
    TYPE_MAPPING
        .iter()
        .find(|(native, _)| *native == element_type)
        .map(|(_, wire)| *wire)
        .unwrap_or(DataType::DtInvalid)
}

/// Native element type for a wire dtype, `None` when unmapped
pub fn element_type_of(data_type: DataType) -> Option<ElementType> {
    TYPE_MAPPING
        .iter()
        .find(|(_, wire)| *wire == data_type)
        .map(|(native, _)| *native)
}

/// Printable name for a raw dtype code, including unknown ones
pub fn data_type_name(code: i32) -> String {
    match DataType::try_from(code) {
        Ok(data_type) => data_type.as_str_name().to_string(),
        Err(_) => format!("unknown dtype {}", code),
    }
}
