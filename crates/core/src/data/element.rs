//! Element types a [`TensorArray`] can hold
//!
//! [`ElementType`] is the runtime tag, [`Element`] ties each Rust scalar type
//! to its tag and to the matching [`TensorArray`] variant.

use half::f16;
use ndarray::{ArrayD, ArrayViewD};
use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TensorArray;

/// Runtime tag for the element type of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// IEEE 754 half precision
    Float16,
    /// IEEE 754 single precision
    Float32,
    /// IEEE 754 double precision
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bool,
    /// Pair of `f32` (real, imaginary)
    Complex64,
    /// Pair of `f64` (real, imaginary)
    Complex128,
    /// Arbitrary byte strings
    String,
}

impl ElementType {
    /// Every element type, in declaration order
    pub const ALL: [ElementType; 15] = [
        ElementType::Float16,
        ElementType::Float32,
        ElementType::Float64,
        ElementType::Int8,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
        ElementType::UInt8,
        ElementType::UInt16,
        ElementType::UInt32,
        ElementType::UInt64,
        ElementType::Bool,
        ElementType::Complex64,
        ElementType::Complex128,
        ElementType::String,
    ];

    /// Short lowercase name (matches the serde representation)
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Float16 => "float16",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Int8 => "int8",
            ElementType::Int16 => "int16",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::UInt8 => "uint8",
            ElementType::UInt16 => "uint16",
            ElementType::UInt32 => "uint32",
            ElementType::UInt64 => "uint64",
            ElementType::Bool => "bool",
            ElementType::Complex64 => "complex64",
            ElementType::Complex128 => "complex128",
            ElementType::String => "string",
        }
    }

    /// Size of one element in bytes, `None` for variable-length strings
    pub fn size_in_bytes(self) -> Option<usize> {
        match self {
            ElementType::Int8 | ElementType::UInt8 | ElementType::Bool => Some(1),
            ElementType::Float16 | ElementType::Int16 | ElementType::UInt16 => Some(2),
            ElementType::Float32 | ElementType::Int32 | ElementType::UInt32 => Some(4),
            ElementType::Float64
            | ElementType::Int64
            | ElementType::UInt64
            | ElementType::Complex64 => Some(8),
            ElementType::Complex128 => Some(16),
            ElementType::String => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust scalar type that can be stored in a [`TensorArray`]
///
/// Only types implementing this trait can be turned into tensors, so an
/// unsupported element type is a compile error rather than a runtime one.
pub trait Element: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag for this type
    const ELEMENT_TYPE: ElementType;

    /// Wrap an array of this type in the matching [`TensorArray`] variant
    fn into_tensor(array: ArrayD<Self>) -> TensorArray;

    /// Borrow the array if `tensor` holds this element type
    fn view(tensor: &TensorArray) -> Option<ArrayViewD<'_, Self>>;

    /// Take the array out of `tensor`, handing it back on a type mismatch
    fn take(tensor: TensorArray) -> Result<ArrayD<Self>, TensorArray>;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Element for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn into_tensor(array: ArrayD<Self>) -> TensorArray {
                    TensorArray::$variant(array)
                }

                fn view(tensor: &TensorArray) -> Option<ArrayViewD<'_, Self>> {
                    match tensor {
                        TensorArray::$variant(array) => Some(array.view()),
                        _ => None,
                    }
                }

                fn take(tensor: TensorArray) -> Result<ArrayD<Self>, TensorArray> {
                    match tensor {
                        TensorArray::$variant(array) => Ok(array),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

impl_element! {
    f16 => Float16,
    f32 => Float32,
    f64 => Float64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    bool => Bool,
    Complex32 => Complex64,
    Complex64 => Complex128,
    Vec<u8> => String,
}

/// Run `$body` with `$T` bound to the Rust type behind an [`ElementType`]
///
/// ```
/// use tfserving_core::{with_element_type, ElementType};
///
/// let size = with_element_type!(ElementType::Int16, T => std::mem::size_of::<T>());
/// assert_eq!(size, 2);
/// ```
#[macro_export]
macro_rules! with_element_type {
    ($element_type:expr, $T:ident => $body:expr) => {
        match $element_type {
            $crate::ElementType::Float16 => {
                type $T = $crate::half::f16;
                $body
            }
            $crate::ElementType::Float32 => {
                type $T = f32;
                $body
            }
            $crate::ElementType::Float64 => {
                type $T = f64;
                $body
            }
            $crate::ElementType::Int8 => {
                type $T = i8;
                $body
            }
            $crate::ElementType::Int16 => {
                type $T = i16;
                $body
            }
            $crate::ElementType::Int32 => {
                type $T = i32;
                $body
            }
            $crate::ElementType::Int64 => {
                type $T = i64;
                $body
            }
            $crate::ElementType::UInt8 => {
                type $T = u8;
                $body
            }
            $crate::ElementType::UInt16 => {
                type $T = u16;
                $body
            }
            $crate::ElementType::UInt32 => {
                type $T = u32;
                $body
            }
            $crate::ElementType::UInt64 => {
                type $T = u64;
                $body
            }
            $crate::ElementType::Bool => {
                type $T = bool;
                $body
            }
            $crate::ElementType::Complex64 => {
                type $T = $crate::num_complex::Complex32;
                $body
            }
            $crate::ElementType::Complex128 => {
                type $T = $crate::num_complex::Complex64;
                $body
            }
            $crate::ElementType::String => {
                type $T = ::std::vec::Vec<u8>;
                $body
            }
        }
    };
}
