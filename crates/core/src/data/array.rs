//! Dtype-tagged n-dimensional arrays

use half::f16;
use ndarray::{Array, Array1, ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use num_complex::{Complex32, Complex64};

use super::element::{Element, ElementType};
use crate::error::{Error, Result};

/// An owned n-dimensional array of any supported element type
///
/// Arrays are always stored with a dynamic dimension so tensors of any rank
/// share one representation. A 0-dimensional array is a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorArray {
    Float16(ArrayD<f16>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    UInt64(ArrayD<u64>),
    Bool(ArrayD<bool>),
    Complex64(ArrayD<Complex32>),
    Complex128(ArrayD<Complex64>),
    String(ArrayD<Vec<u8>>),
}

macro_rules! each_variant {
    ($value:expr, $array:ident => $body:expr) => {
        match $value {
            TensorArray::Float16($array) => $body,
            TensorArray::Float32($array) => $body,
            TensorArray::Float64($array) => $body,
            TensorArray::Int8($array) => $body,
            TensorArray::Int16($array) => $body,
            TensorArray::Int32($array) => $body,
            TensorArray::Int64($array) => $body,
            TensorArray::UInt8($array) => $body,
            TensorArray::UInt16($array) => $body,
            TensorArray::UInt32($array) => $body,
            TensorArray::UInt64($array) => $body,
            TensorArray::Bool($array) => $body,
            TensorArray::Complex64($array) => $body,
            TensorArray::Complex128($array) => $body,
            TensorArray::String($array) => $body,
        }
    };
}

impl TensorArray {
    /// Build a 0-dimensional tensor holding `value`
    pub fn scalar<T: Element>(value: T) -> Self {
        T::into_tensor(ndarray::arr0(value).into_dyn())
    }

    /// Build a tensor from row-major `data` and an explicit shape
    pub fn from_shape_vec<T: Element>(shape: &[usize], data: Vec<T>) -> Result<Self> {
        let array = ArrayD::from_shape_vec(IxDyn(shape), data)?;
        Ok(T::into_tensor(array))
    }

    /// Build a 1-dimensional string tensor
    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let values: Vec<Vec<u8>> = values.into_iter().map(|v| v.as_ref().to_vec()).collect();
        values.into()
    }

    /// Element type tag of this tensor
    pub fn element_type(&self) -> ElementType {
        match self {
            TensorArray::Float16(_) => ElementType::Float16,
            TensorArray::Float32(_) => ElementType::Float32,
            TensorArray::Float64(_) => ElementType::Float64,
            TensorArray::Int8(_) => ElementType::Int8,
            TensorArray::Int16(_) => ElementType::Int16,
            TensorArray::Int32(_) => ElementType::Int32,
            TensorArray::Int64(_) => ElementType::Int64,
            TensorArray::UInt8(_) => ElementType::UInt8,
            TensorArray::UInt16(_) => ElementType::UInt16,
            TensorArray::UInt32(_) => ElementType::UInt32,
            TensorArray::UInt64(_) => ElementType::UInt64,
            TensorArray::Bool(_) => ElementType::Bool,
            TensorArray::Complex64(_) => ElementType::Complex64,
            TensorArray::Complex128(_) => ElementType::Complex128,
            TensorArray::String(_) => ElementType::String,
        }
    }

    /// Per-axis extents
    pub fn shape(&self) -> &[usize] {
        each_variant!(self, array => array.shape())
    }

    /// Number of axes (0 for scalars)
    pub fn ndim(&self) -> usize {
        each_variant!(self, array => array.ndim())
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        each_variant!(self, array => array.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the underlying array if it holds `T`
    pub fn view<T: Element>(&self) -> Option<ArrayViewD<'_, T>> {
        T::view(self)
    }

    /// Take the underlying array if it holds `T`, otherwise return `self`
    pub fn try_into_array<T: Element>(self) -> std::result::Result<ArrayD<T>, Self> {
        T::take(self)
    }

    /// Stack samples along a new leading axis
    ///
    /// Every sample must share the element type and shape of the first one;
    /// the result has shape `[samples.len(), ..sample_shape]`.
    pub fn stack(samples: &[TensorArray]) -> Result<TensorArray> {
        let first = samples.first().ok_or(Error::EmptyBatch)?;
        crate::with_element_type!(first.element_type(), T => stack_typed::<T>(samples))
    }
}

fn stack_typed<T: Element>(samples: &[TensorArray]) -> Result<TensorArray> {
    let views = samples
        .iter()
        .map(|sample| {
            T::view(sample).ok_or(Error::ElementTypeMismatch {
                expected: T::ELEMENT_TYPE,
                actual: sample.element_type(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let expected = views[0].shape();
    if let Some((index, view)) = views
        .iter()
        .enumerate()
        .find(|(_, view)| view.shape() != expected)
    {
        return Err(Error::ShapeMismatch(format!(
            "sample {} has shape {:?}, expected {:?}",
            index,
            view.shape(),
            expected
        )));
    }

    let stacked = ndarray::stack(Axis(0), &views)?;
    Ok(T::into_tensor(stacked))
}

impl<T: Element, D: Dimension> From<Array<T, D>> for TensorArray {
    fn from(array: Array<T, D>) -> Self {
        T::into_tensor(array.into_dyn())
    }
}

impl<T: Element> From<Vec<T>> for TensorArray {
    fn from(values: Vec<T>) -> Self {
        T::into_tensor(Array1::from_vec(values).into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, array};

    #[test]
    fn test_scalar_has_empty_shape() {
        let tensor = TensorArray::scalar(7i64);
        assert_eq!(tensor.shape(), &[] as &[usize]);
        assert_eq!(tensor.ndim(), 0);
        assert_eq!(tensor.len(), 1);
        assert_eq!(tensor.element_type(), ElementType::Int64);
    }

    #[test]
    fn test_from_vec_is_one_dimensional() {
        let tensor = TensorArray::from(vec![1.0f32, 2.0, 3.0]);
        assert_eq!(tensor.shape(), &[3]);
        assert_eq!(tensor.element_type(), ElementType::Float32);
    }

    #[test]
    fn test_from_shape_vec_rejects_bad_length() {
        let result = TensorArray::from_shape_vec(&[2, 2], vec![1u8, 2, 3]);
        assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_view_and_take() {
        let tensor = TensorArray::from(arr2(&[[1i32, 2], [3, 4]]));
        assert!(tensor.view::<f32>().is_none());
        assert_eq!(tensor.view::<i32>().unwrap()[[1, 0]], 3);

        let tensor = match tensor.try_into_array::<u8>() {
            Ok(_) => panic!("Expected a type mismatch"),
            Err(tensor) => tensor,
        };
        let array = tensor.try_into_array::<i32>().unwrap();
        assert_eq!(array.shape(), &[2, 2]);
    }

    #[test]
    fn test_from_strings() {
        let tensor = TensorArray::from_strings(["cat", "dog"]);
        assert_eq!(tensor.element_type(), ElementType::String);
        let view = tensor.view::<Vec<u8>>().unwrap();
        assert_eq!(view[[1]], b"dog".to_vec());
    }

    #[test]
    fn test_stack_adds_leading_axis() {
        let samples = vec![
            TensorArray::from(arr2(&[[1.0f32, 2.0], [3.0, 4.0]])),
            TensorArray::from(arr2(&[[5.0f32, 6.0], [7.0, 8.0]])),
            TensorArray::from(arr2(&[[9.0f32, 10.0], [11.0, 12.0]])),
        ];

        let batch = TensorArray::stack(&samples).unwrap();
        assert_eq!(batch.shape(), &[3, 2, 2]);

        let view = batch.view::<f32>().unwrap();
        assert_eq!(view[[0, 0, 1]], 2.0);
        assert_eq!(view[[2, 1, 1]], 12.0);
    }

    #[test]
    fn test_stack_single_sample() {
        let batch = TensorArray::stack(&[TensorArray::from(arr1(&[1u16, 2, 3]))]).unwrap();
        assert_eq!(batch.shape(), &[1, 3]);
    }

    #[test]
    fn test_stack_scalars() {
        let samples = vec![TensorArray::scalar(true), TensorArray::scalar(false)];
        let batch = TensorArray::stack(&samples).unwrap();
        assert_eq!(batch, TensorArray::from(array![true, false]));
    }

    #[test]
    fn test_stack_strings() {
        let samples = vec![
            TensorArray::from_strings(["a", "b"]),
            TensorArray::from_strings(["c", "d"]),
        ];
        let batch = TensorArray::stack(&samples).unwrap();
        assert_eq!(batch.shape(), &[2, 2]);
    }

    #[test]
    fn test_stack_empty_batch() {
        assert!(matches!(TensorArray::stack(&[]), Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_stack_type_mismatch() {
        let samples = vec![
            TensorArray::from(vec![1.0f32]),
            TensorArray::from(vec![1.0f64]),
        ];
        match TensorArray::stack(&samples) {
            Err(Error::ElementTypeMismatch { expected, actual }) => {
                assert_eq!(expected, ElementType::Float32);
                assert_eq!(actual, ElementType::Float64);
            }
            other => panic!("Expected ElementTypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_stack_shape_mismatch() {
        let samples = vec![
            TensorArray::from(vec![1i8, 2]),
            TensorArray::from(vec![1i8, 2, 3]),
        ];
        assert!(matches!(
            TensorArray::stack(&samples),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
