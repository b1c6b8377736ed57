//! Dense row-major feature tensors
//!
//! The leading axis indexes nodes or edges; every trailing axis is part of the
//! feature block processed independently per scalar.

use crate::error::{Error, Result};
use bytemuck::Pod;

/// Contiguous row-major tensor with an explicit shape
#[derive(Clone, Debug, PartialEq)]
pub struct DenseTensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Pod> DenseTensor<T> {
    /// Wrap `data` with the given shape
    ///
    /// # Errors
    /// - `InvalidParameter` if the shape is empty
    /// - `ShapeMismatch` if the element count differs from the shape product
    pub fn from_vec(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::InvalidParameter(
                "tensor shape needs at least a leading axis".to_string(),
            ));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::size_mismatch(expected, data.len(), "tensor element count"));
        }
        Ok(Self { shape, data })
    }

    /// Tensor filled with `value`
    pub fn full(shape: &[usize], value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; len],
        }
    }

    /// Zero-initialised tensor (all-zero bit pattern)
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zeroed())
    }

    /// Empty placeholder used for an operand the combine operator never reads
    pub fn empty() -> Self {
        Self {
            shape: vec![0],
            data: Vec::new(),
        }
    }

    /// Full shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Size of the leading axis
    pub fn num_rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Trailing axes
    pub fn feature_shape(&self) -> &[usize] {
        self.shape.get(1..).unwrap_or(&[])
    }

    /// Product of the trailing axes (1 for a rank-1 tensor)
    pub fn feature_dim(&self) -> usize {
        self.feature_shape().iter().product()
    }

    /// Total number of scalars
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Feature block of row `row`
    pub fn row(&self, row: usize) -> &[T] {
        let dim = self.feature_dim();
        &self.data[row * dim..(row + 1) * dim]
    }

    /// Apply `f` to every scalar, keeping the shape
    pub fn map<U: Pod, F: Fn(T) -> U>(&self, f: F) -> DenseTensor<U> {
        DenseTensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}
