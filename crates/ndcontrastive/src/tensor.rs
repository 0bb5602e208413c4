//! Dense n-dimensional tensor.
//!
//! ```text
//! Tensor<ElT>
//! ├── Dense<ElT>   flat row-major storage
//! ├── shape        logical axis lengths
//! └── strides      row-major strides derived from shape
//! ```
//!
//! Loss inputs are rank-4 `(N, C, H, W)` tensors or lower-rank tensors read
//! through [`Shape4::from_dims`](crate::shape::Shape4::from_dims).

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::storage::Dense;
use crate::strides::{cartesian_to_linear, compute_strides};

/// A dense n-dimensional tensor in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<ElT: Scalar> {
    storage: Dense<ElT>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

/// Product of the axis lengths, or `None` if it overflows `usize`.
pub(crate) fn checked_element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

fn element_count(shape: &[usize]) -> Result<usize, TensorError> {
    checked_element_count(shape).ok_or_else(|| TensorError::SizeOverflow {
        shape: shape.to_vec(),
    })
}

impl<ElT: Scalar> Tensor<ElT> {
    /// Create a new tensor with the given shape, zero-initialized.
    ///
    /// The empty shape `[]` is a scalar holding one element.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndcontrastive::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    ///
    /// let s: Tensor<f64> = Tensor::zeros(&[]);
    /// assert_eq!(s.len(), 1);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, ElT::zero())
    }

    /// Create a tensor with every element equal to one.
    pub fn ones(shape: &[usize]) -> Self {
        Self::filled(shape, ElT::one())
    }

    /// Create a tensor with every element equal to `value`.
    ///
    /// # Panics
    ///
    /// Panics if the element count overflows `usize`.
    pub fn filled(shape: &[usize], value: ElT) -> Self {
        let len: usize = shape.iter().product();
        Self {
            storage: Dense::filled(len, value),
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create tensor from row-major data and shape.
    ///
    /// # Errors
    ///
    /// - `LengthMismatch` if data length doesn't match shape.
    /// - `SizeOverflow` if the element count of `shape` overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndcontrastive::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[0, 1]), Some(&2.0));
    /// assert_eq!(t.get(&[1, 0]), Some(&4.0));
    /// ```
    pub fn from_vec(data: Vec<ElT>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = element_count(shape)?;
        if data.len() != expected {
            return Err(TensorError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            storage: Dense::from_vec(data),
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Create tensor from a slice, copying the data.
    pub fn from_slice(data: &[ElT], shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Change the shape in place, reusing the allocation.
    ///
    /// Element values are unspecified afterwards except that the buffer is
    /// exactly large enough for the new shape. On error the tensor is
    /// unchanged.
    pub fn reshape(&mut self, shape: &[usize]) -> Result<(), TensorError> {
        if self.shape == shape {
            return Ok(());
        }
        self.storage.resize(element_count(shape)?);
        self.shape = shape.to_vec();
        self.strides = compute_strides(shape);
        Ok(())
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if tensor is empty (has zero elements).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get underlying data as slice.
    #[inline]
    pub fn data(&self) -> &[ElT] {
        self.storage.as_slice()
    }

    /// Get underlying data as mutable slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [ElT] {
        self.storage.as_mut_slice()
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: ElT) {
        self.data_mut().fill(value);
    }

    /// Get element by linear index.
    #[inline]
    pub fn get_linear(&self, i: usize) -> Option<&ElT> {
        self.storage.as_slice().get(i)
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if indices are out of bounds or wrong number of indices.
    pub fn get(&self, indices: &[usize]) -> Option<&ElT> {
        let in_bounds = indices.len() == self.ndim()
            && indices.iter().zip(&self.shape).all(|(&idx, &dim)| idx < dim);
        if !in_bounds {
            return None;
        }
        self.get_linear(cartesian_to_linear(indices, &self.strides))
    }
}
