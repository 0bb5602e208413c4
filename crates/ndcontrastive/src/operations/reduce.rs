//! Channel-axis reduction via faer's matrix multiplication.
//!
//! A row-major `(C, dim)` block is the same memory as a column-major
//! `(dim, C)` matrix, so summing over channels is the matrix-vector product
//! of that view with a length-`C` weight vector.

use faer::linalg::matmul::matmul;
use faer::{Accum, MatMut, MatRef, Par};

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::shape::Shape4;

/// `y = Aᵀ x` for a row-major `rows x cols` matrix `A`.
///
/// `x` has length `rows` and `y` has length `cols`. The product runs
/// sequentially, so the summation order is fixed for a given shape.
///
/// # Example
///
/// ```
/// use ndcontrastive::operations::gemv_t_into;
///
/// // A = [[1, 2, 3],
/// //      [4, 5, 6]]
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let mut y = [0.0; 3];
/// gemv_t_into(&a, 2, 3, &[1.0, 1.0], &mut y).unwrap();
/// assert_eq!(y, [5.0, 7.0, 9.0]);
/// ```
pub fn gemv_t_into<ElT: Scalar>(
    a: &[ElT],
    rows: usize,
    cols: usize,
    x: &[ElT],
    y: &mut [ElT],
) -> Result<(), TensorError> {
    if a.len() != rows * cols {
        return Err(TensorError::LengthMismatch {
            expected: rows * cols,
            actual: a.len(),
        });
    }
    if x.len() != rows {
        return Err(TensorError::LengthMismatch {
            expected: rows,
            actual: x.len(),
        });
    }
    if y.len() != cols {
        return Err(TensorError::LengthMismatch {
            expected: cols,
            actual: y.len(),
        });
    }

    let a_t = MatRef::from_column_major_slice(a, cols, rows);
    let x_mat = MatRef::from_column_major_slice(x, rows, 1);
    let mut y_mat = MatMut::from_column_major_slice_mut(y, cols, 1);

    // y = 1 * Aᵀ x, replacing y
    matmul(
        y_mat.as_mut(),
        Accum::Replace,
        a_t,
        x_mat,
        ElT::one(),
        Par::Seq,
    );
    Ok(())
}

/// Reduce an `(N, C, H, W)` buffer over its channel axis into `(N, 1, H, W)`.
///
/// `weights` must hold `C` entries; a vector of ones yields plain channel sums.
pub fn sum_channels_into<ElT: Scalar>(
    src: &[ElT],
    shape: Shape4,
    weights: &[ElT],
    dst: &mut [ElT],
) -> Result<(), TensorError> {
    if src.len() != shape.count() {
        return Err(TensorError::LengthMismatch {
            expected: shape.count(),
            actual: src.len(),
        });
    }
    if dst.len() != shape.pairs() {
        return Err(TensorError::LengthMismatch {
            expected: shape.pairs(),
            actual: dst.len(),
        });
    }

    let channels = shape.channels;
    let dim = shape.spatial_dim();
    let block = channels * dim;
    if block == 0 {
        return Ok(());
    }
    for (src_block, dst_block) in src.chunks_exact(block).zip(dst.chunks_exact_mut(dim)) {
        gemv_t_into(src_block, channels, dim, weights, dst_block)?;
    }
    Ok(())
}
