//! Element-wise kernels over flat buffers.
//!
//! These mirror the level-1 BLAS-style helpers the loss is written in terms
//! of. Every kernel checks that its operands agree in length and writes its
//! result into a caller-provided destination.

use crate::error::TensorError;
use crate::scalar::Scalar;

#[inline]
fn check_len(expected: usize, actual: usize) -> Result<(), TensorError> {
    if expected != actual {
        return Err(TensorError::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// `dst[i] = a[i] - b[i]`.
///
/// # Example
///
/// ```
/// use ndcontrastive::operations::sub_into;
///
/// let mut dst = [0.0; 3];
/// sub_into(&[3.0, 2.0, 1.0], &[1.0, 1.0, 1.0], &mut dst).unwrap();
/// assert_eq!(dst, [2.0, 1.0, 0.0]);
/// ```
pub fn sub_into<ElT: Scalar>(a: &[ElT], b: &[ElT], dst: &mut [ElT]) -> Result<(), TensorError> {
    check_len(a.len(), b.len())?;
    check_len(a.len(), dst.len())?;
    for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
        *d = x - y;
    }
    Ok(())
}

/// `dst[i] = src[i]^exponent`.
///
/// # Example
///
/// ```
/// use ndcontrastive::operations::powi_into;
///
/// let mut dst = [0.0; 3];
/// powi_into(&[1.0, -2.0, 3.0], 2, &mut dst).unwrap();
/// assert_eq!(dst, [1.0, 4.0, 9.0]);
/// ```
pub fn powi_into<ElT: Scalar>(
    src: &[ElT],
    exponent: i32,
    dst: &mut [ElT],
) -> Result<(), TensorError> {
    check_len(src.len(), dst.len())?;
    for (d, &x) in dst.iter_mut().zip(src) {
        *d = x.powi(exponent);
    }
    Ok(())
}

/// `y[i] = alpha * x[i] + beta * y[i]`.
///
/// A `beta` of exactly zero overwrites `y` without reading it, so stale
/// NaN or infinite values in `y` do not leak into the result.
///
/// # Example
///
/// ```
/// use ndcontrastive::operations::axpby;
///
/// let mut y = [f64::NAN, 1.0];
/// axpby(2.0, &[1.0, 2.0], 0.0, &mut y).unwrap();
/// assert_eq!(y, [2.0, 4.0]);
///
/// axpby(1.0, &[1.0, 1.0], 0.5, &mut y).unwrap();
/// assert_eq!(y, [2.0, 3.0]);
/// ```
pub fn axpby<ElT: Scalar>(
    alpha: ElT,
    x: &[ElT],
    beta: ElT,
    y: &mut [ElT],
) -> Result<(), TensorError> {
    check_len(x.len(), y.len())?;
    if beta == ElT::zero() {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = alpha * xi;
        }
    } else {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = alpha * xi + beta * *yi;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sub_into() {
        let mut dst = vec![0.0f32; 4];
        sub_into(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0], &mut dst).unwrap();
        assert_eq!(dst, vec![-3.0, -1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_sub_into_length_mismatch() {
        let mut dst = vec![0.0f64; 2];
        let err = sub_into(&[1.0, 2.0], &[1.0], &mut dst).unwrap_err();
        assert_eq!(
            err,
            TensorError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(sub_into(&[1.0, 2.0], &[1.0, 2.0], &mut [0.0; 3]).is_err());
    }

    #[test]
    fn test_powi_square_is_exact_product() {
        let src = [0.1f64, -1.3, 7.25];
        let mut dst = [0.0; 3];
        powi_into(&src, 2, &mut dst).unwrap();
        for (d, s) in dst.iter().zip(src.iter()) {
            assert_eq!(*d, s * s);
        }
    }

    #[test]
    fn test_axpby_accumulates() {
        let mut y = vec![1.0f64, 2.0, 3.0];
        axpby(0.5, &[2.0, 2.0, 2.0], 2.0, &mut y).unwrap();
        assert_relative_eq!(y[0], 3.0);
        assert_relative_eq!(y[1], 5.0);
        assert_relative_eq!(y[2], 7.0);
    }

    #[test]
    fn test_axpby_zero_beta_ignores_destination() {
        let mut y = vec![f64::INFINITY, f64::NAN];
        axpby(-1.0, &[1.0, 2.0], 0.0, &mut y).unwrap();
        assert_eq!(y, vec![-1.0, -2.0]);
    }
}
