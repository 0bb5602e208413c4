//! Stride computation utilities.
//!
//! Uses row-major (C) order: the last axis is contiguous, so an `(N, C, H, W)`
//! tensor stores element `(n, c, h, w)` at `((n*C + c)*H + h)*W + w`.

/// Compute row-major strides from shape.
///
/// For shape [d0, d1, d2], returns strides [d1*d2, d2, 1]. Strides of a
/// shape with a zero-length axis saturate instead of overflowing.
///
/// # Examples
///
/// ```
/// use ndcontrastive::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![20, 5, 1]);
/// assert_eq!(compute_strides(&[2, 3]), vec![3, 1]);
/// assert_eq!(compute_strides(&[5]), vec![1]);
/// assert_eq!(compute_strides(&[]), vec![]);
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride: usize = 1;

    for (slot, &dim) in strides.iter_mut().zip(shape.iter()).rev() {
        *slot = stride;
        stride = stride.saturating_mul(dim);
    }

    strides
}

/// Convert cartesian indices to a linear index.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert a linear index to cartesian indices using row-major order.
pub fn linear_to_cartesian(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; shape.len()];

    for (slot, &dim) in indices.iter_mut().zip(shape.iter()).rev() {
        *slot = linear % dim;
        linear /= dim;
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_strides_4d() {
        assert_eq!(compute_strides(&[2, 3, 4, 5]), vec![60, 20, 5, 1]);
    }

    #[test]
    fn test_compute_strides_1d() {
        assert_eq!(compute_strides(&[5]), vec![1]);
    }

    #[test]
    fn test_compute_strides_empty() {
        assert_eq!(compute_strides(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_compute_strides_zero_axis_saturates() {
        let strides = compute_strides(&[0, usize::MAX, usize::MAX]);
        assert_eq!(strides, vec![usize::MAX, usize::MAX, 1]);
    }

    #[test]
    fn test_cartesian_to_linear_nchw() {
        let strides = compute_strides(&[2, 3, 4, 5]);
        assert_eq!(cartesian_to_linear(&[0, 0, 0, 0], &strides), 0);
        assert_eq!(cartesian_to_linear(&[0, 0, 0, 1], &strides), 1);
        assert_eq!(cartesian_to_linear(&[0, 1, 0, 0], &strides), 20);
        assert_eq!(cartesian_to_linear(&[1, 2, 3, 4], &strides), 60 + 40 + 15 + 4);
    }

    #[test]
    fn test_linear_to_cartesian() {
        let shape = [3, 4, 5];
        assert_eq!(linear_to_cartesian(0, &shape), vec![0, 0, 0]);
        assert_eq!(linear_to_cartesian(1, &shape), vec![0, 0, 1]);
        assert_eq!(linear_to_cartesian(5, &shape), vec![0, 1, 0]);
        assert_eq!(linear_to_cartesian(20, &shape), vec![1, 0, 0]);
    }

    #[test]
    fn test_roundtrip() {
        let shape = [2, 3, 4];
        let strides = compute_strides(&shape);
        for linear in 0..24 {
            let cartesian = linear_to_cartesian(linear, &shape);
            assert_eq!(cartesian_to_linear(&cartesian, &strides), linear);
        }
    }
}
