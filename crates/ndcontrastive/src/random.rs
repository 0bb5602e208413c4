//! Random tensor construction.
//!
//! Feature tensors are drawn from uniform or standard normal distributions;
//! label tensors hold 0/1 values drawn from a Bernoulli distribution.

use rand::Rng;
use rand::distr::{Bernoulli, Distribution, StandardUniform};
use rand_distr::StandardNormal;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

impl<ElT: Scalar> Tensor<ElT>
where
    StandardUniform: Distribution<ElT>,
{
    /// Create a tensor with uniform random values in [0, 1).
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with uniform random values using a specific RNG.
    ///
    /// # Example
    ///
    /// ```
    /// use ndcontrastive::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t1: Tensor<f64> = Tensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t2: Tensor<f64> = Tensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// assert_eq!(t1.data(), t2.data());
    /// ```
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let mut t = Self::zeros(shape);
        for x in t.data_mut() {
            *x = rng.sample(StandardUniform);
        }
        t
    }
}

impl<ElT: Scalar> Tensor<ElT>
where
    StandardNormal: Distribution<ElT>,
{
    /// Create a tensor with standard normal random values.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with standard normal random values using a specific RNG.
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let mut t = Self::zeros(shape);
        for x in t.data_mut() {
            *x = rng.sample(StandardNormal);
        }
        t
    }
}

impl<ElT: Scalar> Tensor<ElT> {
    /// Create a 0/1 label tensor where each entry is 1 with probability
    /// `p_similar`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidConfig` if `p_similar` is outside [0, 1].
    ///
    /// # Example
    ///
    /// ```
    /// use ndcontrastive::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let labels: Tensor<f64> = Tensor::random_labels_with_rng(&[16], 0.5, &mut rng).unwrap();
    /// assert!(labels.data().iter().all(|&x| x == 0.0 || x == 1.0));
    /// ```
    pub fn random_labels_with_rng<R: Rng>(
        shape: &[usize],
        p_similar: f64,
        rng: &mut R,
    ) -> Result<Self, TensorError> {
        let bernoulli = Bernoulli::new(p_similar).map_err(|_| TensorError::InvalidConfig {
            message: format!("label probability must lie in [0, 1], got {p_similar}"),
        })?;
        let mut t = Self::zeros(shape);
        for x in t.data_mut() {
            if bernoulli.sample(rng) {
                *x = ElT::one();
            }
        }
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_f64() {
        let t: Tensor<f64> = Tensor::random(&[2, 3]);
        assert_eq!(t.shape(), &[2, 3]);
        for &v in t.data() {
            assert!((0.0..1.0).contains(&v), "value {} not in [0, 1)", v);
        }
    }

    #[test]
    fn test_random_f32() {
        let t: Tensor<f32> = Tensor::random(&[5]);
        assert!(t.data().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_randn_reproducible() {
        let mut rng1 = StdRng::seed_from_u64(54321);
        let t1: Tensor<f64> = Tensor::randn_with_rng(&[3, 4], &mut rng1);

        let mut rng2 = StdRng::seed_from_u64(54321);
        let t2: Tensor<f64> = Tensor::randn_with_rng(&[3, 4], &mut rng2);

        assert_eq!(t1.data(), t2.data());
    }

    #[test]
    fn test_randn_moments() {
        let t: Tensor<f64> = Tensor::randn(&[200]);
        let mean = t.data().iter().sum::<f64>() / 200.0;
        assert!(mean.abs() < 0.5, "mean {} too far from 0", mean);
    }

    #[test]
    fn test_random_labels_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let all: Tensor<f64> = Tensor::random_labels_with_rng(&[8], 1.0, &mut rng).unwrap();
        assert!(all.data().iter().all(|&x| x == 1.0));
        let none: Tensor<f64> = Tensor::random_labels_with_rng(&[8], 0.0, &mut rng).unwrap();
        assert!(none.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_random_labels_invalid_probability() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = Tensor::<f64>::random_labels_with_rng(&[4], 1.5, &mut rng);
        assert!(matches!(result, Err(TensorError::InvalidConfig { .. })));
    }
}
