//! Numerical gradient checks for the contrastive loss.
//!
//! Compares `backward` against central differences, both through a local
//! helper and through `GradientChecker`.

use approx::assert_relative_eq;
use ndcontrastive::{ContrastiveLoss, ContrastiveLossConfig, GradientChecker, Tensor};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;

        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * eps);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

fn loss_of(config: ContrastiveLossConfig, a: &[f64], b: &[f64], label: &[f64], shape: &[usize]) -> f64 {
    let mut label_shape = shape.to_vec();
    label_shape[1] = 1;
    let mut op = ContrastiveLoss::new(config).unwrap();
    op.forward(
        &Tensor::from_slice(a, shape).unwrap(),
        &Tensor::from_slice(b, shape).unwrap(),
        &Tensor::from_slice(label, &label_shape).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_numerical_gradient_small_batch() {
    // N=2, C=3, H=W=1; one similar and one dissimilar pair inside the margin.
    let shape = [2, 3, 1, 1];
    let config = ContrastiveLossConfig::default()
        .with_margin(1.0)
        .with_alpha_dissimilar(1.0)
        .with_legacy_version(false);
    let a_data = vec![0.10, -0.20, 0.30, 0.25, 0.05, -0.15];
    let b_data = vec![-0.05, 0.10, 0.20, -0.20, 0.30, 0.10];
    let label_data = vec![1.0, 0.0];

    let eps = 1e-6;
    let numerical_a = numerical_gradient(
        |a| loss_of(config, a, &b_data, &label_data, &shape),
        &a_data,
        eps,
    );
    let numerical_b = numerical_gradient(
        |b| loss_of(config, &a_data, b, &label_data, &shape),
        &b_data,
        eps,
    );

    let mut op = ContrastiveLoss::new(config).unwrap();
    op.forward(
        &Tensor::from_slice(&a_data, &shape).unwrap(),
        &Tensor::from_slice(&b_data, &shape).unwrap(),
        &Tensor::from_slice(&label_data, &[2, 1, 1, 1]).unwrap(),
    )
    .unwrap();
    let grads = op.backward(1.0, [true, true]).unwrap();

    for (analytic, numerical) in grads.a.unwrap().data().iter().zip(&numerical_a) {
        assert_relative_eq!(analytic, numerical, epsilon = 1e-4);
    }
    for (analytic, numerical) in grads.b.unwrap().data().iter().zip(&numerical_b) {
        assert_relative_eq!(analytic, numerical, epsilon = 1e-4);
    }
}

#[test]
fn test_gradient_checker_euclidean_random() {
    let mut rng = StdRng::seed_from_u64(1701);
    let a: Tensor<f64> = Tensor::randn_with_rng(&[4, 5, 2, 2], &mut rng);
    let b: Tensor<f64> = Tensor::randn_with_rng(&[4, 5, 2, 2], &mut rng);
    let label: Tensor<f64> = Tensor::random_labels_with_rng(&[4, 1, 2, 2], 0.5, &mut rng).unwrap();

    // Distances of 5-dim normal differences are ~3; margin 4 keeps most
    // dissimilar pairs active.
    let config = ContrastiveLossConfig::default().with_margin(4.0);
    let mut op = ContrastiveLoss::new(config).unwrap();
    let report = GradientChecker::new(1e-5, 1e-3)
        .with_kink_range(1e-2)
        .check(&mut op, &a, &b, &label)
        .unwrap();

    assert!(report.passed(), "{report:?}");
    assert_eq!(report.checked + report.skipped, 2 * a.len());
}

#[test]
fn test_gradient_checker_legacy_random() {
    let mut rng = StdRng::seed_from_u64(42);
    let a: Tensor<f64> = Tensor::randn_with_rng(&[6, 3], &mut rng);
    let b: Tensor<f64> = Tensor::randn_with_rng(&[6, 3], &mut rng);
    let label: Tensor<f64> = Tensor::random_labels_with_rng(&[6], 0.5, &mut rng).unwrap();

    let config = ContrastiveLossConfig::default()
        .with_margin(6.0)
        .with_legacy_version(true);
    let mut op = ContrastiveLoss::new(config).unwrap();
    let report = GradientChecker::new(1e-5, 1e-6)
        .with_kink_range(1e-2)
        .check(&mut op, &a, &b, &label)
        .unwrap();

    assert!(report.passed(), "{report:?}");
}

#[test]
fn test_gradient_checker_f32() {
    let mut rng = StdRng::seed_from_u64(9);
    let a: Tensor<f32> = Tensor::randn_with_rng(&[3, 4], &mut rng);
    let b: Tensor<f32> = Tensor::randn_with_rng(&[3, 4], &mut rng);
    let label: Tensor<f32> = Tensor::ones(&[3]);

    let mut op = ContrastiveLoss::new(ContrastiveLossConfig::default()).unwrap();
    let report = GradientChecker::default().check(&mut op, &a, &b, &label).unwrap();
    assert!(report.passed(), "{report:?}");
    assert_eq!(report.checked, 24);
}

#[test]
fn test_gradient_checker_restores_forward_state() {
    let a = Tensor::from_vec(vec![0.5, 0.5], &[1, 2]).unwrap();
    let b: Tensor<f64> = Tensor::zeros(&[1, 2]);
    let label = Tensor::from_vec(vec![1.0], &[1]).unwrap();

    let mut op = ContrastiveLoss::new(ContrastiveLossConfig::default()).unwrap();
    GradientChecker::new(1e-4, 1e-4)
        .check(&mut op, &a, &b, &label)
        .unwrap();
    assert_eq!(op.diff().data(), &[0.5, 0.5]);
    assert_eq!(op.top().data(), &[0.25]);
}
