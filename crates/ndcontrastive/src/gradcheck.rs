//! Finite-difference gradient checking for the contrastive loss.
//!
//! Each feature element is perturbed by `±step` and the central difference
//!
//! ```text
//! grad_i ≈ (L(x + step*e_i) - L(x - step*e_i)) / (2*step)
//! ```
//!
//! is compared against the analytic gradient from `backward`. Elements whose
//! pair sits within `kink_range` of the margin boundary are skipped, since
//! the loss is not differentiable there.

use crate::error::TensorError;
use crate::loss::ContrastiveLoss;
use crate::scalar::Scalar;
use crate::strides::linear_to_cartesian;
use crate::tensor::Tensor;

/// Tolerances for [`GradientChecker::check`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientChecker {
    /// Perturbation size.
    pub step: f64,
    /// Allowed error, scaled by `max(|analytic|, |numeric|, 1)`.
    pub threshold: f64,
    /// Skip dissimilar pairs whose margin gap is within this distance of 0.
    pub kink_range: Option<f64>,
}

impl Default for GradientChecker {
    fn default() -> Self {
        Self {
            step: 1e-2,
            threshold: 1e-2,
            kink_range: None,
        }
    }
}

/// Worst disagreement found by a check.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientMismatch {
    /// 0 for `a`, 1 for `b`.
    pub input: usize,
    /// Cartesian index of the element within the input.
    pub index: Vec<usize>,
    pub analytic: f64,
    pub numeric: f64,
    /// `|analytic - numeric| / max(|analytic|, |numeric|, 1)`.
    pub scaled_error: f64,
}

/// Outcome of a gradient check.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientReport {
    pub checked: usize,
    pub skipped: usize,
    pub threshold: f64,
    pub worst: Option<GradientMismatch>,
}

impl GradientReport {
    pub fn passed(&self) -> bool {
        self.worst
            .as_ref()
            .is_none_or(|w| w.scaled_error <= self.threshold)
    }
}

impl GradientChecker {
    pub fn new(step: f64, threshold: f64) -> Self {
        Self {
            step,
            threshold,
            kink_range: None,
        }
    }

    pub fn with_kink_range(mut self, kink_range: f64) -> Self {
        self.kink_range = Some(kink_range);
        self
    }

    /// Compare `backward` against central differences for both inputs.
    ///
    /// On success the operator is left in the `Ready` state for the
    /// unperturbed inputs. If a perturbed pass fails, the unperturbed
    /// forward is still re-run before the error is returned.
    pub fn check<ElT: Scalar>(
        &self,
        op: &mut ContrastiveLoss<ElT>,
        a: &Tensor<ElT>,
        b: &Tensor<ElT>,
        label: &Tensor<ElT>,
    ) -> Result<GradientReport, TensorError> {
        op.forward(a, b, label)?;
        let outcome = self.compare(op, a, b, label);
        op.forward(a, b, label)?;
        outcome
    }

    fn compare<ElT: Scalar>(
        &self,
        op: &mut ContrastiveLoss<ElT>,
        a: &Tensor<ElT>,
        b: &Tensor<ElT>,
        label: &Tensor<ElT>,
    ) -> Result<GradientReport, TensorError> {
        let analytic = op.backward(ElT::one(), [true, true])?;
        let shape = op.shape().ok_or_else(|| TensorError::PreconditionViolation {
            message: "gradient check requires a configured operator".to_string(),
        })?;
        let skip: Vec<bool> = (0..shape.pairs())
            .map(|pair| self.near_kink(op, pair))
            .collect();

        let step = ElT::from_f64(self.step);
        let mut report = GradientReport {
            checked: 0,
            skipped: 0,
            threshold: self.threshold,
            worst: None,
        };
        let inputs = [(a, analytic.a), (b, analytic.b)];
        let dim = shape.spatial_dim();
        let block = shape.channels * dim;

        for (input, (x, grad)) in inputs.into_iter().enumerate() {
            let Some(grad) = grad else { continue };
            let mut perturbed = x.clone();
            for i in 0..x.len() {
                let pair = (i / block) * dim + i % dim;
                if skip[pair] {
                    report.skipped += 1;
                    continue;
                }
                let original = x.data()[i];

                perturbed.data_mut()[i] = original + step;
                let plus = self.loss_with(op, input, &perturbed, a, b, label)?;
                perturbed.data_mut()[i] = original - step;
                let minus = self.loss_with(op, input, &perturbed, a, b, label)?;
                perturbed.data_mut()[i] = original;

                let numeric = (plus - minus) / (2.0 * self.step);
                let analytic = grad.data()[i].to_f64_lossless();
                let scale = analytic.abs().max(numeric.abs()).max(1.0);
                let scaled_error = (analytic - numeric).abs() / scale;
                report.checked += 1;

                if report
                    .worst
                    .as_ref()
                    .is_none_or(|w| scaled_error > w.scaled_error)
                {
                    report.worst = Some(GradientMismatch {
                        input,
                        index: linear_to_cartesian(i, x.shape()),
                        analytic,
                        numeric,
                        scaled_error,
                    });
                }
            }
        }
        Ok(report)
    }

    fn loss_with<ElT: Scalar>(
        &self,
        op: &mut ContrastiveLoss<ElT>,
        input: usize,
        perturbed: &Tensor<ElT>,
        a: &Tensor<ElT>,
        b: &Tensor<ElT>,
        label: &Tensor<ElT>,
    ) -> Result<f64, TensorError> {
        let loss = if input == 0 {
            op.forward(perturbed, b, label)?
        } else {
            op.forward(a, perturbed, label)?
        };
        Ok(loss.to_f64_lossless())
    }

    fn near_kink<ElT: Scalar>(&self, op: &ContrastiveLoss<ElT>, pair: usize) -> bool {
        match (self.kink_range, op.dissimilar_margin_gap(pair)) {
            (Some(range), Some(gap)) => gap.to_f64_lossless().abs() < range,
            _ => false,
        }
    }
}
