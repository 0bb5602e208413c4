//! The contrastive loss operator.

use tracing::{debug, trace};

use super::config::ContrastiveLossConfig;
use super::penalty::{DissimilarPenalty, EuclideanPenalty, LegacyPenalty, PenaltyKind};
use crate::error::TensorError;
use crate::operations::{axpby, powi_into, sub_into, sum_channels_into};
use crate::scalar::Scalar;
use crate::shape::Shape4;
use crate::tensor::Tensor;

/// Whether the operator holds intermediates from a forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// No forward pass since construction or the last shape change.
    Unset,
    /// Scratch buffers hold the forward pass over inputs of this shape.
    Ready { shape: Shape4 },
}

/// Gradients produced by [`ContrastiveLoss::backward`].
///
/// An entry is `None` when its input was not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct InputGradients<ElT: Scalar> {
    pub a: Option<Tensor<ElT>>,
    pub b: Option<Tensor<ElT>>,
}

/// Pairwise contrastive loss over `(N, C, H, W)` feature tensors.
///
/// For each batch index `n` and spatial position `p` the operator compares
/// `a[n, :, p]` with `b[n, :, p]` through their squared Euclidean distance
/// `d²`. Similar pairs (label 1) contribute `d²`; dissimilar pairs (label 0)
/// contribute `alpha_dissimilar * max(margin - d², 0)` in the legacy variant
/// and `alpha_dissimilar * max(margin - d, 0)²` otherwise. The sum is divided
/// by `2 * N * H * W`.
///
/// `backward` reuses the intermediates of the most recent `forward` and fails
/// with [`TensorError::PreconditionViolation`] when there is none.
///
/// # Example
///
/// ```
/// use ndcontrastive::{ContrastiveLoss, ContrastiveLossConfig, Tensor};
///
/// let mut op = ContrastiveLoss::<f64>::new(ContrastiveLossConfig::default()).unwrap();
/// let a = Tensor::from_vec(vec![1.0, 0.0, 0.0], &[1, 3]).unwrap();
/// let b = Tensor::zeros(&[1, 3]);
/// let label = Tensor::from_vec(vec![1.0], &[1]).unwrap();
///
/// let loss = op.forward(&a, &b, &label).unwrap();
/// assert_eq!(loss, 0.5);
///
/// let grads = op.backward(1.0, [true, true]).unwrap();
/// assert_eq!(grads.a.unwrap().data(), &[1.0, 0.0, 0.0]);
/// assert_eq!(grads.b.unwrap().data(), &[-1.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ContrastiveLoss<ElT: Scalar> {
    config: ContrastiveLossConfig,
    kind: PenaltyKind,
    margin: ElT,
    alpha_dissimilar: ElT,
    shape: Option<Shape4>,
    feature_dims: Vec<usize>,
    diff: Tensor<ElT>,
    diff_sq: Tensor<ElT>,
    dist_sq: Tensor<ElT>,
    summer_vec: Tensor<ElT>,
    similar: Vec<bool>,
    top: Tensor<ElT>,
    state: PassState,
}

impl<ElT: Scalar> ContrastiveLoss<ElT> {
    /// Create an operator with no allocated scratch.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: ContrastiveLossConfig) -> Result<Self, TensorError> {
        config.validate()?;
        Ok(Self {
            config,
            kind: PenaltyKind::from_legacy_flag(config.legacy_version),
            margin: ElT::from_f64(config.margin),
            alpha_dissimilar: ElT::from_f64(config.alpha_dissimilar),
            shape: None,
            feature_dims: Vec::new(),
            diff: Tensor::zeros(&[0]),
            diff_sq: Tensor::zeros(&[0]),
            dist_sq: Tensor::zeros(&[0]),
            summer_vec: Tensor::zeros(&[0]),
            similar: Vec::new(),
            top: Tensor::zeros(&[]),
            state: PassState::Unset,
        })
    }

    /// Validate input shapes and allocate scratch buffers.
    ///
    /// Returns the output shape, which is always the scalar shape `[]`.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if `a` and `b` disagree on any axis, if the label
    ///   has more than one channel, or if the label's batch size or spatial
    ///   extent differs from the features.
    /// - `RankMismatch` for inputs of rank above four.
    /// - `ZeroSizedAxis` if any axis of the features is empty.
    /// - `SizeOverflow` if the feature element count overflows `usize`.
    pub fn setup(
        &mut self,
        shape_a: &[usize],
        shape_b: &[usize],
        shape_label: &[usize],
    ) -> Result<Vec<usize>, TensorError> {
        self.reshape(shape_a, shape_b, shape_label)?;
        Ok(self.top.shape().to_vec())
    }

    /// Re-run shape setup against possibly new input shapes.
    ///
    /// Unchanged shapes keep the existing allocation and the current
    /// [`PassState`]; any change resets the state to `Unset`.
    pub fn reshape(
        &mut self,
        shape_a: &[usize],
        shape_b: &[usize],
        shape_label: &[usize],
    ) -> Result<Shape4, TensorError> {
        let shape = check_input_shapes(shape_a, shape_b, shape_label)?;

        if self.shape != Some(shape) || self.feature_dims != shape_a {
            debug!(%shape, "allocating contrastive loss scratch");
            self.diff.reshape(&shape.dims())?;
            self.diff_sq.reshape(&shape.dims())?;
            self.dist_sq.reshape(&shape.with_single_channel().dims())?;
            self.summer_vec.reshape(&[shape.channels])?;
            self.similar.resize(shape.pairs(), false);
            self.top.reshape(&[])?;
            self.shape = Some(shape);
            self.feature_dims = shape_a.to_vec();
            self.state = PassState::Unset;
        }
        self.summer_vec.fill(ElT::one());
        Ok(shape)
    }

    /// Compute the loss and cache the intermediates `backward` needs.
    ///
    /// Label values are read by truncation toward zero: a pair is similar
    /// when the truncated label is nonzero.
    pub fn forward(
        &mut self,
        a: &Tensor<ElT>,
        b: &Tensor<ElT>,
        label: &Tensor<ElT>,
    ) -> Result<ElT, TensorError> {
        let shape = self.reshape(a.shape(), b.shape(), label.shape())?;
        self.state = PassState::Unset;

        sub_into(a.data(), b.data(), self.diff.data_mut())?;
        powi_into(self.diff.data(), 2, self.diff_sq.data_mut())?;
        sum_channels_into(
            self.diff_sq.data(),
            shape,
            self.summer_vec.data(),
            self.dist_sq.data_mut(),
        )?;
        for (slot, &value) in self.similar.iter_mut().zip(label.data()) {
            *slot = value.is_truthy_label();
        }

        let total = match self.kind {
            PenaltyKind::Legacy => self.accumulate_loss(&LegacyPenalty::new(self.margin)),
            PenaltyKind::Euclidean => self.accumulate_loss(&EuclideanPenalty::new(self.margin)),
        };
        let loss = total / ElT::from_f64((2 * shape.pairs()) as f64);

        self.top.data_mut()[0] = loss;
        self.state = PassState::Ready { shape };
        trace!(loss = loss.to_f64_lossless(), "contrastive loss forward");
        Ok(loss)
    }

    fn accumulate_loss<P: DissimilarPenalty<ElT>>(&self, penalty: &P) -> ElT {
        let alpha = self.alpha_dissimilar;
        self.dist_sq
            .data()
            .iter()
            .zip(&self.similar)
            .fold(ElT::zero(), |acc, (&dist_sq, &similar)| {
                if similar {
                    acc + dist_sq
                } else {
                    acc + alpha * penalty.loss(dist_sq)
                }
            })
    }

    /// Gradients of `top_grad * loss` with respect to the two feature inputs.
    ///
    /// Tensors are allocated with the shape `a` had in the last forward pass.
    pub fn backward(
        &self,
        top_grad: ElT,
        propagate_down: [bool; 2],
    ) -> Result<InputGradients<ElT>, TensorError> {
        let shape = self.ready_shape()?;
        let mut grads = [None, None];
        for (i, slot) in grads.iter_mut().enumerate() {
            if propagate_down[i] {
                let mut grad = Tensor::zeros(&self.feature_dims);
                self.write_gradient(shape, top_grad, i, grad.data_mut())?;
                *slot = Some(grad);
            }
        }
        let [a, b] = grads;
        Ok(InputGradients { a, b })
    }

    /// In-place variant of [`backward`](Self::backward).
    ///
    /// Each buffer must hold exactly `N * C * H * W` elements. Buffers whose
    /// `propagate_down` flag is false are not written. On error no buffer is
    /// modified.
    pub fn backward_into(
        &self,
        top_grad: ElT,
        propagate_down: [bool; 2],
        grad_a: &mut Tensor<ElT>,
        grad_b: &mut Tensor<ElT>,
    ) -> Result<(), TensorError> {
        self.backward_into_slices(top_grad, propagate_down, grad_a.data_mut(), grad_b.data_mut())
    }

    /// [`backward_into`](Self::backward_into) over flat row-major buffers.
    ///
    /// A buffer whose flag is false may have any length, including zero.
    pub fn backward_into_slices(
        &self,
        top_grad: ElT,
        propagate_down: [bool; 2],
        grad_a: &mut [ElT],
        grad_b: &mut [ElT],
    ) -> Result<(), TensorError> {
        let shape = self.ready_shape()?;
        let mut outputs = [grad_a, grad_b];
        for (grad, _) in outputs.iter().zip(propagate_down).filter(|(_, p)| *p) {
            if grad.len() != shape.count() {
                return Err(TensorError::LengthMismatch {
                    expected: shape.count(),
                    actual: grad.len(),
                });
            }
        }
        for (i, grad) in outputs.iter_mut().enumerate() {
            if propagate_down[i] {
                self.write_gradient(shape, top_grad, i, grad)?;
            }
        }
        Ok(())
    }

    fn write_gradient(
        &self,
        shape: Shape4,
        top_grad: ElT,
        input: usize,
        out: &mut [ElT],
    ) -> Result<(), TensorError> {
        let sign = if input == 0 { ElT::one() } else { -ElT::one() };
        let alpha = sign * top_grad / ElT::from_f64(shape.pairs() as f64);
        trace!(input, "contrastive loss backward");

        // Exact for similar pairs; dissimilar pairs are overwritten below.
        axpby(alpha, self.diff.data(), ElT::zero(), out)?;

        match self.kind {
            PenaltyKind::Legacy => {
                self.overwrite_dissimilar(shape, alpha, &LegacyPenalty::new(self.margin), out)
            }
            PenaltyKind::Euclidean => {
                self.overwrite_dissimilar(shape, alpha, &EuclideanPenalty::new(self.margin), out)
            }
        }
        Ok(())
    }

    fn overwrite_dissimilar<P: DissimilarPenalty<ElT>>(
        &self,
        shape: Shape4,
        alpha: ElT,
        penalty: &P,
        out: &mut [ElT],
    ) {
        let channels = shape.channels;
        let dim = shape.spatial_dim();
        let diff = self.diff.data();
        let dist_sq = self.dist_sq.data();

        for n in 0..shape.num {
            for p in 0..dim {
                let pair = n * dim + p;
                if self.similar[pair] {
                    continue;
                }
                let factor = penalty.grad_factor(dist_sq[pair], alpha);
                let base = n * channels * dim + p;
                for c in 0..channels {
                    let idx = base + c * dim;
                    out[idx] = match factor {
                        Some(beta) => diff[idx] * beta / self.alpha_dissimilar,
                        None => ElT::zero(),
                    };
                }
            }
        }
    }

    fn ready_shape(&self) -> Result<Shape4, TensorError> {
        match self.state {
            PassState::Ready { shape } => Ok(shape),
            PassState::Unset => Err(TensorError::PreconditionViolation {
                message: "backward requires a forward pass over the current input shapes"
                    .to_string(),
            }),
        }
    }

    /// Margin gap `margin - d²` (legacy) or `margin - d` of a dissimilar pair
    /// from the last forward pass. `None` for similar pairs or before forward.
    pub fn dissimilar_margin_gap(&self, pair: usize) -> Option<ElT> {
        if !matches!(self.state, PassState::Ready { .. }) || *self.similar.get(pair)? {
            return None;
        }
        let dist_sq = *self.dist_sq.get_linear(pair)?;
        Some(match self.kind {
            PenaltyKind::Legacy => LegacyPenalty::new(self.margin).margin_gap(dist_sq),
            PenaltyKind::Euclidean => EuclideanPenalty::new(self.margin).margin_gap(dist_sq),
        })
    }

    pub fn config(&self) -> &ContrastiveLossConfig {
        &self.config
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Shape recorded by the last successful setup.
    pub fn shape(&self) -> Option<Shape4> {
        self.shape
    }

    /// `a - b` from the last forward pass.
    pub fn diff(&self) -> &Tensor<ElT> {
        &self.diff
    }

    /// `(a - b)²` from the last forward pass.
    pub fn diff_sq(&self) -> &Tensor<ElT> {
        &self.diff_sq
    }

    /// Per-pair squared distances, shape `(N, 1, H, W)`.
    pub fn dist_sq(&self) -> &Tensor<ElT> {
        &self.dist_sq
    }

    /// Channel reduction weights, `C` ones.
    pub fn summer_vec(&self) -> &Tensor<ElT> {
        &self.summer_vec
    }

    /// Scalar output holding the last computed loss.
    pub fn top(&self) -> &Tensor<ElT> {
        &self.top
    }
}

/// Validate the three input shapes and return the shared `(N, C, H, W)`.
fn check_input_shapes(
    shape_a: &[usize],
    shape_b: &[usize],
    shape_label: &[usize],
) -> Result<Shape4, TensorError> {
    let a = Shape4::from_dims(shape_a)?;
    let b = Shape4::from_dims(shape_b)?;
    let label = Shape4::from_dims(shape_label)?;

    let checks = [
        ("b", "num", a.num, b.num),
        ("b", "channels", a.channels, b.channels),
        ("b", "height", a.height, b.height),
        ("b", "width", a.width, b.width),
        ("label", "num", a.num, label.num),
        ("label", "channels", 1, label.channels),
        ("label", "height", b.height, label.height),
        ("label", "width", b.width, label.width),
    ];
    for (tensor, axis, expected, actual) in checks {
        if expected != actual {
            return Err(TensorError::ShapeMismatch {
                tensor,
                axis,
                expected,
                actual,
            });
        }
    }
    a.require_nonempty("a")?;
    // Every other product taken from `a` divides this one.
    if a.checked_count().is_none() {
        return Err(TensorError::SizeOverflow {
            shape: shape_a.to_vec(),
        });
    }
    Ok(a)
}
