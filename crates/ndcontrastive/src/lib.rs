//! ndcontrastive - pairwise contrastive loss over dense tensors
//!
//! The crate provides a small row-major dense tensor type and a contrastive
//! loss operator with an explicit forward/backward contract, suitable for
//! embedding into a host training engine.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Loss operator (loss module)
//!     → ContrastiveLoss::{setup, forward, backward}
//!
//! Level 2: Numeric kernels (operations module)
//!     → sub_into, powi_into, axpby, sum_channels_into
//!
//! Level 3: Backend
//!     → faer matmul for the channel reduction
//! ```
//!
//! # Example
//!
//! ```
//! use ndcontrastive::{ContrastiveLoss, ContrastiveLossConfig, Tensor};
//!
//! let config = ContrastiveLossConfig::default().with_margin(2.0);
//! let mut op = ContrastiveLoss::<f64>::new(config).unwrap();
//!
//! // One dissimilar pair at distance 1: (2 - 1)² / 2
//! let a = Tensor::from_vec(vec![1.0, 0.0, 0.0], &[1, 3, 1, 1]).unwrap();
//! let b = Tensor::zeros(&[1, 3, 1, 1]);
//! let label = Tensor::from_vec(vec![0.0], &[1, 1, 1, 1]).unwrap();
//!
//! let loss = op.forward(&a, &b, &label).unwrap();
//! assert_eq!(loss, 0.5);
//!
//! let grads = op.backward(1.0, [true, true]).unwrap();
//! let (ga, gb) = (grads.a.unwrap(), grads.b.unwrap());
//! for (x, y) in ga.data().iter().zip(gb.data()) {
//!     assert_eq!(*x, -*y);
//! }
//! ```

pub mod error;
pub mod gradcheck;
pub mod loss;
pub mod operations;
pub mod random;
pub mod scalar;
pub mod shape;
pub mod storage;
pub mod strides;
pub mod tensor;

pub use error::TensorError;
pub use gradcheck::{GradientChecker, GradientReport};
pub use loss::{ContrastiveLoss, ContrastiveLossConfig, InputGradients, PassState};
pub use scalar::Scalar;
pub use shape::Shape4;
pub use storage::Dense;
pub use tensor::Tensor;
