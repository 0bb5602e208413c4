//! Numeric kernels used by the loss operator.
//!
//! ```text
//! elementwise   sub_into, powi_into, axpby
//! reduce        gemv_t_into, sum_channels_into (faer matmul)
//! ```

mod elementwise;
mod reduce;

pub use elementwise::{axpby, powi_into, sub_into};
pub use reduce::{gemv_t_into, sum_channels_into};
