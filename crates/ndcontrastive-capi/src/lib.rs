//! C API for ndcontrastive
//!
//! This crate exposes the contrastive loss operator to a host execution
//! engine through an opaque handle. Inputs are passed as raw row-major
//! buffers whose shapes were declared by the last `ndc_loss_f64_setup` call.
//!
//! All extern "C" functions are inherently unsafe as they work with raw pointers
//! from foreign code. The `#[unsafe(no_mangle)]` attribute marks the entire
//! function signature as unsafe at the FFI boundary.

#![allow(clippy::not_unsafe_ptr_arg_deref)]

use libc::{c_double, c_int, size_t};
use ndcontrastive::{ContrastiveLoss, ContrastiveLossConfig, Tensor, TensorError};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

// Status codes
pub type StatusCode = c_int;

pub const NDC_SUCCESS: StatusCode = 0;
pub const NDC_INVALID_ARGUMENT: StatusCode = -1;
pub const NDC_SHAPE_MISMATCH: StatusCode = -2;
pub const NDC_PRECONDITION_VIOLATION: StatusCode = -3;
pub const NDC_INTERNAL_ERROR: StatusCode = -4;
pub const NDC_INVALID_CONFIG: StatusCode = -5;

fn status_of(err: &TensorError) -> StatusCode {
    match err {
        TensorError::LengthMismatch { .. }
        | TensorError::ShapeMismatch { .. }
        | TensorError::RankMismatch { .. }
        | TensorError::ZeroSizedAxis { .. }
        | TensorError::SizeOverflow { .. } => NDC_SHAPE_MISMATCH,
        TensorError::PreconditionViolation { .. } => NDC_PRECONDITION_VIOLATION,
        TensorError::InvalidConfig { .. } => NDC_INVALID_CONFIG,
    }
}

/// Declared input shapes of a handle.
struct Shapes {
    a: Vec<usize>,
    b: Vec<usize>,
    label: Vec<usize>,
}

struct LossState {
    op: ContrastiveLoss<f64>,
    shapes: Option<Shapes>,
}

/// Opaque contrastive loss operator for f64
#[repr(C)]
pub struct ndc_loss_f64 {
    _private: *mut std::ffi::c_void,
}

impl ndc_loss_f64 {
    fn from_state(state: LossState) -> Self {
        let boxed = Box::new(state);
        Self {
            _private: Box::into_raw(boxed) as *mut std::ffi::c_void,
        }
    }

    fn inner(&self) -> &LossState {
        unsafe { &*(self._private as *const LossState) }
    }

    fn inner_mut(&mut self) -> &mut LossState {
        unsafe { &mut *(self._private as *mut LossState) }
    }
}

impl Drop for ndc_loss_f64 {
    fn drop(&mut self) {
        if !self._private.is_null() {
            unsafe {
                let _ = Box::from_raw(self._private as *mut LossState);
            }
        }
    }
}

unsafe fn shape_slice<'a>(shape: *const size_t, ndim: size_t) -> &'a [usize] {
    if ndim == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(shape, ndim) }
    }
}

unsafe fn grad_buffer<'a>(grad: *mut c_double, len: size_t) -> &'a mut [f64] {
    if grad.is_null() {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(grad, len) }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create a new operator.
///
/// # Arguments
/// * `margin` - Distance threshold for dissimilar pairs (> 0)
/// * `alpha_dissimilar` - Weight of the dissimilar term (> 0)
/// * `legacy_version` - Nonzero selects the squared-distance penalty
/// * `status` - Pointer to receive status code
///
/// # Returns
/// Pointer to new operator, or null on error
#[unsafe(no_mangle)]
pub extern "C" fn ndc_loss_f64_new(
    margin: c_double,
    alpha_dissimilar: c_double,
    legacy_version: c_int,
    status: *mut StatusCode,
) -> *mut ndc_loss_f64 {
    if status.is_null() {
        return ptr::null_mut();
    }

    let result = catch_unwind(|| {
        let config = ContrastiveLossConfig::default()
            .with_margin(margin)
            .with_alpha_dissimilar(alpha_dissimilar)
            .with_legacy_version(legacy_version != 0);
        match ContrastiveLoss::new(config) {
            Ok(op) => {
                let state = LossState { op, shapes: None };
                let ptr = Box::into_raw(Box::new(ndc_loss_f64::from_state(state)));
                (ptr, NDC_SUCCESS)
            }
            Err(err) => (ptr::null_mut(), status_of(&err)),
        }
    });

    match result {
        Ok((ptr, code)) => {
            unsafe {
                *status = code;
            }
            ptr
        }
        Err(_) => {
            unsafe {
                *status = NDC_INTERNAL_ERROR;
            }
            ptr::null_mut()
        }
    }
}

/// Release (free) an operator.
#[unsafe(no_mangle)]
pub extern "C" fn ndc_loss_f64_release(loss: *mut ndc_loss_f64) {
    if !loss.is_null() {
        unsafe {
            let _ = Box::from_raw(loss);
        }
    }
}

// ============================================================================
// Setup / forward / backward
// ============================================================================

/// Declare input shapes and allocate scratch.
///
/// Shapes have rank at most four; missing trailing axes are read as 1.
#[unsafe(no_mangle)]
pub extern "C" fn ndc_loss_f64_setup(
    loss: *mut ndc_loss_f64,
    shape_a: *const size_t,
    ndim_a: size_t,
    shape_b: *const size_t,
    ndim_b: size_t,
    shape_label: *const size_t,
    ndim_label: size_t,
) -> StatusCode {
    if loss.is_null()
        || (shape_a.is_null() && ndim_a > 0)
        || (shape_b.is_null() && ndim_b > 0)
        || (shape_label.is_null() && ndim_label > 0)
    {
        return NDC_INVALID_ARGUMENT;
    }

    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        let state = (*loss).inner_mut();
        let a = shape_slice(shape_a, ndim_a);
        let b = shape_slice(shape_b, ndim_b);
        let label = shape_slice(shape_label, ndim_label);
        match state.op.setup(a, b, label) {
            Ok(_) => {
                state.shapes = Some(Shapes {
                    a: a.to_vec(),
                    b: b.to_vec(),
                    label: label.to_vec(),
                });
                NDC_SUCCESS
            }
            Err(err) => {
                state.shapes = None;
                status_of(&err)
            }
        }
    }));

    result.unwrap_or(NDC_INTERNAL_ERROR)
}

/// Compute the loss over the declared shapes.
///
/// # Arguments
/// * `a`, `b` - Feature buffers of `len_features` elements each
/// * `label` - Label buffer of `len_label` elements
/// * `out` - Receives the scalar loss
#[unsafe(no_mangle)]
pub extern "C" fn ndc_loss_f64_forward(
    loss: *mut ndc_loss_f64,
    a: *const c_double,
    b: *const c_double,
    len_features: size_t,
    label: *const c_double,
    len_label: size_t,
    out: *mut c_double,
) -> StatusCode {
    if loss.is_null() || a.is_null() || b.is_null() || label.is_null() || out.is_null() {
        return NDC_INVALID_ARGUMENT;
    }

    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        let state = (*loss).inner_mut();
        let Some(shapes) = state.shapes.as_ref() else {
            return NDC_PRECONDITION_VIOLATION;
        };
        let a = std::slice::from_raw_parts(a, len_features);
        let b = std::slice::from_raw_parts(b, len_features);
        let label = std::slice::from_raw_parts(label, len_label);

        let inputs = Tensor::from_slice(a, &shapes.a).and_then(|a| {
            let b = Tensor::from_slice(b, &shapes.b)?;
            let label = Tensor::from_slice(label, &shapes.label)?;
            Ok((a, b, label))
        });
        match inputs.and_then(|(a, b, label)| state.op.forward(&a, &b, &label)) {
            Ok(value) => {
                *out = value;
                NDC_SUCCESS
            }
            Err(err) => status_of(&err),
        }
    }));

    result.unwrap_or(NDC_INTERNAL_ERROR)
}

/// Write gradients of `top_grad * loss` into caller buffers.
///
/// A null gradient pointer means that input is not propagated; its buffer
/// is never written. Both non-null buffers must hold `len_features`
/// elements and must not alias; on error neither is written. Requires a
/// preceding successful forward call.
#[unsafe(no_mangle)]
pub extern "C" fn ndc_loss_f64_backward(
    loss: *const ndc_loss_f64,
    top_grad: c_double,
    grad_a: *mut c_double,
    grad_b: *mut c_double,
    len_features: size_t,
) -> StatusCode {
    if loss.is_null() || (!grad_a.is_null() && grad_a == grad_b) {
        return NDC_INVALID_ARGUMENT;
    }

    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        let state = (*loss).inner();
        let propagate_down = [!grad_a.is_null(), !grad_b.is_null()];
        let grad_a = grad_buffer(grad_a, len_features);
        let grad_b = grad_buffer(grad_b, len_features);
        match state
            .op
            .backward_into_slices(top_grad, propagate_down, grad_a, grad_b)
        {
            Ok(()) => NDC_SUCCESS,
            Err(err) => status_of(&err),
        }
    }));

    result.unwrap_or(NDC_INTERNAL_ERROR)
}
