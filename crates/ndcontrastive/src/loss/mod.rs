//! Pairwise contrastive loss.
//!
//! ```text
//! setup/reshape ──► scratch (diff, diff_sq, dist_sq, summer_vec)
//!       │
//! forward(a, b, label) ──► loss            PassState::Ready
//!       │
//! backward(top_grad, propagate_down) ──► ∂loss/∂a, ∂loss/∂b
//! ```

mod config;
mod contrastive;
mod penalty;

pub use config::ContrastiveLossConfig;
pub use contrastive::{ContrastiveLoss, InputGradients, PassState};
pub use penalty::{
    DISTANCE_EPSILON, DissimilarPenalty, EuclideanPenalty, LegacyPenalty, PenaltyKind,
};
