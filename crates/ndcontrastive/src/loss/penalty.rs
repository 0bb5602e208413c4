//! Dissimilar-pair penalty formulas.
//!
//! The formula is chosen once per pass and the per-pair loops are generic
//! over it, so the inner loops carry no variant check.

use crate::scalar::Scalar;

/// `max(gap, 0)` that keeps a NaN gap as NaN.
#[inline]
fn hinge<ElT: Scalar>(gap: ElT) -> ElT {
    if gap < ElT::zero() { ElT::zero() } else { gap }
}

/// Added to the distance in the Euclidean gradient denominator.
pub const DISTANCE_EPSILON: f64 = 1e-4;

/// Which penalty a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyKind {
    /// `max(margin - d², 0)`
    Legacy,
    /// `max(margin - d, 0)²`
    Euclidean,
}

impl PenaltyKind {
    pub fn from_legacy_flag(legacy_version: bool) -> Self {
        if legacy_version {
            Self::Legacy
        } else {
            Self::Euclidean
        }
    }
}

/// Loss and gradient of one dissimilar pair as a function of its squared
/// distance.
pub trait DissimilarPenalty<ElT: Scalar> {
    /// Signed distance to the margin; the pair is penalized while positive.
    fn margin_gap(&self, dist_sq: ElT) -> ElT;

    /// Unweighted loss contribution.
    fn loss(&self, dist_sq: ElT) -> ElT;

    /// Per-pair gradient factor `beta` given the pass scale `alpha`, or
    /// `None` when the pair lies on or beyond the margin.
    fn grad_factor(&self, dist_sq: ElT, alpha: ElT) -> Option<ElT>;
}

/// Penalty on squared distance.
#[derive(Debug, Clone, Copy)]
pub struct LegacyPenalty<ElT> {
    margin: ElT,
}

impl<ElT: Scalar> LegacyPenalty<ElT> {
    pub fn new(margin: ElT) -> Self {
        Self { margin }
    }
}

impl<ElT: Scalar> DissimilarPenalty<ElT> for LegacyPenalty<ElT> {
    #[inline]
    fn margin_gap(&self, dist_sq: ElT) -> ElT {
        self.margin - dist_sq
    }

    #[inline]
    fn loss(&self, dist_sq: ElT) -> ElT {
        hinge(self.margin_gap(dist_sq))
    }

    #[inline]
    fn grad_factor(&self, dist_sq: ElT, alpha: ElT) -> Option<ElT> {
        (self.margin_gap(dist_sq) > ElT::zero()).then(|| -alpha)
    }
}

/// Penalty on Euclidean distance.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanPenalty<ElT> {
    margin: ElT,
    epsilon: ElT,
}

impl<ElT: Scalar> EuclideanPenalty<ElT> {
    pub fn new(margin: ElT) -> Self {
        Self {
            margin,
            epsilon: ElT::from_f64(DISTANCE_EPSILON),
        }
    }
}

impl<ElT: Scalar> DissimilarPenalty<ElT> for EuclideanPenalty<ElT> {
    #[inline]
    fn margin_gap(&self, dist_sq: ElT) -> ElT {
        self.margin - dist_sq.sqrt()
    }

    #[inline]
    fn loss(&self, dist_sq: ElT) -> ElT {
        let m = hinge(self.margin_gap(dist_sq));
        m * m
    }

    #[inline]
    fn grad_factor(&self, dist_sq: ElT, alpha: ElT) -> Option<ElT> {
        let dist = dist_sq.sqrt();
        let mdist = self.margin - dist;
        (mdist > ElT::zero()).then(|| -alpha * mdist / (dist + self.epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kind_from_flag() {
        assert_eq!(PenaltyKind::from_legacy_flag(true), PenaltyKind::Legacy);
        assert_eq!(PenaltyKind::from_legacy_flag(false), PenaltyKind::Euclidean);
    }

    #[test]
    fn test_legacy_loss() {
        let p = LegacyPenalty::new(1.0f64);
        assert_eq!(p.loss(0.25), 0.75);
        assert_eq!(p.loss(1.0), 0.0);
        assert_eq!(p.loss(4.0), 0.0);
    }

    #[test]
    fn test_legacy_grad_factor_has_no_distance_term() {
        let p = LegacyPenalty::new(1.0f64);
        assert_eq!(p.grad_factor(0.0, 0.5), Some(-0.5));
        assert_eq!(p.grad_factor(0.9, 0.5), Some(-0.5));
        assert_eq!(p.grad_factor(1.0, 0.5), None);
    }

    #[test]
    fn test_euclidean_loss() {
        let p = EuclideanPenalty::new(2.0f64);
        assert_eq!(p.loss(1.0), 1.0);
        assert_eq!(p.loss(4.0), 0.0);
        assert_eq!(p.loss(9.0), 0.0);
        assert_relative_eq!(p.loss(0.25), 2.25);
    }

    #[test]
    fn test_euclidean_grad_factor_uses_epsilon() {
        let p = EuclideanPenalty::new(2.0f64);
        let beta = p.grad_factor(1.0, 0.5).unwrap();
        assert_eq!(beta, -0.5 * 1.0 / (1.0 + 1e-4));

        // Finite at zero distance.
        let beta = p.grad_factor(0.0, 1.0).unwrap();
        assert_eq!(beta, -2.0 / 1e-4);
        assert!(beta.is_finite());

        assert_eq!(p.grad_factor(4.0, 1.0), None);
    }

    #[test]
    fn test_nan_distance_is_not_hinged_away() {
        assert!(LegacyPenalty::new(1.0f64).loss(f64::NAN).is_nan());
        assert!(EuclideanPenalty::new(1.0f64).loss(f64::NAN).is_nan());
        assert!(LegacyPenalty::new(1.0f32).loss(f32::NAN).is_nan());
        assert_eq!(LegacyPenalty::new(1.0f64).grad_factor(f64::NAN, 1.0), None);
        assert_eq!(EuclideanPenalty::new(1.0f64).grad_factor(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_margin_gap() {
        assert_eq!(LegacyPenalty::new(1.0f64).margin_gap(0.25), 0.75);
        assert_eq!(EuclideanPenalty::new(1.0f64).margin_gap(0.25), 0.5);
    }
}
