//! Contrastive loss parameters.

use serde::{Deserialize, Serialize};

use crate::error::TensorError;

/// Parameters of the contrastive loss.
///
/// Missing fields deserialize to their defaults, so `{}` is a valid
/// configuration.
///
/// # Example
///
/// ```
/// use ndcontrastive::ContrastiveLossConfig;
///
/// let config = ContrastiveLossConfig::default()
///     .with_margin(2.0)
///     .with_legacy_version(true);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.alpha_dissimilar, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastiveLossConfig {
    /// Distance beyond which dissimilar pairs stop contributing.
    pub margin: f64,
    /// Weight of the dissimilar-pair term.
    pub alpha_dissimilar: f64,
    /// Penalize `margin - d²` instead of `(margin - d)²`.
    pub legacy_version: bool,
}

impl Default for ContrastiveLossConfig {
    fn default() -> Self {
        Self {
            margin: 1.0,
            alpha_dissimilar: 1.0,
            legacy_version: false,
        }
    }
}

impl ContrastiveLossConfig {
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_alpha_dissimilar(mut self, alpha_dissimilar: f64) -> Self {
        self.alpha_dissimilar = alpha_dissimilar;
        self
    }

    pub fn with_legacy_version(mut self, legacy_version: bool) -> Self {
        self.legacy_version = legacy_version;
        self
    }

    /// Check that `margin` and `alpha_dissimilar` are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<(), TensorError> {
        check_positive("margin", self.margin)?;
        check_positive("alpha_dissimilar", self.alpha_dissimilar)
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), TensorError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TensorError::InvalidConfig {
            message: format!("{name} must be finite and positive, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContrastiveLossConfig::default();
        assert_eq!(config.margin, 1.0);
        assert_eq!(config.alpha_dissimilar, 1.0);
        assert!(!config.legacy_version);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ContrastiveLossConfig::default()
                .with_margin(bad)
                .validate()
                .unwrap_err();
            assert!(matches!(err, TensorError::InvalidConfig { .. }));

            let err = ContrastiveLossConfig::default()
                .with_alpha_dissimilar(bad)
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains("alpha_dissimilar"));
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ContrastiveLossConfig =
            serde_json::from_str(r#"{"margin": 0.5, "legacy_version": true}"#).unwrap();
        assert_eq!(
            config,
            ContrastiveLossConfig {
                margin: 0.5,
                alpha_dissimilar: 1.0,
                legacy_version: true,
            }
        );

        let empty: ContrastiveLossConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ContrastiveLossConfig::default());
    }

    #[test]
    fn test_serialize_field_names() {
        let json = serde_json::to_value(ContrastiveLossConfig::default()).unwrap();
        assert_eq!(json["margin"], 1.0);
        assert_eq!(json["alpha_dissimilar"], 1.0);
        assert_eq!(json["legacy_version"], false);
    }
}
