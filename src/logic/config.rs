//! Pipeline Configuration
//!
//! Aggregates every tuning knob of the pipeline and validates the
//! combination once at startup. Validation failures are fatal: the
//! pipeline refuses to process records rather than produce undefined
//! severities.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::detectors::{ClassifierConfig, OutlierConfig, TemporalConfig};
use crate::logic::enrichment::EnrichmentConfig;
use crate::logic::ensemble::FusionConfig;

// ============================================================================
// ERRORS
// ============================================================================

/// Fatal startup configuration error
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Ensemble weights must sum to 1.0 within epsilon
    WeightsDoNotSumToOne { sum: f64 },
    /// A threshold left the [0,1] range (or a scale went non-positive)
    ThresholdOutOfRange { name: &'static str, value: f64 },
    /// Severity bands must be strictly increasing
    SeverityBandsUnordered {
        medium: f64,
        high: f64,
        critical: f64,
    },
    /// A (min, max) pair is inverted or empty
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::WeightsDoNotSumToOne { sum } => {
                write!(f, "Ensemble weights sum to {} (must be 1.0)", sum)
            }
            ConfigError::ThresholdOutOfRange { name, value } => {
                write!(f, "Threshold {} = {} is out of range", name, value)
            }
            ConfigError::SeverityBandsUnordered {
                medium,
                high,
                critical,
            } => write!(
                f,
                "Severity bands not strictly ordered: medium {} high {} critical {}",
                medium, high, critical
            ),
            ConfigError::InvalidRange { name, min, max } => {
                write!(f, "Range {} = [{}, {}] is invalid", name, min, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub fusion: FusionConfig,
    pub outlier: OutlierConfig,
    pub temporal: TemporalConfig,
    pub classifier: ClassifierConfig,
    pub enrichment: EnrichmentConfig,
    /// Minimum confidence before countermeasures are generated at all
    pub dispatch_threshold: f64,
    /// Confidence at or above this auto-deploys countermeasures
    pub auto_deploy_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            outlier: OutlierConfig::default(),
            temporal: TemporalConfig::default(),
            classifier: ClassifierConfig::default(),
            enrichment: EnrichmentConfig::default(),
            dispatch_threshold: constants::DEFAULT_DISPATCH_THRESHOLD,
            auto_deploy_threshold: constants::DEFAULT_AUTO_DEPLOY_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.fusion.detection_threshold = constants::get_detection_threshold();
        config.auto_deploy_threshold = constants::get_auto_deploy_threshold();
        config.enrichment.lookup_timeout_ms = constants::get_lookup_timeout_ms();
        config
    }

    /// Startup validation of the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fusion.validate()?;

        for (name, value) in [
            ("dispatch_threshold", self.dispatch_threshold),
            ("auto_deploy_threshold", self.auto_deploy_threshold),
            ("enrichment.cap", self.enrichment.cap),
            (
                "enrichment.reputation_threshold",
                self.enrichment.reputation_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.outlier.jitter_min >= self.outlier.jitter_max {
            return Err(ConfigError::InvalidRange {
                name: "outlier.jitter",
                min: self.outlier.jitter_min,
                max: self.outlier.jitter_max,
            });
        }
        if self.outlier.unusual_port_min > self.outlier.unusual_port_max {
            return Err(ConfigError::InvalidRange {
                name: "outlier.unusual_port",
                min: self.outlier.unusual_port_min as f64,
                max: self.outlier.unusual_port_max as f64,
            });
        }
        if self.temporal.window == 0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "temporal.window",
                value: 0.0,
            });
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_weights_propagate() {
        let mut config = PipelineConfig::default();
        config.fusion.temporal_weight = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn test_dispatch_threshold_out_of_range_rejected() {
        let config = PipelineConfig {
            dispatch_threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { name: "dispatch_threshold", .. })
        ));
    }

    #[test]
    fn test_inverted_jitter_band_rejected() {
        let mut config = PipelineConfig::default();
        config.outlier.jitter_min = 0.5;
        config.outlier.jitter_max = 0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { name: "outlier.jitter", .. })
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = PipelineConfig::default();
        config.temporal.window = 0;
        assert!(config.validate().is_err());
    }
}
