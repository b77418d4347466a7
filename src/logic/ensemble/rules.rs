//! Fusion Rules & Thresholds
//!
//! Weights and thresholds for the ensemble fuser. Changing them is a
//! configuration change, not a code change; invalid combinations are
//! rejected at startup before any record is processed.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::config::ConfigError;
use crate::logic::ensemble::types::Severity;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Weight-sum tolerance
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Temporal reconstruction errors at or above this count as fully elevated
pub const TEMPORAL_SATURATION: f64 = 2.0;

// ============================================================================
// SEVERITY BANDS
// ============================================================================

/// Inclusive lower bounds of the medium/high/critical severity bands.
/// Everything below `medium` is Low, so the four bands partition [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityBands {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

impl SeverityBands {
    pub fn classify(&self, confidence: f64) -> Severity {
        if confidence >= self.critical {
            Severity::Critical
        } else if confidence >= self.high {
            Severity::High
        } else if confidence >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("severity.medium", self.medium),
            ("severity.high", self.high),
            ("severity.critical", self.critical),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if !(self.medium < self.high && self.high < self.critical) {
            return Err(ConfigError::SeverityBandsUnordered {
                medium: self.medium,
                high: self.high,
                critical: self.critical,
            });
        }
        Ok(())
    }
}

// ============================================================================
// FUSION CONFIG
// ============================================================================

/// Ensemble fuser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Weight of the outlier scorer
    pub outlier_weight: f64,
    /// Weight of the temporal scorer
    pub temporal_weight: f64,
    /// Weight of the classifier
    pub classifier_weight: f64,
    /// Confidence must be strictly above this to materialize a verdict
    pub detection_threshold: f64,
    /// Confidence strictly above this marks the verdict Predicted
    pub prediction_threshold: f64,
    /// Raw temporal error mapped onto [0,1] against this saturation point
    pub temporal_saturation: f64,
    pub severity_bands: SeverityBands,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            outlier_weight: constants::DEFAULT_OUTLIER_WEIGHT,
            temporal_weight: constants::DEFAULT_TEMPORAL_WEIGHT,
            classifier_weight: constants::DEFAULT_CLASSIFIER_WEIGHT,
            detection_threshold: constants::DEFAULT_DETECTION_THRESHOLD,
            prediction_threshold: constants::DEFAULT_PREDICTION_THRESHOLD,
            temporal_saturation: TEMPORAL_SATURATION,
            severity_bands: SeverityBands::default(),
        }
    }
}

impl FusionConfig {
    /// High sensitivity - lower detection bar, more verdicts
    pub fn high_sensitivity() -> Self {
        Self {
            detection_threshold: 0.4,
            prediction_threshold: 0.7,
            ..Default::default()
        }
    }

    /// Low sensitivity - higher detection bar, fewer verdicts
    pub fn low_sensitivity() -> Self {
        Self {
            detection_threshold: 0.6,
            prediction_threshold: 0.9,
            ..Default::default()
        }
    }

    /// Startup validation. Violations are fatal: the pipeline must refuse
    /// to run rather than produce undefined severities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.outlier_weight + self.temporal_weight + self.classifier_weight;
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        for (name, value) in [
            ("outlier_weight", self.outlier_weight),
            ("temporal_weight", self.temporal_weight),
            ("classifier_weight", self.classifier_weight),
            ("detection_threshold", self.detection_threshold),
            ("prediction_threshold", self.prediction_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.temporal_saturation <= 0.0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "temporal_saturation",
                value: self.temporal_saturation,
            });
        }
        self.severity_bands.validate()
    }
}

// ============================================================================
// TESTS
// ============================================================================
