//! Detector Types
//!
//! No logic here - just data structures.

use serde::{Deserialize, Serialize};

use crate::logic::ensemble::types::ThreatCategory;

// ============================================================================
// DETECTOR IDENTITY
// ============================================================================

/// Identity of one detector in the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorId {
    Outlier,
    Temporal,
    Classifier,
}

impl DetectorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorId::Outlier => "outlier",
            DetectorId::Temporal => "temporal",
            DetectorId::Classifier => "classifier",
        }
    }
}

impl std::fmt::Display for DetectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DETECTOR SCORE
// ============================================================================

/// Output of one detector for one flow record. Created fresh per
/// invocation; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorScore {
    pub detector: DetectorId,
    /// Detector-defined range. Outlier and classifier emit [0,1]; the
    /// temporal scorer emits a raw reconstruction error the fuser
    /// normalizes against its own saturation constant.
    pub score: f64,
    /// Category label, set by classifier-style detectors only
    pub label: Option<ThreatCategory>,
}

/// The three per-record detector outputs, scored together under the
/// detector lock so the temporal window observes ingestion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorSignals {
    pub outlier: DetectorScore,
    pub temporal: DetectorScore,
    pub classifier: DetectorScore,
}
