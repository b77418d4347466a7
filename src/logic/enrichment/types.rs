//! Enrichment Types
//!
//! Results from the external reputation/geo/AI/port collaborators, plus
//! the folded signal handed to the fuser. No logic here.

use serde::{Deserialize, Serialize};

use crate::logic::ensemble::types::ThreatCategory;

// ============================================================================
// LOOKUP RESULTS
// ============================================================================

/// Address reputation as reported by the reputation collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reputation {
    /// Malicious indicator in [0,1]; higher is worse
    pub malicious_indicator: f64,
    /// Provider payload kept for forensics
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

/// Geolocation as reported by the geolocation collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoInfo {
    /// ISO country code
    pub country: String,
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

/// AI log-analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    /// Threat level estimate in [0,1]
    pub threat_level: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Port exposure as reported by the port-exposure collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortExposure {
    pub is_open: bool,
    #[serde(default)]
    pub services: Vec<String>,
}

// ============================================================================
// ERRORS
// ============================================================================

/// A single collaborator lookup failing. Always non-fatal: the failed
/// lookup contributes nothing and the rest of enrichment proceeds.
#[derive(Debug, Clone)]
pub enum LookupError {
    /// Transport-level failure
    Network(String),
    /// Collaborator answered with a non-success status
    Status(u16),
    /// Collaborator answered with an unparseable body
    Parse(String),
    /// Per-lookup timeout elapsed
    Timeout,
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Network(e) => write!(f, "Network error: {}", e),
            LookupError::Status(code) => write!(f, "Collaborator error: {}", code),
            LookupError::Parse(e) => write!(f, "Parse error: {}", e),
            LookupError::Timeout => write!(f, "Lookup timed out"),
        }
    }
}

impl std::error::Error for LookupError {}

// ============================================================================
// FOLDED SIGNAL
// ============================================================================

/// The enrichment contribution for one flow after all lookups settled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentSignal {
    /// Bounded additive confidence contribution
    pub score: f64,
    /// AI-sourced category, eligible to override the classifier's
    pub ai_category: Option<ThreatCategory>,
    /// AI threat level backing the override decision
    pub ai_threat_level: Option<f64>,
    /// True when every attempted lookup failed
    pub degraded: bool,
    /// How many lookups were attempted / succeeded
    pub attempted: usize,
    pub succeeded: usize,
    /// Human-readable contribution notes for the verdict rationale
    pub reasons: Vec<String>,
}

impl EnrichmentSignal {
    /// Signal for a flow where enrichment never ran (batch path)
    pub fn absent() -> Self {
        Self::default()
    }
}
