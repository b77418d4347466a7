//! Verdict Types
//!
//! Core types for fused threat verdicts.
//! No logic here - just data structures and their accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::flow::FlowRecord;

// ============================================================================
// THREAT CATEGORY
// ============================================================================

/// Named threat category carried by a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatCategory {
    Ddos,
    PortScan,
    Malware,
    Phishing,
    Intrusion,
    DataExfiltration,
    Unknown,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::Ddos => "ddos",
            ThreatCategory::PortScan => "port_scan",
            ThreatCategory::Malware => "malware",
            ThreatCategory::Phishing => "phishing",
            ThreatCategory::Intrusion => "intrusion",
            ThreatCategory::DataExfiltration => "data_exfiltration",
            ThreatCategory::Unknown => "unknown",
        }
    }

    /// Fixed tie-break priority. Higher wins when fused confidences are
    /// equal, keeping verdict output deterministic.
    pub fn priority(&self) -> u8 {
        match self {
            ThreatCategory::DataExfiltration => 6,
            ThreatCategory::Malware => 5,
            ThreatCategory::Intrusion => 4,
            ThreatCategory::Ddos => 3,
            ThreatCategory::PortScan => 2,
            ThreatCategory::Phishing => 1,
            ThreatCategory::Unknown => 0,
        }
    }

    /// Parse an enrichment-sourced category string. Unrecognized values
    /// collapse to Unknown so downstream vocabulary stays closed.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ddos" | "dos" => ThreatCategory::Ddos,
            "port_scan" | "portscan" | "scan" => ThreatCategory::PortScan,
            "malware" => ThreatCategory::Malware,
            "phishing" => ThreatCategory::Phishing,
            "intrusion" => ThreatCategory::Intrusion,
            "data_exfiltration" | "exfiltration" => ThreatCategory::DataExfiltration,
            _ => ThreatCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity of a verdict, derived from confidence alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT STATUS
// ============================================================================

/// Whether the verdict reports an observed or an anticipated attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    /// Confidence in the detection band
    Detected,
    /// Confidence above the high-confidence threshold: the system believes
    /// this precedes an active attack rather than confirming one
    Predicted,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Detected => "detected",
            VerdictStatus::Predicted => "predicted",
        }
    }
}

// ============================================================================
// SCORE BREAKDOWN
// ============================================================================

/// Breakdown of how the fused confidence was calculated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub outlier_contribution: f64,
    pub temporal_contribution: f64,
    pub classifier_contribution: f64,
    pub enrichment_contribution: f64,
    pub fused_confidence: f64,
}

// ============================================================================
// VERDICT
// ============================================================================

/// Fused decision for one flow. Created by the fuser, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub id: Uuid,
    pub flow: FlowRecord,
    pub threat_category: ThreatCategory,
    pub confidence: f64,
    pub severity: Severity,
    pub status: VerdictStatus,
    pub rationale: String,
    /// True when the real-time path ran with zero successful enrichment
    /// lookups, so this verdict is detector-only
    pub enrichment_degraded: bool,
    pub score_breakdown: ScoreBreakdown,
    pub created_at: DateTime<Utc>,
}
