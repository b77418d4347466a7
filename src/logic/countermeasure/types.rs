//! Countermeasure Types
//!
//! No logic here - just data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::ensemble::types::Severity;

// ============================================================================
// COUNTERMEASURE
// ============================================================================

/// Lifecycle status of a countermeasure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountermeasureStatus {
    /// Generated, waiting for human action
    Pending,
    /// Handed off automatically; not necessarily confirmed effective
    Deployed,
    /// Execution target reported success
    Successful,
    /// Execution target reported failure
    Failed,
}

impl CountermeasureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountermeasureStatus::Pending => "pending",
            CountermeasureStatus::Deployed => "deployed",
            CountermeasureStatus::Successful => "successful",
            CountermeasureStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CountermeasureStatus::Pending),
            "deployed" => Some(CountermeasureStatus::Deployed),
            "successful" => Some(CountermeasureStatus::Successful),
            "failed" => Some(CountermeasureStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CountermeasureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One remediation action tied to a verdict. Generator-owned at creation;
/// only the dispatcher (and later the execution target, via the store)
/// transitions its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countermeasure {
    pub id: Uuid,
    pub verdict_id: Uuid,
    /// Short imperative action name
    pub action: String,
    pub description: String,
    pub impact_summary: String,
    pub status: CountermeasureStatus,
    pub created_at: DateTime<Utc>,
    pub deployed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// ALERT PAYLOAD
// ============================================================================

/// Operator-facing alert emitted when countermeasures are dispatched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: i64,
    pub hostname: Option<String>,
    pub verdict_id: Uuid,
    pub category: String,
    pub actions: Vec<String>,
}

impl AlertPayload {
    pub fn new(title: &str, message: &str, severity: Severity, verdict_id: Uuid) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            timestamp: chrono::Utc::now().timestamp(),
            hostname: hostname::get().ok().map(|h| h.to_string_lossy().to_string()),
            verdict_id,
            category: String::new(),
            actions: Vec::new(),
        }
    }
}
