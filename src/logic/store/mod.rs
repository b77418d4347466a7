//! Persistent Store
//!
//! Narrow persistence boundary for flows, verdicts and countermeasures.
//! The pipeline treats every write failure as a logged, non-fatal event;
//! retry policy, if any, belongs to the store side of the boundary.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use uuid::Uuid;

use crate::logic::countermeasure::types::{Countermeasure, CountermeasureStatus};
use crate::logic::ensemble::types::Verdict;
use crate::logic::flow::FlowRecord;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone)]
pub enum StoreError {
    /// Backend rejected or failed the operation
    Database(String),
    /// Payload could not be encoded/decoded
    Serialization(String),
    /// Referenced entity does not exist
    NotFound { id: Uuid },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::NotFound { id } => write!(f, "Not found: {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence capability consumed by the pipeline. The store serializes
/// its own writes; no cross-entity transactions are expected, so an
/// orphaned verdict with no countermeasures is a valid state.
pub trait AnalysisStore: Send + Sync {
    fn save_flow(&self, record: &FlowRecord) -> Result<i64, StoreError>;

    fn save_verdict(&self, verdict: &Verdict) -> Result<i64, StoreError>;

    fn save_countermeasure(&self, countermeasure: &Countermeasure) -> Result<i64, StoreError>;

    /// Outcome feedback from the execution target: deployed countermeasures
    /// move to successful/failed here, or stay deployed forever.
    fn update_countermeasure_status(
        &self,
        id: Uuid,
        status: CountermeasureStatus,
    ) -> Result<(), StoreError>;

    fn recent_verdicts(&self, limit: usize) -> Result<Vec<Verdict>, StoreError>;

    fn countermeasures_for(&self, verdict_id: Uuid) -> Result<Vec<Countermeasure>, StoreError>;
}
