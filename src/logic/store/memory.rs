//! In-Memory Store
//!
//! Store implementation backed by process memory. Used by tests and as
//! the fallback when the SQLite store cannot be opened. Writes can be
//! forced to fail so the pipeline's logged-non-fatal path is testable.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use uuid::Uuid;

use super::{AnalysisStore, StoreError};
use crate::logic::countermeasure::types::{Countermeasure, CountermeasureStatus};
use crate::logic::ensemble::types::Verdict;
use crate::logic::flow::FlowRecord;

#[derive(Default)]
pub struct MemoryStore {
    flows: RwLock<Vec<FlowRecord>>,
    verdicts: RwLock<Vec<Verdict>>,
    countermeasures: RwLock<Vec<Countermeasure>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise failure handling
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn flow_count(&self) -> usize {
        self.flows.read().len()
    }

    pub fn verdict_count(&self) -> usize {
        self.verdicts.read().len()
    }

    pub fn countermeasure_count(&self) -> usize {
        self.countermeasures.read().len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Database("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl AnalysisStore for MemoryStore {
    fn save_flow(&self, record: &FlowRecord) -> Result<i64, StoreError> {
        self.check_writable()?;
        let mut flows = self.flows.write();
        flows.push(record.clone());
        Ok(flows.len() as i64)
    }

    fn save_verdict(&self, verdict: &Verdict) -> Result<i64, StoreError> {
        self.check_writable()?;
        let mut verdicts = self.verdicts.write();
        verdicts.push(verdict.clone());
        Ok(verdicts.len() as i64)
    }

    fn save_countermeasure(&self, countermeasure: &Countermeasure) -> Result<i64, StoreError> {
        self.check_writable()?;
        let mut countermeasures = self.countermeasures.write();
        countermeasures.push(countermeasure.clone());
        Ok(countermeasures.len() as i64)
    }

    fn update_countermeasure_status(
        &self,
        id: Uuid,
        status: CountermeasureStatus,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut countermeasures = self.countermeasures.write();
        let entry = countermeasures
            .iter_mut()
            .find(|cm| cm.id == id)
            .ok_or(StoreError::NotFound { id })?;
        entry.status = status;
        Ok(())
    }

    fn recent_verdicts(&self, limit: usize) -> Result<Vec<Verdict>, StoreError> {
        let verdicts = self.verdicts.read();
        let start = verdicts.len().saturating_sub(limit);
        let mut recent: Vec<Verdict> = verdicts[start..].to_vec();
        recent.reverse();
        Ok(recent)
    }

    fn countermeasures_for(&self, verdict_id: Uuid) -> Result<Vec<Countermeasure>, StoreError> {
        Ok(self
            .countermeasures
            .read()
            .iter()
            .filter(|cm| cm.verdict_id == verdict_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
