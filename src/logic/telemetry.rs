//! Pipeline Telemetry
//!
//! Process-wide counters for the analysis pipeline. Cheap atomics,
//! written from any thread, snapshotted for the operator surface. This is
//! also where "enrichment degraded" becomes visible instead of the
//! pipeline silently pretending full confidence.

use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// COUNTERS
// ============================================================================

static FLOWS_PROCESSED: AtomicU64 = AtomicU64::new(0);
static VALIDATION_REJECTS: AtomicU64 = AtomicU64::new(0);
static VERDICTS_EMITTED: AtomicU64 = AtomicU64::new(0);
static ENRICHMENT_DEGRADED: AtomicU64 = AtomicU64::new(0);
static COUNTERMEASURES_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static STORE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn record_flow() {
    FLOWS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_validation_reject() {
    VALIDATION_REJECTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_verdict() {
    VERDICTS_EMITTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_enrichment_degraded() {
    ENRICHMENT_DEGRADED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dispatch(count: u64) {
    COUNTERMEASURES_DISPATCHED.fetch_add(count, Ordering::Relaxed);
}

pub fn record_store_failure() {
    STORE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, serde::Serialize)]
pub struct TelemetryStats {
    pub flows_processed: u64,
    pub validation_rejects: u64,
    pub verdicts_emitted: u64,
    pub enrichment_degraded: u64,
    pub countermeasures_dispatched: u64,
    pub store_failures: u64,
}

pub fn snapshot() -> TelemetryStats {
    TelemetryStats {
        flows_processed: FLOWS_PROCESSED.load(Ordering::Relaxed),
        validation_rejects: VALIDATION_REJECTS.load(Ordering::Relaxed),
        verdicts_emitted: VERDICTS_EMITTED.load(Ordering::Relaxed),
        enrichment_degraded: ENRICHMENT_DEGRADED.load(Ordering::Relaxed),
        countermeasures_dispatched: COUNTERMEASURES_DISPATCHED.load(Ordering::Relaxed),
        store_failures: STORE_FAILURES.load(Ordering::Relaxed),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        // Counters are process-wide and other tests run in parallel, so
        // only monotonicity is asserted
        let before = snapshot();
        record_flow();
        record_verdict();
        record_dispatch(2);
        let after = snapshot();
        assert!(after.flows_processed >= before.flows_processed + 1);
        assert!(after.verdicts_emitted >= before.verdicts_emitted + 1);
        assert!(after.countermeasures_dispatched >= before.countermeasures_dispatched + 2);
    }
}
