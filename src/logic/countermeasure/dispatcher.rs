//! Countermeasure Dispatcher
//!
//! Sets the initial status of generated countermeasures and hands them to
//! the store. "Deployed" means handed off automatically, not confirmed
//! effective; outcome feedback arrives later through the store, if at
//! all. Persistence is fire-and-forget so one slow or failing write never
//! blocks verdict production for other flows.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::types::{AlertPayload, Countermeasure, CountermeasureStatus};
use crate::logic::ensemble::types::Verdict;
use crate::logic::store::AnalysisStore;
use crate::logic::telemetry;

// ============================================================================
// STATE
// ============================================================================

static DISPATCH_HISTORY: Lazy<RwLock<Vec<Countermeasure>>> =
    Lazy::new(|| RwLock::new(Vec::new()));

const MAX_HISTORY: usize = 500;

fn record_history(entries: &[Countermeasure]) {
    let mut history = DISPATCH_HISTORY.write();
    history.extend_from_slice(entries);

    // Trim if too large
    let current_len = history.len();
    if current_len > MAX_HISTORY {
        history.drain(0..current_len - MAX_HISTORY);
    }
}

/// Recently dispatched countermeasures, newest last
pub fn dispatch_history(limit: usize) -> Vec<Countermeasure> {
    let history = DISPATCH_HISTORY.read();
    let start = history.len().saturating_sub(limit);
    history[start..].to_vec()
}

// ============================================================================
// DISPATCHER
// ============================================================================

pub struct Dispatcher {
    store: Arc<dyn AnalysisStore>,
    auto_deploy_threshold: f64,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn AnalysisStore>, auto_deploy_threshold: f64) -> Self {
        Self {
            store,
            auto_deploy_threshold,
        }
    }

    /// Dispatch countermeasures for a verdict: mark deployed or pending
    /// based on the auto-deploy threshold, persist each one in the
    /// background, and emit an operator alert.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(
        &self,
        verdict: &Verdict,
        mut countermeasures: Vec<Countermeasure>,
    ) -> Vec<Countermeasure> {
        let auto_deploy = verdict.confidence >= self.auto_deploy_threshold;

        for countermeasure in &mut countermeasures {
            if auto_deploy {
                countermeasure.status = CountermeasureStatus::Deployed;
                countermeasure.deployed_at = Some(Utc::now());
            }
        }

        for countermeasure in &countermeasures {
            let store = Arc::clone(&self.store);
            let entry = countermeasure.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = store.save_countermeasure(&entry) {
                    telemetry::record_store_failure();
                    log::error!(
                        "Failed to persist countermeasure {} ({}): {}",
                        entry.id,
                        entry.action,
                        e
                    );
                }
            });
        }

        let alert = self.build_alert(verdict, &countermeasures);
        log::warn!(
            "[{}] {} - {} countermeasure(s) {}",
            alert.severity.as_str().to_uppercase(),
            alert.title,
            countermeasures.len(),
            if auto_deploy { "deployed" } else { "pending approval" }
        );

        telemetry::record_dispatch(countermeasures.len() as u64);
        record_history(&countermeasures);
        countermeasures
    }

    fn build_alert(&self, verdict: &Verdict, countermeasures: &[Countermeasure]) -> AlertPayload {
        let title = format!("{} traffic from {}", verdict.threat_category, verdict.flow.source_addr);
        let mut alert = AlertPayload::new(&title, &verdict.rationale, verdict.severity, verdict.id);
        alert.category = verdict.threat_category.as_str().to_string();
        alert.actions = countermeasures.iter().map(|cm| cm.action.clone()).collect();
        alert
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::countermeasure::generator;
    use crate::logic::ensemble::types::{
        ScoreBreakdown, Severity, ThreatCategory, VerdictStatus,
    };
    use crate::logic::flow::{validate, RawFlowRecord};
    use crate::logic::store::MemoryStore;
    use uuid::Uuid;

    fn verdict(confidence: f64) -> Verdict {
        let flow = validate(RawFlowRecord {
            source_addr: Some("10.0.0.1".to_string()),
            dest_addr: Some("192.168.1.5".to_string()),
            protocol: Some("udp".to_string()),
            ..Default::default()
        })
        .unwrap();
        Verdict {
            id: Uuid::new_v4(),
            flow,
            threat_category: ThreatCategory::Ddos,
            confidence,
            severity: Severity::Medium,
            status: VerdictStatus::Detected,
            rationale: "test".to_string(),
            enrichment_degraded: false,
            score_breakdown: ScoreBreakdown::default(),
            created_at: Utc::now(),
        }
    }

    async fn settle_background_writes() {
        // spawn_blocking work finishes promptly; yield long enough for it
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_confidence_above_auto_deploy_is_deployed() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store.clone(), 0.6);
        let v = verdict(0.65);

        let dispatched = dispatcher.dispatch(&v, generator::generate(&v));
        for cm in &dispatched {
            assert_eq!(cm.status, CountermeasureStatus::Deployed);
            assert!(cm.deployed_at.is_some());
        }

        settle_background_writes().await;
        assert_eq!(store.countermeasure_count(), dispatched.len());
    }

    #[tokio::test]
    async fn test_confidence_below_auto_deploy_stays_pending() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store.clone(), 0.6);
        let v = verdict(0.55);

        let dispatched = dispatcher.dispatch(&v, generator::generate(&v));
        for cm in &dispatched {
            assert_eq!(cm.status, CountermeasureStatus::Pending);
            assert!(cm.deployed_at.is_none());
        }
    }

    #[tokio::test]
    async fn test_confidence_exactly_at_threshold_deploys() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store, 0.6);
        let v = verdict(0.6);

        let dispatched = dispatcher.dispatch(&v, generator::generate(&v));
        assert!(dispatched
            .iter()
            .all(|cm| cm.status == CountermeasureStatus::Deployed));
    }

    #[tokio::test]
    async fn test_dispatch_is_recorded_in_history() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store, 0.6);
        let v = verdict(0.9);

        let dispatched = dispatcher.dispatch(&v, generator::generate(&v));
        let history = dispatch_history(MAX_HISTORY);
        for cm in &dispatched {
            assert!(history.iter().any(|h| h.id == cm.id));
        }
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_dispatch() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let dispatcher = Dispatcher::new(store.clone(), 0.6);
        let v = verdict(0.9);

        let dispatched = dispatcher.dispatch(&v, generator::generate(&v));
        assert!(!dispatched.is_empty());

        settle_background_writes().await;
        assert_eq!(store.countermeasure_count(), 0);
    }
}
