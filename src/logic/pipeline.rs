//! Analysis Pipeline
//!
//! Wires the whole scoring-and-response path for one flow:
//! validate -> detect -> enrich (real-time path) -> fuse -> persist ->
//! generate + dispatch countermeasures.
//!
//! Detector scoring happens synchronously under one lock at ingestion, so
//! the temporal window always observes records in ingestion order even
//! when many flows are being analyzed concurrently. Enrichment awaits
//! happen outside that lock.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::logic::countermeasure::{generator, Dispatcher};
use crate::logic::detectors::DetectorBank;
use crate::logic::enrichment::types::EnrichmentSignal;
use crate::logic::enrichment::Enricher;
use crate::logic::ensemble;
use crate::logic::ensemble::types::Verdict;
use crate::logic::flow::{self, RawFlowRecord, ValidationError};
use crate::logic::store::AnalysisStore;
use crate::logic::telemetry;
use crate::logic::config::PipelineConfig;

// ============================================================================
// NO-ENRICHMENT PLACEHOLDER
// ============================================================================

/// Type placeholder for engines running the batch (detector-only) path
pub struct NoEnrichment;

impl Enricher for NoEnrichment {
    async fn enrich(&self, _record: &crate::logic::flow::FlowRecord) -> EnrichmentSignal {
        EnrichmentSignal::absent()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AnalysisEngine<E> {
    config: PipelineConfig,
    detectors: Mutex<DetectorBank>,
    enrichment: Option<E>,
    store: Arc<dyn AnalysisStore>,
    dispatcher: Dispatcher,
}

impl AnalysisEngine<NoEnrichment> {
    /// Batch path: detectors and fusion only, no external lookups
    pub fn detector_only(config: PipelineConfig, store: Arc<dyn AnalysisStore>) -> Self {
        let detectors = DetectorBank::new(
            config.outlier.clone(),
            config.temporal.clone(),
            config.classifier.clone(),
        );
        let dispatcher = Dispatcher::new(Arc::clone(&store), config.auto_deploy_threshold);
        Self {
            config,
            detectors: Mutex::new(detectors),
            enrichment: None,
            store,
            dispatcher,
        }
    }
}

impl<E: Enricher> AnalysisEngine<E> {
    /// Real-time path: enrichment runs before fusion
    pub fn with_enrichment(
        config: PipelineConfig,
        store: Arc<dyn AnalysisStore>,
        enricher: E,
    ) -> Self {
        let detectors = DetectorBank::new(
            config.outlier.clone(),
            config.temporal.clone(),
            config.classifier.clone(),
        );
        let dispatcher = Dispatcher::new(Arc::clone(&store), config.auto_deploy_threshold);
        Self {
            config,
            detectors: Mutex::new(detectors),
            enrichment: Some(enricher),
            store,
            dispatcher,
        }
    }

    /// Pin every random term, for reproducible tests
    pub fn seeded(mut self, seed: u64) -> Self {
        self.detectors = Mutex::new(DetectorBank::with_seed(
            self.config.outlier.clone(),
            self.config.temporal.clone(),
            self.config.classifier.clone(),
            seed,
        ));
        self
    }

    /// Analyze one flow record. The entry point of the whole core.
    ///
    /// Returns Ok(None) for flows whose fused confidence stays at or
    /// below the detection threshold; such flows are discarded, not
    /// materialized. Malformed records are rejected here and never
    /// scored.
    pub async fn analyze(&self, raw: RawFlowRecord) -> Result<Option<Verdict>, ValidationError> {
        let record = match flow::validate(raw) {
            Ok(record) => record,
            Err(e) => {
                telemetry::record_validation_reject();
                log::warn!("Rejected malformed flow record: {}", e);
                return Err(e);
            }
        };
        telemetry::record_flow();

        self.persist_flow(&record);

        // Detector scoring in ingestion order, under the single lock
        let signals = self.detectors.lock().score_record(&record);

        let enrichment = match &self.enrichment {
            Some(enricher) => {
                let signal = enricher.enrich(&record).await;
                if signal.degraded {
                    telemetry::record_enrichment_degraded();
                    log::warn!(
                        "Enrichment degraded for {} -> {}: all {} lookups failed",
                        record.source_addr,
                        record.dest_addr,
                        signal.attempted
                    );
                }
                Some(signal)
            }
            None => None,
        };

        let verdict = match ensemble::fuse(&record, &signals, enrichment.as_ref(), &self.config.fusion)
        {
            Some(verdict) => verdict,
            None => return Ok(None),
        };

        telemetry::record_verdict();
        log::info!(
            "Verdict {}: {} confidence {:.2} severity {} ({})",
            verdict.id,
            verdict.threat_category,
            verdict.confidence,
            verdict.severity,
            verdict.status.as_str()
        );

        self.persist_verdict(&verdict);

        if verdict.confidence > self.config.dispatch_threshold {
            let countermeasures = generator::generate(&verdict);
            self.dispatcher.dispatch(&verdict, countermeasures);
        }

        Ok(Some(verdict))
    }

    fn persist_flow(&self, record: &crate::logic::flow::FlowRecord) {
        let store = Arc::clone(&self.store);
        let entry = record.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = store.save_flow(&entry) {
                telemetry::record_store_failure();
                log::error!("Failed to persist flow from {}: {}", entry.source_addr, e);
            }
        });
    }

    fn persist_verdict(&self, verdict: &Verdict) {
        let store = Arc::clone(&self.store);
        let entry = verdict.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = store.save_verdict(&entry) {
                telemetry::record_store_failure();
                log::error!("Failed to persist verdict {}: {}", entry.id, e);
            }
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::countermeasure::CountermeasureStatus;
    use crate::logic::enrichment::types::{
        AiAnalysis, GeoInfo, LookupError, PortExposure, Reputation,
    };
    use crate::logic::enrichment::{
        AiAnalyzer, EnrichmentConfig, EnrichmentOrchestrator, GeoLookup, PortExposureLookup,
        ReputationLookup,
    };
    use crate::logic::ensemble::types::ThreatCategory;
    use crate::logic::store::MemoryStore;
    use std::net::IpAddr;

    fn raw(protocol: &str, port: Option<u16>, payload: Option<u64>) -> RawFlowRecord {
        RawFlowRecord {
            source_addr: Some("203.0.113.9".to_string()),
            dest_addr: Some("192.168.1.5".to_string()),
            protocol: Some(protocol.to_string()),
            port,
            payload_size: payload,
            ..Default::default()
        }
    }

    async fn settle_background_writes() {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    // Stub collaborators for the real-time path

    struct StubReputation {
        indicator: f64,
        fail: bool,
    }

    impl ReputationLookup for StubReputation {
        async fn reputation(&self, _addr: IpAddr) -> Result<Reputation, LookupError> {
            if self.fail {
                return Err(LookupError::Timeout);
            }
            Ok(Reputation {
                malicious_indicator: self.indicator,
                raw: None,
            })
        }
    }

    struct StubGeo {
        fail: bool,
    }

    impl GeoLookup for StubGeo {
        async fn geolocate(&self, _addr: IpAddr) -> Result<GeoInfo, LookupError> {
            if self.fail {
                return Err(LookupError::Timeout);
            }
            Ok(GeoInfo {
                country: "DE".to_string(),
                raw: None,
            })
        }
    }

    struct StubAi {
        fail: bool,
    }

    impl AiAnalyzer for StubAi {
        async fn analyze(
            &self,
            _record: &crate::logic::flow::FlowRecord,
        ) -> Result<AiAnalysis, LookupError> {
            if self.fail {
                return Err(LookupError::Timeout);
            }
            Ok(AiAnalysis {
                threat_level: 0.0,
                category: None,
                description: None,
            })
        }
    }

    struct StubPorts {
        fail: bool,
    }

    impl PortExposureLookup for StubPorts {
        async fn port_exposure(
            &self,
            _addr: IpAddr,
            _port: u16,
        ) -> Result<PortExposure, LookupError> {
            if self.fail {
                return Err(LookupError::Timeout);
            }
            Ok(PortExposure {
                is_open: false,
                services: vec![],
            })
        }
    }

    type StubOrchestrator = EnrichmentOrchestrator<StubReputation, StubGeo, StubAi, StubPorts>;

    fn stub_orchestrator(indicator: f64, all_fail: bool) -> StubOrchestrator {
        EnrichmentOrchestrator::new(
            StubReputation { indicator, fail: all_fail },
            StubGeo { fail: all_fail },
            StubAi { fail: all_fail },
            StubPorts { fail: all_fail },
            EnrichmentConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_malformed_record_rejected_before_detection() {
        let store = Arc::new(MemoryStore::new());
        let engine = AnalysisEngine::detector_only(PipelineConfig::default(), store);
        let result = engine
            .analyze(RawFlowRecord {
                source_addr: Some("10.0.0.1".to_string()),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_benign_traffic_produces_no_verdicts() {
        let store = Arc::new(MemoryStore::new());
        let engine =
            AnalysisEngine::detector_only(PipelineConfig::default(), store.clone()).seeded(11);
        for _ in 0..30 {
            let verdict = engine.analyze(raw("tcp", Some(443), Some(400))).await.unwrap();
            assert!(verdict.is_none());
        }
        settle_background_writes().await;
        assert_eq!(store.verdict_count(), 0);
        assert_eq!(store.flow_count(), 30);
    }

    /// End-to-end scenario: a massive UDP flood record after ordinary
    /// baseline traffic scores high and triggers rate limiting.
    #[tokio::test]
    async fn test_udp_flood_scores_high_and_rate_limits() {
        let store = Arc::new(MemoryStore::new());
        let engine =
            AnalysisEngine::detector_only(PipelineConfig::default(), store.clone()).seeded(11);

        for _ in 0..20 {
            engine.analyze(raw("tcp", Some(443), Some(400))).await.unwrap();
        }

        let verdict = engine
            .analyze(raw("udp", Some(80), Some(50_000)))
            .await
            .unwrap()
            .expect("flood record must materialize a verdict");

        assert!(verdict.confidence >= 0.7, "confidence {}", verdict.confidence);
        assert!(verdict.severity.is_high());
        assert_eq!(verdict.threat_category, ThreatCategory::Ddos);

        settle_background_writes().await;
        let countermeasures = store.countermeasures_for(verdict.id).unwrap();
        assert!(countermeasures
            .iter()
            .any(|cm| cm.action == "Rate Limiting Activation"));
    }

    /// End-to-end scenario: a sequential port sweep pushes the temporal
    /// error up until fused confidence crosses the detection threshold.
    #[tokio::test]
    async fn test_port_sweep_crosses_threshold_over_time() {
        let store = Arc::new(MemoryStore::new());
        let engine =
            AnalysisEngine::detector_only(PipelineConfig::default(), store.clone()).seeded(11);

        let mut verdicts = Vec::new();
        for i in 0..60u16 {
            let verdict = engine
                .analyze(raw("tcp", Some(40_000 + i * 400), Some(0)))
                .await
                .unwrap();
            verdicts.push(verdict);
        }

        assert!(verdicts[0].is_none());
        assert!(verdicts[1].is_none());
        assert!(verdicts[2].is_none());

        let last = verdicts.last().unwrap().as_ref().expect("sweep must be detected");
        assert!(last.confidence > 0.5);
        assert_eq!(last.threat_category, ThreatCategory::PortScan);
    }

    /// End-to-end scenario: detectors alone stay below threshold, but a
    /// malicious source reputation pushes the record over the line.
    #[tokio::test]
    async fn test_reputation_pushes_subthreshold_record_over_line() {
        let record = || raw("tcp", Some(40_000), Some(0));

        let detector_only = AnalysisEngine::detector_only(
            PipelineConfig::default(),
            Arc::new(MemoryStore::new()),
        )
        .seeded(11);
        assert!(detector_only.analyze(record()).await.unwrap().is_none());

        let store = Arc::new(MemoryStore::new());
        let enriched = AnalysisEngine::with_enrichment(
            PipelineConfig::default(),
            store,
            stub_orchestrator(0.9, false),
        )
        .seeded(11);
        let verdict = enriched
            .analyze(record())
            .await
            .unwrap()
            .expect("reputation must push the record over the threshold");
        assert!(verdict.confidence > 0.5);
        assert!(!verdict.enrichment_degraded);
    }

    /// End-to-end scenario: every collaborator down, verdict still
    /// produced from detectors alone and flagged degraded.
    #[tokio::test]
    async fn test_total_enrichment_outage_still_produces_degraded_verdict() {
        let store = Arc::new(MemoryStore::new());
        let engine = AnalysisEngine::with_enrichment(
            PipelineConfig::default(),
            store,
            stub_orchestrator(0.9, true),
        )
        .seeded(11);

        for _ in 0..20 {
            engine.analyze(raw("tcp", Some(443), Some(400))).await.unwrap();
        }
        let verdict = engine
            .analyze(raw("udp", Some(80), Some(50_000)))
            .await
            .unwrap()
            .expect("outage must not block detector-only verdicts");

        assert!(verdict.enrichment_degraded);
        assert!(verdict.confidence >= 0.7);
    }

    /// Auto-deploy boundary: 0.65 deploys, 0.55 stays pending.
    #[tokio::test]
    async fn test_auto_deploy_status_follows_confidence() {
        use crate::logic::ensemble::rules::FusionConfig;
        use crate::logic::ensemble::types::{ScoreBreakdown, Severity, VerdictStatus};
        use chrono::Utc;
        use uuid::Uuid;

        let flow = crate::logic::flow::validate(raw("udp", Some(80), Some(50_000))).unwrap();
        let make_verdict = |confidence: f64| Verdict {
            id: Uuid::new_v4(),
            flow: flow.clone(),
            threat_category: ThreatCategory::Ddos,
            confidence,
            severity: FusionConfig::default().severity_bands.classify(confidence),
            status: VerdictStatus::Detected,
            rationale: String::new(),
            enrichment_degraded: false,
            score_breakdown: ScoreBreakdown::default(),
            created_at: Utc::now(),
        };

        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store.clone(), 0.6);

        let high = make_verdict(0.65);
        let deployed = dispatcher.dispatch(&high, generator::generate(&high));
        assert!(deployed
            .iter()
            .all(|cm| cm.status == CountermeasureStatus::Deployed));
        assert_eq!(high.severity, Severity::Medium);

        let low = make_verdict(0.55);
        let pending = dispatcher.dispatch(&low, generator::generate(&low));
        assert!(pending
            .iter()
            .all(|cm| cm.status == CountermeasureStatus::Pending));
    }
}
