//! Enrichment Orchestrator
//!
//! Real-time path only: fans out to the reputation/geo/AI/port
//! collaborators for one flow, waits for every lookup to settle under its
//! own timeout, and folds whatever succeeded into a bounded confidence
//! contribution. A failed or slow lookup contributes nothing and never
//! blocks verdict production.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use super::providers::{AiAnalyzer, GeoLookup, PortExposureLookup, ReputationLookup};
use super::types::EnrichmentSignal;
use crate::constants;
use crate::logic::ensemble::types::ThreatCategory;
use crate::logic::flow::FlowRecord;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Added once when either address's reputation indicator clears the threshold
pub const REPUTATION_CONTRIBUTION: f64 = 0.25;

/// Added when the source address sits in a high-risk region
pub const GEO_CONTRIBUTION: f64 = 0.15;

/// Added when the port is suspicious-listed or reported open
pub const PORT_CONTRIBUTION: f64 = 0.10;

/// Scale applied to the AI threat-level estimate
pub const AI_SCALE: f64 = 0.30;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Per-lookup timeout (milliseconds)
    pub lookup_timeout_ms: u64,
    /// Reputation indicator at or above this contributes
    pub reputation_threshold: f64,
    pub reputation_contribution: f64,
    pub geo_contribution: f64,
    pub port_contribution: f64,
    pub ai_scale: f64,
    /// Upper bound on the total enrichment contribution
    pub cap: f64,
    /// ISO country codes treated as high-risk source regions
    pub high_risk_countries: Vec<String>,
    /// Ports whose mere presence is suspicious
    pub suspicious_ports: Vec<u16>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: constants::get_lookup_timeout_ms(),
            reputation_threshold: constants::DEFAULT_REPUTATION_THRESHOLD,
            reputation_contribution: REPUTATION_CONTRIBUTION,
            geo_contribution: GEO_CONTRIBUTION,
            port_contribution: PORT_CONTRIBUTION,
            ai_scale: AI_SCALE,
            cap: constants::DEFAULT_ENRICHMENT_CAP,
            high_risk_countries: vec![
                "KP".to_string(),
                "IR".to_string(),
                "SY".to_string(),
                "RU".to_string(),
                "BY".to_string(),
            ],
            suspicious_ports: vec![23, 445, 1433, 3389, 4444, 5900, 6667, 31337],
        }
    }
}

// ============================================================================
// ENRICHER SEAM
// ============================================================================

/// The pipeline's view of enrichment. Implemented by the orchestrator;
/// the batch path simply runs without one.
pub trait Enricher {
    fn enrich(
        &self,
        record: &FlowRecord,
    ) -> impl std::future::Future<Output = EnrichmentSignal> + Send;
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct EnrichmentOrchestrator<R, G, A, P> {
    reputation: R,
    geo: G,
    ai: A,
    ports: P,
    config: EnrichmentConfig,
}

impl<R, G, A, P> EnrichmentOrchestrator<R, G, A, P>
where
    R: ReputationLookup + Sync,
    G: GeoLookup + Sync,
    A: AiAnalyzer + Sync,
    P: PortExposureLookup + Sync,
{
    pub fn new(reputation: R, geo: G, ai: A, ports: P, config: EnrichmentConfig) -> Self {
        Self {
            reputation,
            geo,
            ai,
            ports,
            config,
        }
    }

    async fn run(&self, record: &FlowRecord) -> EnrichmentSignal {
        let per_lookup = Duration::from_millis(self.config.lookup_timeout_ms);
        let mut attempted = 5;
        let mut succeeded = 0;

        // All lookups run concurrently; each settles (value, error, or
        // timeout) independently. Dropping this future abandons them all.
        let (src_rep, dst_rep, src_geo, dst_geo, ai, exposure) = tokio::join!(
            timeout(per_lookup, self.reputation.reputation(record.source_addr)),
            timeout(per_lookup, self.reputation.reputation(record.dest_addr)),
            timeout(per_lookup, self.geo.geolocate(record.source_addr)),
            timeout(per_lookup, self.geo.geolocate(record.dest_addr)),
            timeout(per_lookup, self.ai.analyze(record)),
            async {
                match record.port {
                    Some(port) => Some(
                        timeout(per_lookup, self.ports.port_exposure(record.dest_addr, port))
                            .await,
                    ),
                    None => None,
                }
            },
        );

        let src_rep = settle("source reputation", src_rep, &mut succeeded);
        let dst_rep = settle("destination reputation", dst_rep, &mut succeeded);
        let src_geo = settle("source geolocation", src_geo, &mut succeeded);
        let dst_geo = settle("destination geolocation", dst_geo, &mut succeeded);
        let ai = settle("ai analysis", ai, &mut succeeded);
        let exposure = exposure.map(|result| {
            attempted += 1;
            settle("port exposure", result, &mut succeeded)
        });

        let mut signal = EnrichmentSignal {
            attempted,
            succeeded,
            degraded: succeeded == 0,
            ..Default::default()
        };

        // Reputation: fixed amount once, on whichever address is worse
        let worst_indicator = [&src_rep, &dst_rep]
            .into_iter()
            .flatten()
            .map(|r| r.malicious_indicator)
            .fold(f64::NEG_INFINITY, f64::max);
        if worst_indicator >= self.config.reputation_threshold {
            signal.score += self.config.reputation_contribution;
            signal.reasons.push(format!(
                "Reputation indicator {:.2} at or above {:.2}",
                worst_indicator, self.config.reputation_threshold
            ));
        }

        // Geography: source address in a high-risk region
        if let Some(geo) = &src_geo {
            if self.config.high_risk_countries.iter().any(|c| c == &geo.country) {
                signal.score += self.config.geo_contribution;
                signal
                    .reasons
                    .push(format!("Source region {} is high-risk", geo.country));
            }
        }
        if let Some(geo) = &dst_geo {
            log::debug!(
                "Destination {} geolocated to {}",
                record.dest_addr,
                geo.country
            );
        }

        // Port: suspicious-listed, or reported open by the exposure check
        if let Some(port) = record.port {
            let listed = self.config.suspicious_ports.contains(&port);
            let open = exposure
                .as_ref()
                .and_then(|e| e.as_ref())
                .map(|e| e.is_open)
                .unwrap_or(false);
            if listed || open {
                signal.score += self.config.port_contribution;
                signal.reasons.push(format!(
                    "Port {} flagged ({})",
                    port,
                    if listed { "suspicious list" } else { "exposed" }
                ));
            }
        }

        // AI analysis: scaled threat level, category eligible to override
        if let Some(ai) = &ai {
            let level = ai.threat_level.clamp(0.0, 1.0);
            signal.score += level * self.config.ai_scale;
            signal.ai_threat_level = Some(level);
            signal.ai_category = ai.category.as_deref().map(ThreatCategory::parse);
            if let Some(description) = &ai.description {
                signal.reasons.push(format!("AI analysis: {}", description));
            }
        }

        signal.score = signal.score.min(self.config.cap);
        signal
    }
}

impl<R, G, A, P> Enricher for EnrichmentOrchestrator<R, G, A, P>
where
    R: ReputationLookup + Sync,
    G: GeoLookup + Sync,
    A: AiAnalyzer + Sync,
    P: PortExposureLookup + Sync,
{
    async fn enrich(&self, record: &FlowRecord) -> EnrichmentSignal {
        self.run(record).await
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

/// Collapse a timed lookup into an optional value. Failure and timeout
/// are equivalent: no contribution, logged at low severity.
fn settle<T>(
    name: &str,
    result: Result<Result<T, super::types::LookupError>, tokio::time::error::Elapsed>,
    succeeded: &mut usize,
) -> Option<T> {
    match result {
        Ok(Ok(value)) => {
            *succeeded += 1;
            Some(value)
        }
        Ok(Err(e)) => {
            log::debug!("{} lookup failed: {}", name, e);
            None
        }
        Err(_) => {
            log::debug!("{} lookup timed out", name);
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
