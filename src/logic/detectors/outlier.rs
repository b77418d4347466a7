//! Outlier Scorer
//!
//! Isolation-style anomaly scoring for a single flow record: a seeded
//! jitter term modelling baseline noise, plus additive contributions gated
//! by feature thresholds. Pure function of the record apart from the
//! explicit jitter source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::{DetectorId, DetectorScore};
use crate::constants;
use crate::logic::flow::FlowRecord;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Jitter band modelling natural baseline noise
pub const JITTER_MIN: f64 = 0.05;
pub const JITTER_MAX: f64 = 0.20;

/// Added when payload size exceeds the configured byte threshold
pub const PAYLOAD_INCREMENT: f64 = 0.45;

/// Added when the port falls inside the unusual/ephemeral range
pub const PORT_INCREMENT: f64 = 0.20;

/// Scale applied to the protocol risk weight
pub const PROTOCOL_SCALE: f64 = 1.0;

// ============================================================================
// CONFIG
// ============================================================================

/// Outlier scorer knobs (configurable policy, not hard-coded law)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    pub payload_threshold: u64,
    pub unusual_port_min: u16,
    pub unusual_port_max: u16,
    pub jitter_min: f64,
    pub jitter_max: f64,
    pub payload_increment: f64,
    pub port_increment: f64,
    pub protocol_scale: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            payload_threshold: constants::DEFAULT_PAYLOAD_THRESHOLD,
            unusual_port_min: constants::DEFAULT_UNUSUAL_PORT_MIN,
            unusual_port_max: constants::DEFAULT_UNUSUAL_PORT_MAX,
            jitter_min: JITTER_MIN,
            jitter_max: JITTER_MAX,
            payload_increment: PAYLOAD_INCREMENT,
            port_increment: PORT_INCREMENT,
            protocol_scale: PROTOCOL_SCALE,
        }
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Deterministic part of the outlier score: the sum of gated feature
/// contributions, without jitter. For payloads at or below the threshold
/// on a common protocol and port this is exactly zero.
pub fn feature_contribution(record: &FlowRecord, config: &OutlierConfig) -> f64 {
    let mut contribution = 0.0;

    if record.payload_bytes() > config.payload_threshold {
        contribution += config.payload_increment;
    }

    if let Some(port) = record.port {
        if port >= config.unusual_port_min && port <= config.unusual_port_max {
            contribution += config.port_increment;
        }
    }

    contribution += record.protocol.risk_weight() * config.protocol_scale;

    contribution
}

/// Outlier scorer. Stateless apart from the injectable jitter source.
pub struct OutlierScorer {
    config: OutlierConfig,
    rng: StdRng,
}

impl OutlierScorer {
    pub fn new(config: OutlierConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor so tests can pin the jitter term
    pub fn with_seed(config: OutlierConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn score(&mut self, record: &FlowRecord) -> DetectorScore {
        let jitter = self.rng.gen_range(self.config.jitter_min..self.config.jitter_max);
        let score = (jitter + feature_contribution(record, &self.config)).clamp(0.0, 1.0);

        DetectorScore {
            detector: DetectorId::Outlier,
            score,
            label: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::flow::{validate, Protocol, RawFlowRecord};

    fn record(protocol: &str, port: Option<u16>, payload: Option<u64>) -> FlowRecord {
        validate(RawFlowRecord {
            source_addr: Some("10.0.0.1".to_string()),
            dest_addr: Some("192.168.1.5".to_string()),
            protocol: Some(protocol.to_string()),
            port,
            payload_size: payload,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_benign_record_has_zero_feature_contribution() {
        let config = OutlierConfig::default();
        let r = record("tcp", Some(443), Some(500));
        assert_eq!(feature_contribution(&r, &config), 0.0);
    }

    #[test]
    fn test_payload_at_threshold_contributes_nothing() {
        let config = OutlierConfig::default();
        let r = record("https", Some(443), Some(config.payload_threshold));
        assert_eq!(feature_contribution(&r, &config), 0.0);
    }

    #[test]
    fn test_large_payload_adds_increment() {
        let config = OutlierConfig::default();
        let r = record("tcp", Some(443), Some(config.payload_threshold + 1));
        assert!((feature_contribution(&r, &config) - config.payload_increment).abs() < 1e-9);
    }

    #[test]
    fn test_unusual_port_adds_increment() {
        let config = OutlierConfig::default();
        let r = record("tcp", Some(40_000), Some(100));
        assert!((feature_contribution(&r, &config) - config.port_increment).abs() < 1e-9);
    }

    #[test]
    fn test_protocol_risk_ordering() {
        assert!(Protocol::Tcp.risk_weight() < Protocol::Udp.risk_weight());
        assert!(Protocol::Udp.risk_weight() < Protocol::Other.risk_weight());
    }

    #[test]
    fn test_score_stays_in_unit_range() {
        let config = OutlierConfig::default();
        let mut scorer = OutlierScorer::with_seed(config, 7);
        let r = record("other", Some(40_000), Some(1_000_000));
        for _ in 0..50 {
            let s = scorer.score(&r).score;
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let r = record("tcp", Some(443), Some(100));
        let a: Vec<f64> = {
            let mut s = OutlierScorer::with_seed(OutlierConfig::default(), 42);
            (0..5).map(|_| s.score(&r).score).collect()
        };
        let b: Vec<f64> = {
            let mut s = OutlierScorer::with_seed(OutlierConfig::default(), 42);
            (0..5).map(|_| s.score(&r).score).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_jitter_bounded_for_benign_record() {
        let config = OutlierConfig::default();
        let mut scorer = OutlierScorer::with_seed(config.clone(), 3);
        let r = record("tcp", Some(443), Some(100));
        for _ in 0..100 {
            let s = scorer.score(&r).score;
            assert!(s >= config.jitter_min && s < config.jitter_max);
        }
    }
}
