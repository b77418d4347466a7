//! Temporal Scorer
//!
//! Sequence-style anomaly scoring over a bounded sliding window of recent
//! flows. For each record, the one-step-ahead prediction is the
//! noise-perturbed window baseline (last-value extrapolation smoothed over
//! the window); the score is the mean-squared deviation of the record's
//! feature vector from that prediction. Stationary traffic converges to
//! ~0; ramp-shaped traffic (a port sweep) drifts away from the lagging
//! baseline, so the error rises across the sequence.
//!
//! The window is the only mutable detector state in the pipeline. It is
//! owned by exactly one scorer instance and updated in ingestion order
//! under the detector-bank lock.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::{DetectorId, DetectorScore};
use crate::constants;
use crate::logic::flow::FlowRecord;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of features in the temporal vector
pub const FEATURE_COUNT: usize = 3;

/// Payload bytes per feature unit
pub const PAYLOAD_FEATURE_SCALE: f64 = 10_000.0;

/// Port number per feature unit
pub const PORT_FEATURE_SCALE: f64 = 1_000.0;

/// Upper bound of the prediction noise term
pub const PREDICTION_NOISE_MAX: f64 = 0.02;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// Sliding window length
    pub window: usize,
    /// Upper bound of the per-step prediction noise
    pub noise_max: f64,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            window: constants::DEFAULT_TEMPORAL_WINDOW,
            noise_max: PREDICTION_NOISE_MAX,
        }
    }
}

// ============================================================================
// FEATURES
// ============================================================================

/// Small numeric feature vector: scaled payload, scaled port, protocol code
pub fn feature_vector(record: &FlowRecord) -> [f64; FEATURE_COUNT] {
    [
        record.payload_bytes() as f64 / PAYLOAD_FEATURE_SCALE,
        record.port.map(|p| p as f64 / PORT_FEATURE_SCALE).unwrap_or(0.0),
        record.protocol.code() as f64,
    ]
}

// ============================================================================
// SCORER
// ============================================================================

pub struct TemporalScorer {
    config: TemporalConfig,
    window: VecDeque<[f64; FEATURE_COUNT]>,
    rng: StdRng,
}

impl TemporalScorer {
    pub fn new(config: TemporalConfig) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor so tests can pin the prediction noise
    pub fn with_seed(config: TemporalConfig, seed: u64) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window),
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Score one record and fold it into the window. Must be called in
    /// ingestion order.
    pub fn observe(&mut self, record: &FlowRecord) -> DetectorScore {
        let features = feature_vector(record);

        let score = if self.window.is_empty() {
            // No baseline yet, no signal
            0.0
        } else {
            let baseline = self.window_mean();
            let noise = self.rng.gen_range(0.0..self.config.noise_max);

            let mut error = 0.0;
            for i in 0..FEATURE_COUNT {
                let predicted = baseline[i] + noise;
                let deviation = features[i] - predicted;
                error += deviation * deviation;
            }
            error / FEATURE_COUNT as f64
        };

        self.window.push_back(features);
        while self.window.len() > self.config.window {
            self.window.pop_front();
        }

        DetectorScore {
            detector: DetectorId::Temporal,
            score,
            label: None,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    fn window_mean(&self) -> [f64; FEATURE_COUNT] {
        let mut mean = [0.0; FEATURE_COUNT];
        for entry in &self.window {
            for i in 0..FEATURE_COUNT {
                mean[i] += entry[i];
            }
        }
        let n = self.window.len() as f64;
        for value in &mut mean {
            *value /= n;
        }
        mean
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::flow::{validate, RawFlowRecord};

    fn record(protocol: &str, port: u16, payload: u64) -> FlowRecord {
        validate(RawFlowRecord {
            source_addr: Some("10.0.0.1".to_string()),
            dest_addr: Some("192.168.1.5".to_string()),
            protocol: Some(protocol.to_string()),
            port: Some(port),
            payload_size: Some(payload),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_empty_window_scores_zero() {
        let mut scorer = TemporalScorer::with_seed(TemporalConfig::default(), 1);
        let score = scorer.observe(&record("tcp", 443, 500));
        assert_eq!(score.score, 0.0);
    }

    #[test]
    fn test_stationary_traffic_stays_near_zero() {
        let mut scorer = TemporalScorer::with_seed(TemporalConfig::default(), 1);
        let r = record("tcp", 443, 500);
        let mut last = 0.0;
        for _ in 0..40 {
            last = scorer.observe(&r).score;
        }
        // Only the bounded noise term separates prediction from actual
        assert!(last < 0.01, "stationary error was {}", last);
    }

    #[test]
    fn test_payload_spike_elevates_error() {
        let mut scorer = TemporalScorer::with_seed(TemporalConfig::default(), 1);
        for _ in 0..30 {
            scorer.observe(&record("tcp", 443, 400));
        }
        let spike = scorer.observe(&record("udp", 80, 50_000)).score;
        assert!(spike > 1.0, "spike error was {}", spike);
    }

    #[test]
    fn test_port_sweep_error_increases_across_sequence() {
        let mut scorer = TemporalScorer::with_seed(TemporalConfig::default(), 1);
        let mut early = 0.0;
        let mut late = 0.0;
        for i in 0..60u16 {
            let score = scorer.observe(&record("tcp", 40_000 + i * 400, 0)).score;
            if i == 5 {
                early = score;
            }
            if i == 59 {
                late = score;
            }
        }
        assert!(late > early * 2.0, "early {} late {}", early, late);
    }

    #[test]
    fn test_window_is_bounded() {
        let config = TemporalConfig::default();
        let capacity = config.window;
        let mut scorer = TemporalScorer::with_seed(config, 1);
        for _ in 0..(capacity * 3) {
            scorer.observe(&record("tcp", 443, 500));
        }
        assert_eq!(scorer.window_len(), capacity);
    }
}
