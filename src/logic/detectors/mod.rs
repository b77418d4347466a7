//! Detector Set
//!
//! Three independent scoring functions over a FlowRecord, so that no
//! single heuristic dominates the verdict. Scored together through
//! `DetectorBank` under one lock: the temporal window must observe
//! records in ingestion order, and the seeded jitter sources are mutable.

pub mod classifier;
pub mod outlier;
pub mod temporal;
pub mod types;

pub use classifier::{Classifier, ClassifierConfig};
pub use outlier::{OutlierConfig, OutlierScorer};
pub use temporal::{TemporalConfig, TemporalScorer};
pub use types::{DetectorId, DetectorScore, DetectorSignals};

use crate::logic::flow::FlowRecord;

// ============================================================================
// DETECTOR BANK
// ============================================================================

/// The full detector set for one pipeline. Holds the only mutable
/// detector state (temporal window + jitter rngs); the pipeline wraps it
/// in a single mutex and locks once per record.
pub struct DetectorBank {
    outlier: OutlierScorer,
    temporal: TemporalScorer,
    classifier: Classifier,
}

impl DetectorBank {
    pub fn new(
        outlier: OutlierConfig,
        temporal: TemporalConfig,
        classifier: ClassifierConfig,
    ) -> Self {
        Self {
            outlier: OutlierScorer::new(outlier),
            temporal: TemporalScorer::new(temporal),
            classifier: Classifier::new(classifier),
        }
    }

    /// Seeded constructor so tests can pin every random term
    pub fn with_seed(
        outlier: OutlierConfig,
        temporal: TemporalConfig,
        classifier: ClassifierConfig,
        seed: u64,
    ) -> Self {
        Self {
            outlier: OutlierScorer::with_seed(outlier, seed),
            temporal: TemporalScorer::with_seed(temporal, seed.wrapping_add(1)),
            classifier: Classifier::with_seed(classifier, seed.wrapping_add(2)),
        }
    }

    /// Score one record with all three detectors. Never fails on
    /// validated input - every path yields a score.
    pub fn score_record(&mut self, record: &FlowRecord) -> DetectorSignals {
        DetectorSignals {
            outlier: self.outlier.score(record),
            temporal: self.temporal.observe(record),
            classifier: self.classifier.classify(record),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::flow::{validate, RawFlowRecord};

    #[test]
    fn test_bank_produces_all_three_signals() {
        let mut bank = DetectorBank::with_seed(
            OutlierConfig::default(),
            TemporalConfig::default(),
            ClassifierConfig::default(),
            5,
        );
        let record = validate(RawFlowRecord {
            source_addr: Some("10.0.0.1".to_string()),
            dest_addr: Some("192.168.1.5".to_string()),
            protocol: Some("tcp".to_string()),
            port: Some(443),
            payload_size: Some(500),
            ..Default::default()
        })
        .unwrap();

        let signals = bank.score_record(&record);
        assert_eq!(signals.outlier.detector, DetectorId::Outlier);
        assert_eq!(signals.temporal.detector, DetectorId::Temporal);
        assert_eq!(signals.classifier.detector, DetectorId::Classifier);
        assert!(signals.classifier.label.is_some());
    }
}
