//! Ensemble Fuser
//!
//! Combines the three detector scores (plus the optional enrichment
//! signal) into one Verdict. Only fusion logic here - types live in
//! `types.rs`, weights and thresholds in `rules.rs`.

use chrono::Utc;
use uuid::Uuid;

use super::rules::FusionConfig;
use super::types::{ScoreBreakdown, ThreatCategory, Verdict, VerdictStatus};
use crate::logic::detectors::DetectorSignals;
use crate::logic::enrichment::types::EnrichmentSignal;
use crate::logic::flow::FlowRecord;

// ============================================================================
// FUSION
// ============================================================================

/// Fuse detector signals into a verdict.
///
/// Returns None when the fused confidence does not strictly exceed the
/// detection threshold - below-threshold flows are discarded, not
/// materialized at reduced severity.
pub fn fuse(
    record: &FlowRecord,
    signals: &DetectorSignals,
    enrichment: Option<&EnrichmentSignal>,
    config: &FusionConfig,
) -> Option<Verdict> {
    let mut reasons = Vec::new();

    let outlier_contribution = signals.outlier.score.clamp(0.0, 1.0) * config.outlier_weight;

    // The temporal scorer emits a raw reconstruction error; anything at
    // or above the saturation point counts as fully elevated.
    let temporal_norm = (signals.temporal.score / config.temporal_saturation).clamp(0.0, 1.0);
    let temporal_contribution = temporal_norm * config.temporal_weight;

    let classifier_score = signals.classifier.score.clamp(0.0, 1.0);
    let classifier_contribution = classifier_score * config.classifier_weight;

    let enrichment_contribution = enrichment.map(|e| e.score).unwrap_or(0.0);

    let confidence = (outlier_contribution
        + temporal_contribution
        + classifier_contribution
        + enrichment_contribution)
        .clamp(0.0, 1.0);

    if confidence <= config.detection_threshold {
        return None;
    }

    reasons.push(format!(
        "Outlier {:.2}, temporal {:.2}, classifier {:.2} fused to {:.2}",
        signals.outlier.score, temporal_norm, classifier_score, confidence
    ));

    // Classifier owns the category unless the AI enrichment signal is
    // more confident about its own
    let mut threat_category = signals.classifier.label.unwrap_or(ThreatCategory::Unknown);
    if let Some(signal) = enrichment {
        if let (Some(category), Some(level)) = (signal.ai_category, signal.ai_threat_level) {
            if level > classifier_score {
                reasons.push(format!(
                    "AI analysis overrode category {} -> {} (level {:.2})",
                    threat_category, category, level
                ));
                threat_category = category;
            }
        }
        reasons.extend(signal.reasons.iter().cloned());
        if signal.degraded {
            reasons.push("Enrichment degraded: all collaborator lookups failed".to_string());
        }
    }

    let severity = config.severity_bands.classify(confidence);
    let status = if confidence > config.prediction_threshold {
        VerdictStatus::Predicted
    } else {
        VerdictStatus::Detected
    };

    reasons.push(format!("Severity {} ({})", severity, status.as_str()));

    Some(Verdict {
        id: Uuid::new_v4(),
        flow: record.clone(),
        threat_category,
        confidence,
        severity,
        status,
        rationale: reasons.join("; "),
        enrichment_degraded: enrichment.map(|e| e.degraded).unwrap_or(false),
        score_breakdown: ScoreBreakdown {
            outlier_contribution,
            temporal_contribution,
            classifier_contribution,
            enrichment_contribution,
            fused_confidence: confidence,
        },
        created_at: Utc::now(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detectors::{DetectorId, DetectorScore};
    use crate::logic::ensemble::types::Severity;
    use crate::logic::flow::{validate, RawFlowRecord};

    fn record() -> FlowRecord {
        validate(RawFlowRecord {
            source_addr: Some("10.0.0.1".to_string()),
            dest_addr: Some("192.168.1.5".to_string()),
            protocol: Some("tcp".to_string()),
            port: Some(443),
            payload_size: Some(500),
            ..Default::default()
        })
        .unwrap()
    }

    fn signals(outlier: f64, temporal_raw: f64, classifier: f64) -> DetectorSignals {
        DetectorSignals {
            outlier: DetectorScore {
                detector: DetectorId::Outlier,
                score: outlier,
                label: None,
            },
            temporal: DetectorScore {
                detector: DetectorId::Temporal,
                score: temporal_raw,
                label: None,
            },
            classifier: DetectorScore {
                detector: DetectorId::Classifier,
                score: classifier,
                label: Some(ThreatCategory::PortScan),
            },
        }
    }

    #[test]
    fn test_confidence_is_weighted_sum() {
        let config = FusionConfig::default();
        // Temporal raw 2.0 saturates to 1.0
        let verdict = fuse(&record(), &signals(1.0, 2.0, 1.0), None, &config).unwrap();
        assert!((verdict.confidence - 1.0).abs() < 1e-9);

        let verdict = fuse(&record(), &signals(1.0, 2.0, 0.0), None, &config).unwrap();
        assert!((verdict.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_verdict_at_exactly_threshold() {
        let config = FusionConfig::default();
        // Zero detector signal plus an enrichment contribution of exactly
        // 0.5: the detection boundary itself is excluded
        let enrichment = EnrichmentSignal {
            score: 0.5,
            attempted: 6,
            succeeded: 6,
            ..Default::default()
        };
        let s = signals(0.0, 0.0, 0.0);
        assert!(fuse(&record(), &s, Some(&enrichment), &config).is_none());

        let enrichment = EnrichmentSignal {
            score: 0.5 + 1e-6,
            attempted: 6,
            succeeded: 6,
            ..Default::default()
        };
        assert!(fuse(&record(), &s, Some(&enrichment), &config).is_some());
    }

    #[test]
    fn test_verdict_just_above_threshold() {
        let config = FusionConfig::default();
        let verdict = fuse(&record(), &signals(1.0, 0.0, 0.44), None, &config).unwrap();
        assert!(verdict.confidence > 0.5);
        assert_eq!(verdict.severity, Severity::Medium);
        assert_eq!(verdict.status, VerdictStatus::Detected);
    }

    #[test]
    fn test_predicted_status_above_high_confidence_threshold() {
        let config = FusionConfig::default();
        let verdict = fuse(&record(), &signals(1.0, 2.0, 0.9), None, &config).unwrap();
        assert!(verdict.confidence > 0.8);
        assert_eq!(verdict.status, VerdictStatus::Predicted);
    }

    #[test]
    fn test_severity_tracks_confidence_monotonically() {
        let config = FusionConfig::default();
        let mut last = Severity::Low;
        for step in 0..=20 {
            let classifier = step as f64 / 20.0;
            if let Some(v) = fuse(&record(), &signals(1.0, 2.0, classifier), None, &config) {
                assert!(v.severity >= last);
                last = v.severity;
            }
        }
        assert_eq!(last, Severity::Critical);
    }

    #[test]
    fn test_enrichment_pushes_subthreshold_flow_over_the_line() {
        let config = FusionConfig::default();
        // Detector-only confidence 0.4
        let s = signals(0.55, 0.0, 0.72);
        assert!(fuse(&record(), &s, None, &config).is_none());

        let enrichment = EnrichmentSignal {
            score: 0.25,
            attempted: 6,
            succeeded: 6,
            reasons: vec!["Source reputation 0.90 above threshold".to_string()],
            ..Default::default()
        };
        let verdict = fuse(&record(), &s, Some(&enrichment), &config).unwrap();
        assert!(verdict.confidence > 0.5);
        assert!(!verdict.enrichment_degraded);
        assert!(verdict.rationale.contains("reputation"));
    }

    #[test]
    fn test_degraded_enrichment_is_flagged() {
        let config = FusionConfig::default();
        let enrichment = EnrichmentSignal {
            degraded: true,
            attempted: 6,
            ..Default::default()
        };
        let verdict =
            fuse(&record(), &signals(1.0, 2.0, 1.0), Some(&enrichment), &config).unwrap();
        assert!(verdict.enrichment_degraded);
        assert!(verdict.rationale.contains("degraded"));
    }

    #[test]
    fn test_ai_category_override_requires_higher_confidence() {
        let config = FusionConfig::default();
        let mut enrichment = EnrichmentSignal {
            score: 0.1,
            ai_category: Some(ThreatCategory::Malware),
            ai_threat_level: Some(0.5),
            attempted: 6,
            succeeded: 6,
            ..Default::default()
        };

        // AI level below classifier score: classifier keeps the category
        let verdict =
            fuse(&record(), &signals(1.0, 2.0, 0.8), Some(&enrichment), &config).unwrap();
        assert_eq!(verdict.threat_category, ThreatCategory::PortScan);

        // AI level above classifier score: AI category wins
        enrichment.ai_threat_level = Some(0.95);
        let verdict =
            fuse(&record(), &signals(1.0, 2.0, 0.8), Some(&enrichment), &config).unwrap();
        assert_eq!(verdict.threat_category, ThreatCategory::Malware);
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        let config = FusionConfig::default();
        let enrichment = EnrichmentSignal {
            score: 0.35,
            attempted: 6,
            succeeded: 6,
            ..Default::default()
        };
        let verdict =
            fuse(&record(), &signals(1.0, 5.0, 1.0), Some(&enrichment), &config).unwrap();
        assert!(verdict.confidence <= 1.0);
    }
}
