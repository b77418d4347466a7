//! Rule-Table Classifier
//!
//! Supervised-style category scoring for a single flow record. Each
//! candidate threat category gets a bounded random base term plus fixed
//! rule increments on a 0-100 scale; the top category wins (priority
//! tie-break) and its score converts to [0,1] for ensembling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::{DetectorId, DetectorScore};
use crate::constants;
use crate::logic::ensemble::types::ThreatCategory;
use crate::logic::flow::{FlowRecord, Protocol};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Upper bound of the random base term (0-100 scale)
pub const BASE_NOISE_MAX: f64 = 15.0;

/// Rule increment: large payload over UDP favors DDoS
pub const DDOS_RULE_SCORE: f64 = 85.0;

/// Rule increment: unusual/ephemeral port over TCP favors PortScan
pub const PORT_SCAN_RULE_SCORE: f64 = 80.0;

/// Rule increment: large payload over an uncommon protocol favors Malware
pub const MALWARE_RULE_SCORE: f64 = 75.0;

/// Rule increment: flagged URL attribute over web protocols favors Phishing
pub const PHISHING_RULE_SCORE: f64 = 70.0;

/// Rule increment: repeated auth failures favor Intrusion
pub const INTRUSION_RULE_SCORE: f64 = 75.0;

/// Rule increment: large outbound payload favors DataExfiltration
pub const EXFIL_RULE_SCORE: f64 = 92.0;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub payload_threshold: u64,
    pub unusual_port_min: u16,
    pub unusual_port_max: u16,
    pub base_noise_max: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            payload_threshold: constants::DEFAULT_PAYLOAD_THRESHOLD,
            unusual_port_min: constants::DEFAULT_UNUSUAL_PORT_MIN,
            unusual_port_max: constants::DEFAULT_UNUSUAL_PORT_MAX,
            base_noise_max: BASE_NOISE_MAX,
        }
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

const CANDIDATES: [ThreatCategory; 7] = [
    ThreatCategory::Ddos,
    ThreatCategory::PortScan,
    ThreatCategory::Malware,
    ThreatCategory::Phishing,
    ThreatCategory::Intrusion,
    ThreatCategory::DataExfiltration,
    ThreatCategory::Unknown,
];

/// Fixed rule increment for one category, on the 0-100 scale
fn rule_score(category: ThreatCategory, record: &FlowRecord, config: &ClassifierConfig) -> f64 {
    let large_payload = record.payload_bytes() > config.payload_threshold;
    let unusual_port = record
        .port
        .map(|p| p >= config.unusual_port_min && p <= config.unusual_port_max)
        .unwrap_or(false);

    match category {
        ThreatCategory::Ddos => {
            if large_payload && record.protocol == Protocol::Udp {
                DDOS_RULE_SCORE
            } else {
                0.0
            }
        }
        ThreatCategory::PortScan => {
            if unusual_port && record.protocol == Protocol::Tcp {
                PORT_SCAN_RULE_SCORE
            } else {
                0.0
            }
        }
        ThreatCategory::Malware => {
            let uncommon = matches!(
                record.protocol,
                Protocol::Ftp | Protocol::Ssh | Protocol::Icmp | Protocol::Other
            );
            if large_payload && uncommon {
                MALWARE_RULE_SCORE
            } else {
                0.0
            }
        }
        ThreatCategory::Phishing => {
            let web = matches!(record.protocol, Protocol::Http | Protocol::Https);
            if web && record.attribute("suspicious_url") == Some("true") {
                PHISHING_RULE_SCORE
            } else {
                0.0
            }
        }
        ThreatCategory::Intrusion => {
            let failures = record
                .attribute("failed_auth_count")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(0);
            if failures >= 5 {
                INTRUSION_RULE_SCORE
            } else {
                0.0
            }
        }
        ThreatCategory::DataExfiltration => {
            if large_payload && record.attribute("direction") == Some("outbound") {
                EXFIL_RULE_SCORE
            } else {
                0.0
            }
        }
        ThreatCategory::Unknown => 0.0,
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct Classifier {
    config: ClassifierConfig,
    rng: StdRng,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor so tests can pin the base noise
    pub fn with_seed(config: ClassifierConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn classify(&mut self, record: &FlowRecord) -> DetectorScore {
        let mut best = ThreatCategory::Unknown;
        let mut best_score = f64::NEG_INFINITY;

        for category in CANDIDATES {
            let noise = self.rng.gen_range(0.0..self.config.base_noise_max);
            let score = (rule_score(category, record, &self.config) + noise).min(100.0);

            let wins = score > best_score
                || (score == best_score && category.priority() > best.priority());
            if wins {
                best = category;
                best_score = score;
            }
        }

        DetectorScore {
            detector: DetectorId::Classifier,
            score: best_score / 100.0,
            label: Some(best),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
