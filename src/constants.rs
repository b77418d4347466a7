//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! The thresholds below are tunable policy, not law: every one of them
//! can be overridden via environment variable and flows through
//! `logic::config::PipelineConfig`.

/// Ensemble weight for the outlier scorer
pub const DEFAULT_OUTLIER_WEIGHT: f64 = 0.40;

/// Ensemble weight for the temporal scorer
pub const DEFAULT_TEMPORAL_WEIGHT: f64 = 0.35;

/// Ensemble weight for the classifier
pub const DEFAULT_CLASSIFIER_WEIGHT: f64 = 0.25;

/// Fused confidence must be strictly above this to materialize a verdict
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 0.5;

/// Fused confidence strictly above this marks a verdict Predicted
pub const DEFAULT_PREDICTION_THRESHOLD: f64 = 0.8;

/// Minimum confidence before countermeasures are generated at all
pub const DEFAULT_DISPATCH_THRESHOLD: f64 = 0.5;

/// Confidence at or above this auto-deploys countermeasures
pub const DEFAULT_AUTO_DEPLOY_THRESHOLD: f64 = 0.6;

/// Payload size (bytes) above which the outlier scorer adds its increment
pub const DEFAULT_PAYLOAD_THRESHOLD: u64 = 10_000;

/// Ports inside this range count as unusual/ephemeral for the outlier scorer
pub const DEFAULT_UNUSUAL_PORT_MIN: u16 = 32_768;
pub const DEFAULT_UNUSUAL_PORT_MAX: u16 = 65_535;

/// Sliding window length for the temporal scorer
pub const DEFAULT_TEMPORAL_WINDOW: usize = 30;

/// Per-lookup timeout for enrichment collaborators (milliseconds)
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2_000;

/// Upper bound on the total enrichment contribution to fused confidence
pub const DEFAULT_ENRICHMENT_CAP: f64 = 0.35;

/// Reputation indicator above this contributes to the enrichment score
pub const DEFAULT_REPUTATION_THRESHOLD: f64 = 0.7;

/// Default base URL for the reputation collaborator
pub const DEFAULT_REPUTATION_URL: &str = "http://localhost:8600/reputation";

/// Default base URL for the geolocation collaborator
pub const DEFAULT_GEO_URL: &str = "http://localhost:8600/geo";

/// Default base URL for the AI log-analysis collaborator
pub const DEFAULT_AI_ANALYSIS_URL: &str = "http://localhost:8600/ai";

/// Default base URL for the port-exposure collaborator
pub const DEFAULT_PORT_EXPOSURE_URL: &str = "http://localhost:8600/ports";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "NetSentry";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get detection threshold from environment or use default
pub fn get_detection_threshold() -> f64 {
    env_f64("NETSENTRY_DETECTION_THRESHOLD", DEFAULT_DETECTION_THRESHOLD)
}

/// Get auto-deploy threshold from environment or use default
pub fn get_auto_deploy_threshold() -> f64 {
    env_f64("NETSENTRY_AUTO_DEPLOY_THRESHOLD", DEFAULT_AUTO_DEPLOY_THRESHOLD)
}

/// Get per-lookup enrichment timeout from environment or use default
pub fn get_lookup_timeout_ms() -> u64 {
    env_u64("NETSENTRY_LOOKUP_TIMEOUT_MS", DEFAULT_LOOKUP_TIMEOUT_MS)
}

/// Get reputation collaborator URL from environment or use default
pub fn get_reputation_url() -> String {
    std::env::var("NETSENTRY_REPUTATION_URL")
        .unwrap_or_else(|_| DEFAULT_REPUTATION_URL.to_string())
}

/// Get geolocation collaborator URL from environment or use default
pub fn get_geo_url() -> String {
    std::env::var("NETSENTRY_GEO_URL").unwrap_or_else(|_| DEFAULT_GEO_URL.to_string())
}

/// Get AI analysis collaborator URL from environment or use default
pub fn get_ai_analysis_url() -> String {
    std::env::var("NETSENTRY_AI_URL").unwrap_or_else(|_| DEFAULT_AI_ANALYSIS_URL.to_string())
}

/// Get port-exposure collaborator URL from environment or use default
pub fn get_port_exposure_url() -> String {
    std::env::var("NETSENTRY_PORT_EXPOSURE_URL")
        .unwrap_or_else(|_| DEFAULT_PORT_EXPOSURE_URL.to_string())
}

/// Check if enrichment is enabled (real-time path)
pub fn is_enrichment_enabled() -> bool {
    std::env::var("NETSENTRY_ENRICHMENT_ENABLED")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
