//! Enrichment Module
//!
//! Augments detector scoring with external reputation, geolocation, AI
//! log-analysis and port-exposure signals on the real-time path.
//! Partial-failure semantics throughout: any subset of collaborators may
//! be down and the pipeline still produces verdicts.

pub mod orchestrator;
pub mod providers;
pub mod types;

pub use orchestrator::{Enricher, EnrichmentConfig, EnrichmentOrchestrator};
pub use providers::{
    AiAnalyzer, GeoLookup, HttpAiClient, HttpGeoClient, HttpPortExposureClient,
    HttpReputationClient, PortExposureLookup, ReputationLookup,
};
pub use types::{AiAnalysis, EnrichmentSignal, GeoInfo, LookupError, PortExposure, Reputation};
