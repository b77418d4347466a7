//! NetSentry Core - Main Entry Point
//!
//! Daemon wiring: logger, configuration validation (fatal on error),
//! store and collaborator clients, then an NDJSON-over-stdin ingest loop
//! until ctrl-c.

mod logic;
pub mod constants;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use logic::config::PipelineConfig;
use logic::enrichment::{
    Enricher, EnrichmentOrchestrator, HttpAiClient, HttpGeoClient, HttpPortExposureClient,
    HttpReputationClient,
};
use logic::flow::RawFlowRecord;
use logic::pipeline::AnalysisEngine;
use logic::store::{AnalysisStore, MemoryStore, SqliteStore};
use logic::telemetry;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} Core v{}...",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let config = PipelineConfig::from_env();
    if let Err(e) = config.validate() {
        log::error!("Configuration rejected: {}", e);
        std::process::exit(1);
    }

    let store: Arc<dyn AnalysisStore> = match SqliteStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::warn!("SQLite store unavailable ({}), falling back to in-memory", e);
            Arc::new(MemoryStore::new())
        }
    };

    if constants::is_enrichment_enabled() {
        let timeout = Duration::from_millis(config.enrichment.lookup_timeout_ms);
        let orchestrator = EnrichmentOrchestrator::new(
            HttpReputationClient::new(constants::get_reputation_url(), timeout),
            HttpGeoClient::new(constants::get_geo_url(), timeout),
            HttpAiClient::new(constants::get_ai_analysis_url(), timeout),
            HttpPortExposureClient::new(constants::get_port_exposure_url(), timeout),
            config.enrichment.clone(),
        );
        log::info!("Enrichment enabled (per-lookup timeout {:?})", timeout);
        run(AnalysisEngine::with_enrichment(config, store, orchestrator)).await;
    } else {
        log::info!("Enrichment disabled - detector-only scoring");
        run(AnalysisEngine::detector_only(config, store)).await;
    }

    let stats = telemetry::snapshot();
    log::info!(
        "Shutdown: {} flows, {} verdicts, {} countermeasures, {} degraded enrichments, {} store failures",
        stats.flows_processed,
        stats.verdicts_emitted,
        stats.countermeasures_dispatched,
        stats.enrichment_degraded,
        stats.store_failures
    );
}

/// Ingest newline-delimited JSON flow records from stdin until EOF or
/// ctrl-c. The in-flight record finishes before the loop exits; its
/// enrichment lookups are bounded by their own timeouts.
async fn run<E: Enricher>(engine: AnalysisEngine<E>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        log::info!("Ingestion source closed");
                        break;
                    }
                    Err(e) => {
                        log::error!("Ingestion read error: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let raw: RawFlowRecord = match serde_json::from_str(&line) {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::warn!("Undecodable flow record: {}", e);
                        continue;
                    }
                };

                // Validation errors are already logged and counted
                let _ = engine.analyze(raw).await;
            }
        }
    }
}
