//! Logic Module - Pipeline Engines
//!
//! The scoring-and-response core: flow model, detector set, ensemble
//! fuser, enrichment orchestrator, countermeasure generation/dispatch,
//! and the persistence boundary.
//!
//! Data flow:
//! FlowRecord -> [enrichment (real-time path) + detector set] ->
//! ensemble fuser -> Verdict -> countermeasure generator -> dispatcher ->
//! store.

pub mod config;
pub mod countermeasure;
pub mod detectors;
pub mod enrichment;
pub mod ensemble;
pub mod flow;
pub mod pipeline;
pub mod store;
pub mod telemetry;
