//! Flow Module
//!
//! Canonical FlowRecord model plus the ingestion-side validation that
//! turns raw wire records into records the detectors are allowed to see.

pub mod types;
pub mod validate;

pub use types::{FlowRecord, Protocol, RawFlowRecord};
pub use validate::{validate, ValidationError};
