//! Countermeasure Module
//!
//! Maps high-confidence verdicts to remediation actions and hands them
//! off: generation is a pure category lookup, dispatch decides automatic
//! vs pending and persists the result.

pub mod dispatcher;
pub mod generator;
pub mod types;

pub use dispatcher::{dispatch_history, Dispatcher};
pub use generator::{generate, templates_for};
pub use types::{AlertPayload, Countermeasure, CountermeasureStatus};
