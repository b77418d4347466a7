//! Ensemble Module
//!
//! Fuses the three detector scores into one Verdict using fixed,
//! validated weights, and derives severity/status from the fused
//! confidence.

pub mod fuser;
pub mod rules;
pub mod types;

pub use fuser::fuse;
pub use rules::{FusionConfig, SeverityBands};
pub use types::{ScoreBreakdown, Severity, ThreatCategory, Verdict, VerdictStatus};
