//! Flow Types
//!
//! Core types for observed network flows.
//! No logic here - just data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

// ============================================================================
// PROTOCOL
// ============================================================================

/// Transport/application protocol of an observed flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Http,
    Https,
    Ftp,
    Ssh,
    Icmp,
    Other,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Ftp => "ftp",
            Protocol::Ssh => "ssh",
            Protocol::Icmp => "icmp",
            Protocol::Other => "other",
        }
    }

    /// Stable numeric code, used as a temporal feature
    pub fn code(&self) -> u8 {
        match self {
            Protocol::Other => 0,
            Protocol::Tcp => 1,
            Protocol::Udp => 2,
            Protocol::Http => 3,
            Protocol::Https => 4,
            Protocol::Ftp => 5,
            Protocol::Ssh => 6,
            Protocol::Icmp => 7,
        }
    }

    /// Risk weight for the outlier scorer. Common protocols carry zero
    /// weight so well-formed ordinary traffic gets no protocol penalty.
    pub fn risk_weight(&self) -> f64 {
        match self {
            Protocol::Tcp | Protocol::Http | Protocol::Https => 0.0,
            Protocol::Ftp | Protocol::Ssh => 0.10,
            Protocol::Udp => 0.15,
            Protocol::Icmp => 0.20,
            Protocol::Other => 0.25,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            "ftp" => Some(Protocol::Ftp),
            "ssh" => Some(Protocol::Ssh),
            "icmp" => Some(Protocol::Icmp),
            "other" | "unknown" => Some(Protocol::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RAW FLOW RECORD (ingestion wire format)
// ============================================================================

/// A flow record as it arrives from the ingestion source, before
/// validation. Address and protocol are optional strings on the wire;
/// `validate()` either produces a `FlowRecord` or rejects the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFlowRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub source_addr: Option<String>,
    pub dest_addr: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub payload_size: Option<u64>,
    #[serde(default)]
    pub raw_attributes: HashMap<String, String>,
}

// ============================================================================
// FLOW RECORD (validated, immutable)
// ============================================================================

/// One observed network flow. Immutable once created; constructed only by
/// `flow::validate`, consumed read-only by every detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub timestamp: DateTime<Utc>,
    pub source_addr: IpAddr,
    pub dest_addr: IpAddr,
    pub protocol: Protocol,
    pub port: Option<u16>,
    pub payload_size: Option<u64>,
    pub raw_attributes: HashMap<String, String>,
}

impl FlowRecord {
    /// Payload size with absent treated as zero bytes
    pub fn payload_bytes(&self) -> u64 {
        self.payload_size.unwrap_or(0)
    }

    /// Attribute lookup by key (protocol flags, connection state, entropy...)
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.raw_attributes.get(key).map(|s| s.as_str())
    }
}
