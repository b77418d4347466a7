//! Flow Validation
//!
//! Only validation logic - no type definitions.
//! Input: RawFlowRecord from the ingestion source
//! Output: FlowRecord, or ValidationError rejected before detection

use chrono::Utc;

use super::types::{FlowRecord, Protocol, RawFlowRecord};

// ============================================================================
// ERRORS
// ============================================================================

/// Validation error for malformed flow records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required source address is missing
    MissingSourceAddress,
    /// Required destination address is missing
    MissingDestinationAddress,
    /// Required protocol is missing
    MissingProtocol,
    /// Address present but not a valid IP literal
    InvalidAddress { field: &'static str, value: String },
    /// Protocol string not in the accepted vocabulary
    InvalidProtocol { value: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingSourceAddress => write!(f, "Missing source address"),
            ValidationError::MissingDestinationAddress => {
                write!(f, "Missing destination address")
            }
            ValidationError::MissingProtocol => write!(f, "Missing protocol"),
            ValidationError::InvalidAddress { field, value } => {
                write!(f, "Invalid {} address: {}", field, value)
            }
            ValidationError::InvalidProtocol { value } => {
                write!(f, "Invalid protocol: {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate a raw ingestion record into a FlowRecord.
///
/// Malformed records are rejected here, upstream of the detector set -
/// never silently defaulted, never scored.
pub fn validate(raw: RawFlowRecord) -> Result<FlowRecord, ValidationError> {
    let source = raw
        .source_addr
        .ok_or(ValidationError::MissingSourceAddress)?;
    let dest = raw
        .dest_addr
        .ok_or(ValidationError::MissingDestinationAddress)?;
    let protocol = raw.protocol.ok_or(ValidationError::MissingProtocol)?;

    let source_addr = source.parse().map_err(|_| ValidationError::InvalidAddress {
        field: "source",
        value: source.clone(),
    })?;
    let dest_addr = dest.parse().map_err(|_| ValidationError::InvalidAddress {
        field: "destination",
        value: dest.clone(),
    })?;
    let protocol = Protocol::parse(&protocol)
        .ok_or(ValidationError::InvalidProtocol { value: protocol })?;

    Ok(FlowRecord {
        timestamp: raw.timestamp.unwrap_or_else(Utc::now),
        source_addr,
        dest_addr,
        protocol,
        port: raw.port,
        payload_size: raw.payload_size,
        raw_attributes: raw.raw_attributes,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(src: &str, dst: &str, proto: &str) -> RawFlowRecord {
        RawFlowRecord {
            source_addr: Some(src.to_string()),
            dest_addr: Some(dst.to_string()),
            protocol: Some(proto.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record() {
        let record = validate(raw("10.0.0.1", "192.168.1.5", "tcp")).unwrap();
        assert_eq!(record.protocol, Protocol::Tcp);
        assert_eq!(record.payload_bytes(), 0);
    }

    #[test]
    fn test_missing_source_rejected() {
        let mut r = raw("10.0.0.1", "192.168.1.5", "tcp");
        r.source_addr = None;
        assert_eq!(validate(r), Err(ValidationError::MissingSourceAddress));
    }

    #[test]
    fn test_missing_protocol_rejected() {
        let mut r = raw("10.0.0.1", "192.168.1.5", "tcp");
        r.protocol = None;
        assert_eq!(validate(r), Err(ValidationError::MissingProtocol));
    }

    #[test]
    fn test_bad_ip_literal_rejected() {
        let err = validate(raw("not-an-ip", "192.168.1.5", "udp")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress { field: "source", .. }));
    }

    #[test]
    fn test_unknown_protocol_string_rejected() {
        let err = validate(raw("10.0.0.1", "192.168.1.5", "gopher")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidProtocol { .. }));
    }

    #[test]
    fn test_ipv6_accepted() {
        let record = validate(raw("2001:db8::1", "2001:db8::2", "https")).unwrap();
        assert!(record.source_addr.is_ipv6());
    }
}
