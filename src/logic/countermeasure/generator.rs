//! Countermeasure Generator
//!
//! Deterministic mapping from a verdict's threat category to an ordered
//! list of remediation templates. Pure function of the category: equal
//! verdicts always yield identical action lists. Confidence gating
//! happens in the pipeline, not here.

use chrono::Utc;
use uuid::Uuid;

use super::types::{Countermeasure, CountermeasureStatus};
use crate::logic::ensemble::types::{ThreatCategory, Verdict};

// ============================================================================
// TEMPLATE TABLE
// ============================================================================

/// (action, description, impact summary)
type Template = (&'static str, &'static str, &'static str);

const DDOS_TEMPLATES: &[Template] = &[
    (
        "Rate Limiting Activation",
        "Throttle inbound traffic from the offending source range",
        "Caps flood volume at the edge; legitimate bursts may slow",
    ),
    (
        "Traffic Diversion",
        "Redirect suspect traffic through the scrubbing path",
        "Absorbs attack volume; adds latency on the diverted path",
    ),
];

const PORT_SCAN_TEMPLATES: &[Template] = &[
    (
        "IP Blacklist",
        "Block the scanning source address at the firewall",
        "Stops further probing from this source immediately",
    ),
    (
        "Stealth Mode",
        "Stop answering probes on unserved ports",
        "Hides the service surface from enumeration",
    ),
];

const MALWARE_TEMPLATES: &[Template] = &[
    (
        "Network Quarantine",
        "Isolate the affected destination host from the network",
        "Contains lateral spread; host loses connectivity",
    ),
    (
        "Deep Packet Inspection",
        "Enable payload inspection on the affected segment",
        "Surfaces C2 traffic; increases inline processing cost",
    ),
];

const PHISHING_TEMPLATES: &[Template] = &[
    (
        "URL Filtering",
        "Block resolution and fetch of the flagged URLs",
        "Cuts off the lure; risk of over-blocking shared hosts",
    ),
    (
        "Mail Gateway Block",
        "Quarantine messages matching the campaign indicators",
        "Stops further delivery of the campaign",
    ),
];

const INTRUSION_TEMPLATES: &[Template] = &[
    (
        "Session Termination",
        "Tear down the suspect session and invalidate its tokens",
        "Ejects the intruder; may drop a legitimate session",
    ),
    (
        "Credential Reset",
        "Force credential rotation for the targeted accounts",
        "Closes the stolen-credential window; users must re-auth",
    ),
];

const EXFIL_TEMPLATES: &[Template] = &[
    (
        "Egress Block",
        "Block outbound transfers to the receiving address",
        "Stops the data leaving; breaks flows sharing the route",
    ),
    (
        "DLP Scan",
        "Sweep the source host for staged sensitive data",
        "Identifies what was taken; scan load on the host",
    ),
];

const DEFAULT_TEMPLATES: &[Template] = &[(
    "Enhanced Monitoring",
    "Raise log verbosity and alerting sensitivity for the flow's endpoints",
    "Improves visibility; no traffic is blocked",
)];

/// Ordered remediation templates for a category
pub fn templates_for(category: ThreatCategory) -> &'static [Template] {
    match category {
        ThreatCategory::Ddos => DDOS_TEMPLATES,
        ThreatCategory::PortScan => PORT_SCAN_TEMPLATES,
        ThreatCategory::Malware => MALWARE_TEMPLATES,
        ThreatCategory::Phishing => PHISHING_TEMPLATES,
        ThreatCategory::Intrusion => INTRUSION_TEMPLATES,
        ThreatCategory::DataExfiltration => EXFIL_TEMPLATES,
        ThreatCategory::Unknown => DEFAULT_TEMPLATES,
    }
}

// ============================================================================
// GENERATION
// ============================================================================

/// Generate countermeasures for a verdict. All start Pending; the
/// dispatcher decides deployment.
pub fn generate(verdict: &Verdict) -> Vec<Countermeasure> {
    templates_for(verdict.threat_category)
        .iter()
        .map(|(action, description, impact)| Countermeasure {
            id: Uuid::new_v4(),
            verdict_id: verdict.id,
            action: action.to_string(),
            description: description.to_string(),
            impact_summary: impact.to_string(),
            status: CountermeasureStatus::Pending,
            created_at: Utc::now(),
            deployed_at: None,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
