//! Enrichment Providers
//!
//! Capability traits for the external collaborators, plus the HTTP
//! clients used in production. Concrete transport/auth beyond a base URL
//! and a timeout is the collaborator's problem, not ours.

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

use super::types::{AiAnalysis, GeoInfo, LookupError, PortExposure, Reputation};
use crate::logic::flow::FlowRecord;

// ============================================================================
// CAPABILITY TRAITS
// ============================================================================

/// Address reputation capability
pub trait ReputationLookup {
    fn reputation(
        &self,
        addr: IpAddr,
    ) -> impl std::future::Future<Output = Result<Reputation, LookupError>> + Send;
}

/// Geolocation capability
pub trait GeoLookup {
    fn geolocate(
        &self,
        addr: IpAddr,
    ) -> impl std::future::Future<Output = Result<GeoInfo, LookupError>> + Send;
}

/// AI log-analysis capability
pub trait AiAnalyzer {
    fn analyze(
        &self,
        record: &FlowRecord,
    ) -> impl std::future::Future<Output = Result<AiAnalysis, LookupError>> + Send;
}

/// Port exposure capability, only consulted when a record carries a port
pub trait PortExposureLookup {
    fn port_exposure(
        &self,
        addr: IpAddr,
        port: u16,
    ) -> impl std::future::Future<Output = Result<PortExposure, LookupError>> + Send;
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReputationResponse {
    malicious_indicator_score: f64,
    #[serde(default)]
    raw: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    country: String,
    #[serde(default)]
    raw: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AiAnalysisResponse {
    threat_level: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortExposureResponse {
    is_open: bool,
    #[serde(default)]
    services: Vec<String>,
}

// ============================================================================
// HTTP CLIENTS
// ============================================================================

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

fn transport_error(e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Network(e.to_string())
    }
}

/// HTTP reputation client
pub struct HttpReputationClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpReputationClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http_client: build_client(timeout),
            base_url,
        }
    }
}

impl ReputationLookup for HttpReputationClient {
    async fn reputation(&self, addr: IpAddr) -> Result<Reputation, LookupError> {
        let url = format!("{}/{}", self.base_url, addr);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: ReputationResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(Reputation {
            malicious_indicator: body.malicious_indicator_score,
            raw: body.raw,
        })
    }
}

/// HTTP geolocation client
pub struct HttpGeoClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpGeoClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http_client: build_client(timeout),
            base_url,
        }
    }
}

impl GeoLookup for HttpGeoClient {
    async fn geolocate(&self, addr: IpAddr) -> Result<GeoInfo, LookupError> {
        let url = format!("{}/{}", self.base_url, addr);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(GeoInfo {
            country: body.country,
            raw: body.raw,
        })
    }
}

/// HTTP AI log-analysis client. Posts the flow record, receives a threat
/// level estimate and an optional category.
pub struct HttpAiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpAiClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http_client: build_client(timeout),
            base_url,
        }
    }
}

impl AiAnalyzer for HttpAiClient {
    async fn analyze(&self, record: &FlowRecord) -> Result<AiAnalysis, LookupError> {
        let response = self
            .http_client
            .post(&self.base_url)
            .json(record)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: AiAnalysisResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(AiAnalysis {
            threat_level: body.threat_level.clamp(0.0, 1.0),
            category: body.category,
            description: body.description,
        })
    }
}

/// HTTP port-exposure client
pub struct HttpPortExposureClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPortExposureClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http_client: build_client(timeout),
            base_url,
        }
    }
}

impl PortExposureLookup for HttpPortExposureClient {
    async fn port_exposure(&self, addr: IpAddr, port: u16) -> Result<PortExposure, LookupError> {
        let url = format!("{}/{}/{}", self.base_url, addr, port);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: PortExposureResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(PortExposure {
            is_open: body.is_open,
            services: body.services,
        })
    }
}
