//! Program data source
//!
//! The feed is a single JSON document with three collections
//! (`combinedData`, `speciesList`, `adminData`) or an `error` field when the
//! server reports a failure. Requests carry a `t=<millis>` parameter so
//! intermediate caches never serve a stale document.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use pffp_common::models::{AdminUnit, ProgramRecord, SpeciesRecord};

const USER_AGENT: &str = concat!("pffp-dashboard/", env!("CARGO_PKG_VERSION"));

/// Data source errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// No endpoint configured
    #[error("No data endpoint configured")]
    NotConfigured,

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint returned a non-success status
    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    /// Endpoint answered with an `error` field
    #[error("API error: {0}")]
    Server(String),

    /// Response body was not a valid feed document
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Wire format of the feed document
#[derive(Debug, Default, Deserialize)]
pub struct FeedPayload {
    #[serde(rename = "combinedData", default)]
    pub combined_data: Option<Vec<ProgramRecord>>,
    #[serde(rename = "speciesList", default)]
    pub species_list: Option<Vec<SpeciesRecord>>,
    #[serde(rename = "adminData", default)]
    pub admin_data: Option<Vec<AdminUnit>>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Collections of one successful fetch
#[derive(Debug, Clone, Default)]
pub struct FeedData {
    pub records: Vec<ProgramRecord>,
    pub species: Vec<SpeciesRecord>,
    pub admin: Vec<AdminUnit>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl FeedPayload {
    /// Reject server-reported failures; missing collections become empty
    pub fn into_feed(self) -> Result<FeedData, FetchError> {
        if let Some(error) = self.error.as_ref().filter(|e| is_truthy(e)) {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(FetchError::Server(message));
        }

        Ok(FeedData {
            records: self.combined_data.unwrap_or_default(),
            species: self.species_list.unwrap_or_default(),
            admin: self.admin_data.unwrap_or_default(),
        })
    }

    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// Anything that can produce a full feed snapshot
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedData, FetchError>;
}

/// Source used when no endpoint is configured
pub struct UnconfiguredSource;

#[async_trait]
impl DataSource for UnconfiguredSource {
    async fn fetch(&self) -> Result<FeedData, FetchError> {
        Err(FetchError::NotConfigured)
    }
}

/// HTTP feed client
pub struct HttpDataSource {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpDataSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self) -> Result<FeedData, FetchError> {
        let cache_buster = chrono::Utc::now().timestamp_millis().to_string();

        tracing::debug!(endpoint = %self.endpoint, "Requesting program feed");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("t", cache_buster.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("").to_string();
            return Err(FetchError::Status(status.as_u16(), reason));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        FeedPayload::parse(&body)?.into_feed()
    }
}
