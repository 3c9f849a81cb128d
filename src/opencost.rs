use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::types::Config;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to reach cost endpoint: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("cost endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("failed to decode allocation response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("allocation query failed with status: {status}{}", detail(.message))]
    QueryFailed { status: String, message: Option<String> },
}

fn detail(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(" ({})", m)).unwrap_or_default()
}

/// Envelope returned by the allocation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAllocationReport {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Option<Map<String, Value>>>>,
}

impl RawAllocationReport {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// The accumulated window. Later entries are ignored since the query
    /// always asks for a single accumulated set.
    pub fn first_window(&self) -> Option<&Map<String, Value>> {
        self.data
            .as_ref()
            .and_then(|d| d.first())
            .and_then(|w| w.as_ref())
    }

    pub fn into_checked(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::QueryFailed {
                status: self.status,
                message: self.message,
            })
        }
    }
}

/// Fixed query parameters for one allocation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationQuery {
    pub window: String,
    pub aggregate: String,
    pub include_idle: bool,
    pub step: String,
}

impl AllocationQuery {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            window: cfg.window.clone(),
            aggregate: cfg.aggregate.clone(),
            include_idle: cfg.include_idle,
            step: cfg.step.clone(),
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("window", self.window.clone()),
            ("aggregate", self.aggregate.clone()),
            ("includeIdle", self.include_idle.to_string()),
            ("step", self.step.clone()),
            ("accumulate", "true".to_string()),
        ]
    }
}

pub struct OpenCostClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OpenCostClient {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", cfg.opencost_url, cfg.opencost_path),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue the allocation query. A response whose `status` is not
    /// `success` is an error.
    pub async fn fetch_allocations(&self, query: &AllocationQuery) -> Result<RawAllocationReport, FetchError> {
        info!("Querying allocations from {} (window {})", self.endpoint, query.window);
        let res = self
            .http
            .get(&self.endpoint)
            .query(&query.params())
            .send()
            .await
            .map_err(|e| {
                error!("Allocation request failed: {}", e);
                FetchError::Transport(e)
            })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            error!("Allocation endpoint returned {}: {}", status, body);
            return Err(FetchError::HttpStatus { status, body });
        }

        let report: RawAllocationReport = res.json().await.map_err(FetchError::Decode)?;
        let report = report.into_checked()?;
        info!(
            "Received {} allocation buckets",
            report.first_window().map(|w| w.len()).unwrap_or(0)
        );
        Ok(report)
    }
}
