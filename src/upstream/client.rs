//! HTTP client for the public data sources.
//!
//! # Responsibilities
//! - Fetch JSON documents and CSV tables
//! - Enforce a per-request timeout
//! - Map non-success statuses, timeouts and malformed bodies to errors
//!
//! Failures propagate to the caller; nothing is retried.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{DashboardError, DashboardResult};
use crate::observability::metrics;

const USER_AGENT: &str = concat!("covid-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> DashboardResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch and decode a JSON document. `source` labels logs and metrics.
    pub async fn get_json<T: DeserializeOwned>(&self, source: &str, url: &str) -> DashboardResult<T> {
        let start = Instant::now();
        let result = match self.get_bytes(url).await {
            Ok(body) => serde_json::from_slice(&body)
                .map_err(|e| DashboardError::Decode(format!("{url}: {e}"))),
            Err(e) => Err(e),
        };
        finish(source, url, start, result)
    }

    /// Fetch a CSV table and deserialize every row by header name.
    pub async fn get_csv<T: DeserializeOwned>(&self, source: &str, url: &str) -> DashboardResult<Vec<T>> {
        let start = Instant::now();
        let result = match self.get_bytes(url).await {
            Ok(body) => parse_csv(&body),
            Err(e) => Err(e),
        };
        finish(source, url, start, result)
    }

    async fn get_bytes(&self, url: &str) -> DashboardResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| classify(url, e))
    }
}

/// Deserialize CSV rows; blank cells become `None` for optional fields.
pub fn parse_csv<T: DeserializeOwned>(body: &[u8]) -> DashboardResult<Vec<T>> {
    let mut reader = csv::Reader::from_reader(body);
    let rows = reader.deserialize().collect::<Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

fn classify(url: &str, err: reqwest::Error) -> DashboardError {
    if err.is_timeout() {
        DashboardError::UpstreamTimeout {
            url: url.to_string(),
        }
    } else {
        DashboardError::Http(err)
    }
}

fn finish<T>(source: &str, url: &str, start: Instant, result: DashboardResult<T>) -> DashboardResult<T> {
    metrics::record_fetch(source, result.is_ok(), start);
    match &result {
        Ok(_) => tracing::info!(
            source,
            url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched upstream table"
        ),
        Err(e) => tracing::warn!(source, url, error = %e, "Upstream fetch failed"),
    }
    result
}
