//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dashboard.
//! All types derive Serde traits for deserialization from config files.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder admin key; rejected by validation when admin is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the dashboard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DashboardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Cache store selection and expiry.
    pub cache: CacheConfig,

    /// Upstream data sources.
    pub sources: SourceConfig,

    /// Chart layout and derived-metric parameters.
    pub charts: ChartConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Which store backs the table cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Process-local map; lost on restart.
    Memory,
    /// Shared Redis instance.
    Redis,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Redis connection URL, required for the redis backend.
    pub redis_url: Option<String>,

    /// Lifetime of fetched tables in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            ttl_secs: 600,
        }
    }
}

/// Upstream data sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON list of countries with population.
    pub country_list_url: String,

    /// JSON timeline for one country; `{code}` is replaced by the ISO code.
    pub country_timeline_url: String,

    /// Daily per-state CSV.
    pub state_daily_url: String,

    /// Cumulative per-county CSV.
    pub county_daily_url: String,

    /// Directory holding `pop-est2019.csv` and `state-abbre.csv`.
    pub data_dir: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            country_list_url: "https://corona-api.com/countries".to_string(),
            country_timeline_url: "https://corona-api.com/countries/{code}".to_string(),
            state_daily_url: "https://covidtracking.com/api/v1/states/daily.csv".to_string(),
            county_daily_url:
                "https://github.com/nytimes/covid-19-data/blob/master/us-counties.csv?raw=true"
                    .to_string(),
            data_dir: "data".to_string(),
        }
    }
}

impl SourceConfig {
    /// Timeline URL for a country code.
    pub fn country_timeline(&self, code: &str) -> String {
        self.country_timeline_url.replace("{code}", code)
    }
}

/// Chart layout and derived-metric parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Rows before this date are dropped from charts.
    pub start_date: NaiveDate,

    /// Rolling average window in days.
    pub rolling_window: usize,

    pub width: u32,
    pub height: u32,

    /// Height of single-view ranking charts.
    pub tall_height: u32,

    /// Width of the per-state bar chart.
    pub bar_width: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap_or_default(),
            rolling_window: 7,
            width: 500,
            height: 200,
            tall_height: 300,
            bar_width: 600,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time to answer a client) in seconds.
    pub request_secs: u64,

    /// Timeout for a single upstream fetch in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}
