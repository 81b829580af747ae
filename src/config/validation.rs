//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ttl > 0, window >= 1, chart sizes)
//! - Check source URLs parse and the timeline URL is templated
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DashboardConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{CacheBackend, DashboardConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("cache.ttl_secs must be greater than zero")]
    ZeroTtl,

    #[error("cache.redis_url is required when cache.backend = \"redis\"")]
    MissingRedisUrl,

    #[error("{field} '{value}' is not a valid URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("sources.country_timeline_url must contain '{{code}}'")]
    UntemplatedTimeline,

    #[error("charts.rolling_window must be at least 1")]
    ZeroWindow,

    #[error("charts.{0} must be greater than zero")]
    ZeroDimension(&'static str),

    #[error("admin.api_key must be set when admin is enabled")]
    PlaceholderApiKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DashboardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::ZeroTtl);
    }

    if config.cache.backend == CacheBackend::Redis {
        match &config.cache.redis_url {
            None => errors.push(ValidationError::MissingRedisUrl),
            Some(url) => check_url(&mut errors, "cache.redis_url", url),
        }
    }

    let sources = &config.sources;
    check_url(&mut errors, "sources.country_list_url", &sources.country_list_url);
    check_url(&mut errors, "sources.state_daily_url", &sources.state_daily_url);
    check_url(&mut errors, "sources.county_daily_url", &sources.county_daily_url);
    if sources.country_timeline_url.contains("{code}") {
        check_url(
            &mut errors,
            "sources.country_timeline_url",
            &sources.country_timeline("US"),
        );
    } else {
        errors.push(ValidationError::UntemplatedTimeline);
    }

    let charts = &config.charts;
    if charts.rolling_window == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    for (name, value) in [
        ("width", charts.width),
        ("height", charts.height),
        ("tall_height", charts.tall_height),
        ("bar_width", charts.bar_width),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDimension(name));
        }
    }

    if config.admin.enabled
        && (config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_API_KEY)
    {
        errors.push(ValidationError::PlaceholderApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
