//! COVID-19 dashboard service.
//!
//! Fetches public country, state and county statistics, caches the parsed
//! tables with a time-to-live, derives rolling averages and per-capita rates,
//! and serves the results as Vega-Lite chart specifications.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;

// Data pipeline
pub mod cache;
pub mod chart;
pub mod drivers;
pub mod transform;
pub mod upstream;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use http::DashboardServer;
pub use lifecycle::Shutdown;
