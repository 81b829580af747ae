//! Outbound access to the public COVID-19 data sources.

pub mod client;

pub use client::{parse_csv, UpstreamClient};
