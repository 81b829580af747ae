//! Per-domain data drivers.
//!
//! # Data Flow
//! ```text
//! handler
//!     → driver (country.rs / state.rs / county.rs)
//!         → TableCache (cached table or upstream fetch)
//!         → transform (rolling means, per-capita, ranking)
//!         → chart (Vega-Lite spec)
//! ```
//!
//! Each driver keeps its fetched tables under its own cache hash.

pub mod country;
pub mod county;
pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::TableCache;
use crate::config::{ChartConfig, SourceConfig};
use crate::upstream::UpstreamClient;

pub use country::CountryDriver;
pub use county::CountyDriver;
pub use state::StateDriver;

/// Cache hashes owned by the drivers.
pub const COUNTRY_HASH: &str = "country";
pub const STATE_HASH: &str = "state";
pub const COUNTY_HASH: &str = "county";
pub const KNOWN_HASHES: [&str; 3] = [COUNTRY_HASH, STATE_HASH, COUNTY_HASH];

/// Field holding the main table of a hash.
pub const MAIN_TABLE: &str = "dataframe";

/// Shared dependencies handed to every driver.
#[derive(Clone)]
pub struct DriverContext {
    pub cache: TableCache,
    pub upstream: UpstreamClient,
    pub sources: Arc<SourceConfig>,
    pub charts: Arc<ChartConfig>,
}

impl DriverContext {
    /// Start of the chart window: the explicit `since` or the configured default.
    pub fn window_start(&self, since: Option<NaiveDate>) -> NaiveDate {
        since.unwrap_or(self.charts.start_date)
    }
}

/// A region with its display name and population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub code: String,
    pub name: String,
    pub population: Option<f64>,
}

/// Selector contents for a region picker: code → display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeMenu {
    pub abbrev: BTreeMap<String, String>,
    pub default: &'static str,
}

impl CodeMenu {
    pub fn from_regions(regions: &[RegionRecord], default: &'static str) -> Self {
        Self {
            abbrev: regions
                .iter()
                .map(|r| (r.code.clone(), r.name.clone()))
                .collect(),
            default,
        }
    }
}

/// Find a region by code.
pub fn find_region<'a>(regions: &'a [RegionRecord], code: &str) -> Option<&'a RegionRecord> {
    regions.iter().find(|r| r.code == code)
}
