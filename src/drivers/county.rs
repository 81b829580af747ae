//! US county statistics from cumulative per-county totals.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::{grey_panel, legend_panel, ChartSpec, LegendTags, Panel, View};
use crate::config::ChartConfig;
use crate::drivers::{DriverContext, COUNTY_HASH, MAIN_TABLE};
use crate::error::{DashboardError, DashboardResult};
use crate::transform::{days_since, diff, rolling_mean, since, Dated};

pub const DEFAULT_COUNTY: &str = "Santa Clara, California";

/// Field of the permanent county name table.
pub const NAMES_TABLE: &str = "names";

/// Cumulative totals for one county on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyRecord {
    pub date: NaiveDate,
    pub county: String,
    pub state: String,
    #[serde(default)]
    pub cases: Option<f64>,
    #[serde(default)]
    pub deaths: Option<f64>,
}

/// A county and the state it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountyName {
    pub state: String,
    pub county: String,
}

impl CountyName {
    /// Parse a `"County, State"` menu label.
    pub fn parse(code: &str) -> DashboardResult<Self> {
        match code.rsplit_once(", ") {
            Some((county, state)) if !county.is_empty() && !state.is_empty() => Ok(Self {
                state: state.to_string(),
                county: county.to_string(),
            }),
            _ => Err(DashboardError::BadRequest(format!(
                "county code '{code}' is not of the form 'County, State'"
            ))),
        }
    }

    pub fn label(&self) -> String {
        format!("{}, {}", self.county, self.state)
    }

    /// Cache field holding this county's derived series.
    pub fn cache_field(&self) -> String {
        format!("{}:{}", self.state, self.county)
    }
}

/// Derived daily series for one county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyDay {
    pub date: NaiveDate,
    pub cases: Option<f64>,
    pub deaths: Option<f64>,
    /// Days since the first day with any case.
    pub days: Option<i64>,
    /// Days since the first day with at least ten cases.
    pub days10: Option<i64>,
    pub dcases: Option<f64>,
    pub ddeaths: Option<f64>,
}

/// Turn one county's cumulative records into daily increments.
pub fn county_series(mut records: Vec<CountyRecord>) -> Vec<CountyDay> {
    records.sort_by_key(|r| r.date);

    let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    let cases: Vec<Option<f64>> = records.iter().map(|r| r.cases).collect();
    let deaths: Vec<Option<f64>> = records.iter().map(|r| r.deaths).collect();

    let days = days_since(&dates, &cases, 0.0);
    let days10 = days_since(&dates, &cases, 9.0);
    let dcases = diff(&cases);
    let ddeaths = diff(&deaths);

    records
        .iter()
        .enumerate()
        .map(|(i, r)| CountyDay {
            date: r.date,
            cases: r.cases,
            deaths: r.deaths,
            days: days[i],
            days10: days10[i],
            dcases: dcases[i],
            ddeaths: ddeaths[i],
        })
        .collect()
}

/// Sorted county labels for the picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyMenu {
    pub names: Vec<String>,
    pub default: &'static str,
}

#[derive(Debug, Serialize)]
struct PlotRow {
    dt: NaiveDate,
    dcases: Option<f64>,
    ddeaths: Option<f64>,
    proll: Option<f64>,
    froll: Option<f64>,
    days: Option<i64>,
    days10: Option<i64>,
    #[serde(flatten)]
    tags: LegendTags,
}

impl Dated for PlotRow {
    fn date(&self) -> NaiveDate {
        self.dt
    }
}

/// Daily cases and deaths with rolling averages, titled with `label`.
pub fn plot_chart(
    label: &str,
    days: &[CountyDay],
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let dcases: Vec<Option<f64>> = days.iter().map(|d| d.dcases).collect();
    let ddeaths: Vec<Option<f64>> = days.iter().map(|d| d.ddeaths).collect();
    let proll = rolling_mean(&dcases, charts.rolling_window);
    let froll = rolling_mean(&ddeaths, charts.rolling_window);

    let rows = since(
        days.iter().enumerate().map(|(i, d)| PlotRow {
            dt: d.date,
            dcases: d.dcases,
            ddeaths: d.ddeaths,
            proll: proll[i],
            froll: froll[i],
            days: d.days,
            days10: d.days10,
            tags: LegendTags::default(),
        }),
        start,
    );

    let top = legend_panel(&Panel::new("dcases", "proll", "Cases"))
        .size(charts.width, charts.height)
        .title(label);
    let bottom = grey_panel(&Panel::new("ddeaths", "froll", "Fatalities"))
        .size(charts.width, charts.height);

    Ok(ChartSpec::new(&rows, View::vconcat(vec![top, bottom]))?.without_legend_title())
}

/// Driver for county charts.
#[derive(Clone)]
pub struct CountyDriver {
    ctx: DriverContext,
}

impl CountyDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    /// Every county on every day.
    pub async fn fetch_data(&self) -> DashboardResult<Vec<CountyRecord>> {
        self.ctx
            .cache
            .get_or_fetch(COUNTY_HASH, MAIN_TABLE, || async {
                self.ctx
                    .upstream
                    .get_csv("county_daily", &self.ctx.sources.county_daily_url)
                    .await
            })
            .await
    }

    /// Distinct counties, built once from the main table.
    pub async fn fetch_names(&self) -> DashboardResult<Vec<CountyName>> {
        self.ctx
            .cache
            .get_or_build(COUNTY_HASH, NAMES_TABLE, || async {
                let records = self.fetch_data().await?;
                let names: BTreeSet<CountyName> = records
                    .into_iter()
                    .map(|r| CountyName {
                        state: r.state,
                        county: r.county,
                    })
                    .collect();
                Ok(names.into_iter().collect::<Vec<_>>())
            })
            .await
    }

    /// Derived series for one county, cached under `State:County`.
    pub async fn fetch_county(&self, name: &CountyName) -> DashboardResult<Vec<CountyDay>> {
        self.ctx
            .cache
            .get_or_fetch(COUNTY_HASH, &name.cache_field(), || async {
                let records: Vec<CountyRecord> = self
                    .fetch_data()
                    .await?
                    .into_iter()
                    .filter(|r| r.state == name.state && r.county == name.county)
                    .collect();

                if records.is_empty() {
                    return Err(DashboardError::NotFound(format!("county '{}'", name.label())));
                }
                Ok(county_series(records))
            })
            .await
    }

    pub async fn menu(&self) -> DashboardResult<CountyMenu> {
        let mut names: Vec<String> = self
            .fetch_names()
            .await?
            .iter()
            .map(CountyName::label)
            .collect();
        names.sort();

        Ok(CountyMenu {
            names,
            default: DEFAULT_COUNTY,
        })
    }

    pub async fn plot(&self, code: &str, since: Option<NaiveDate>) -> DashboardResult<ChartSpec> {
        let name = CountyName::parse(code)?;
        let days = self.fetch_county(&name).await?;
        plot_chart(&name.label(), &days, self.ctx.window_start(since), &self.ctx.charts)
    }
}
