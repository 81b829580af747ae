//! Country-level statistics.
//!
//! Two JSON documents feed this driver: the country list (name, ISO code,
//! population) and a per-country daily timeline. Both are cached under the
//! `country` hash, the list as `dataframe` and each timeline under its code.

use chrono::NaiveDate;
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::chart::{
    grey_panel, legend_panel, Channel, ChartSpec, Encoding, LegendTags, Mark, Panel, View,
};
use crate::config::ChartConfig;
use crate::drivers::{find_region, CodeMenu, DriverContext, RegionRecord, COUNTRY_HASH, MAIN_TABLE};
use crate::error::{DashboardError, DashboardResult};
use crate::transform::{per_capita, rolling_mean, since, Dated};

pub const DEFAULT_COUNTRY: &str = "US";

/// One day of a country timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDay {
    pub date: NaiveDate,
    pub cases: Option<f64>,
    pub deaths: Option<f64>,
    pub recovered: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
    code: String,
    #[serde(default)]
    population: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CountryDetail {
    #[serde(default)]
    timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize)]
struct TimelineEntry {
    date: String,
    #[serde(default)]
    new_confirmed: Option<f64>,
    #[serde(default)]
    new_deaths: Option<f64>,
    #[serde(default)]
    new_recovered: Option<f64>,
    /// Set whenever the key is present, whatever its value.
    #[serde(default, deserialize_with = "key_present")]
    is_in_progress: bool,
}

fn key_present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

/// Drop the partial current day and order by date.
fn parse_timeline(entries: Vec<TimelineEntry>) -> DashboardResult<Vec<CountryDay>> {
    let mut days = entries
        .into_iter()
        .filter(|e| !e.is_in_progress)
        .map(|e| -> DashboardResult<CountryDay> {
            let date = e
                .date
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .ok_or_else(|| DashboardError::Decode(format!("invalid timeline date '{}'", e.date)))?;
            Ok(CountryDay {
                date,
                cases: e.new_confirmed,
                deaths: e.new_deaths,
                recovered: e.new_recovered,
            })
        })
        .collect::<DashboardResult<Vec<_>>>()?;

    days.sort_by_key(|d| d.date);
    Ok(days)
}

/// Country groups offered as ready-made comparisons.
pub fn preset_codes(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "scandinavia" => Some(&["SE", "NO", "DK"]),
        "north_america" => Some(&["US", "CA", "MX"]),
        "europe" => Some(&["GB", "FR", "ES", "DE"]),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct PlotRow {
    dt: NaiveDate,
    cases: Option<f64>,
    deaths: Option<f64>,
    croll: Option<f64>,
    droll: Option<f64>,
    #[serde(flatten)]
    tags: LegendTags,
}

impl Dated for PlotRow {
    fn date(&self) -> NaiveDate {
        self.dt
    }
}

#[derive(Debug, Serialize)]
struct CompareRow {
    dt: NaiveDate,
    croll: Option<f64>,
    droll: Option<f64>,
    #[serde(rename = "Country")]
    country: String,
}

impl Dated for CompareRow {
    fn date(&self) -> NaiveDate {
        self.dt
    }
}

fn column(days: &[CountryDay], pick: impl Fn(&CountryDay) -> Option<f64>) -> Vec<Option<f64>> {
    days.iter().map(pick).collect()
}

/// Daily cases and deaths with rolling averages for one country.
pub fn plot_chart(
    country: &RegionRecord,
    days: &[CountryDay],
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let croll = rolling_mean(&column(days, |d| d.cases), charts.rolling_window);
    let droll = rolling_mean(&column(days, |d| d.deaths), charts.rolling_window);

    let rows = since(
        days.iter().zip(croll).zip(droll).map(|((day, croll), droll)| PlotRow {
            dt: day.date,
            cases: day.cases,
            deaths: day.deaths,
            croll,
            droll,
            tags: LegendTags::default(),
        }),
        start,
    );

    let top = legend_panel(&Panel::new("cases", "croll", "Cases"))
        .size(charts.width, charts.height)
        .title(country.name.clone());
    let bottom = grey_panel(&Panel::new("deaths", "droll", "Fatalities"))
        .size(charts.width, charts.height);

    Ok(ChartSpec::new(&rows, View::vconcat(vec![top, bottom]))?.without_legend_title())
}

/// Per-capita rolling cases and deaths, one line per country.
pub fn compare_chart(
    series: &[(RegionRecord, Vec<CountryDay>)],
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let mut rows = Vec::new();

    for (country, days) in series {
        let croll = rolling_mean(&column(days, |d| d.cases), charts.rolling_window);
        let droll = rolling_mean(&column(days, |d| d.deaths), charts.rolling_window);

        let scaled = days.iter().zip(croll).zip(droll).map(|((day, c), d)| CompareRow {
            dt: day.date,
            croll: per_capita(c, country.population),
            droll: per_capita(d, country.population),
            country: country.name.clone(),
        });
        rows.extend(since(scaled, start));
    }

    let lines = |field: &str, title: &str| {
        View::unit(
            Mark::line(),
            Encoding::xy(
                Channel::temporal("dt").title("Date"),
                Channel::quantitative(field).title(title),
            )
            .color(Channel::nominal("Country")),
        )
        .size(charts.width, charts.height)
    };

    let view = View::vconcat(vec![
        lines("croll", "Cases per 100,000"),
        lines("droll", "Fatalities per 100,000"),
    ]);
    Ok(ChartSpec::new(&rows, view)?.without_legend_title())
}

/// Driver for country charts.
#[derive(Clone)]
pub struct CountryDriver {
    ctx: DriverContext,
}

impl CountryDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    /// Country list with populations.
    pub async fn fetch_countries(&self) -> DashboardResult<Vec<RegionRecord>> {
        self.ctx
            .cache
            .get_or_fetch(COUNTRY_HASH, MAIN_TABLE, || async {
                let envelope: Envelope<Vec<CountryEntry>> = self
                    .ctx
                    .upstream
                    .get_json("country_list", &self.ctx.sources.country_list_url)
                    .await?;

                Ok(envelope
                    .data
                    .into_iter()
                    .map(|c| RegionRecord {
                        code: c.code,
                        name: c.name,
                        population: c.population,
                    })
                    .collect::<Vec<_>>())
            })
            .await
    }

    /// Daily timeline for one country, oldest first.
    pub async fn fetch_timeline(&self, code: &str) -> DashboardResult<Vec<CountryDay>> {
        self.ctx
            .cache
            .get_or_fetch(COUNTRY_HASH, code, || async {
                let url = self.ctx.sources.country_timeline(code);
                let envelope: Envelope<CountryDetail> = self
                    .ctx
                    .upstream
                    .get_json("country_timeline", &url)
                    .await?;
                parse_timeline(envelope.data.timeline)
            })
            .await
    }

    async fn region(&self, code: &str) -> DashboardResult<RegionRecord> {
        let countries = self.fetch_countries().await?;
        find_region(&countries, code)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound(format!("country '{code}'")))
    }

    pub async fn menu(&self) -> DashboardResult<CodeMenu> {
        let countries = self.fetch_countries().await?;
        Ok(CodeMenu::from_regions(&countries, DEFAULT_COUNTRY))
    }

    pub async fn plot(&self, code: &str, since: Option<NaiveDate>) -> DashboardResult<ChartSpec> {
        let country = self.region(code).await?;
        let days = self.fetch_timeline(&country.code).await?;
        plot_chart(&country, &days, self.ctx.window_start(since), &self.ctx.charts)
    }

    pub async fn compare(&self, codes: &[String], since: Option<NaiveDate>) -> DashboardResult<ChartSpec> {
        if codes.is_empty() {
            return Err(DashboardError::BadRequest("no country codes given".to_string()));
        }

        let mut series = Vec::with_capacity(codes.len());
        for code in codes {
            let country = self.region(code).await?;
            let days = self.fetch_timeline(&country.code).await?;
            series.push((country, days));
        }

        compare_chart(&series, self.ctx.window_start(since), &self.ctx.charts)
    }

    pub async fn preset(&self, name: &str, since: Option<NaiveDate>) -> DashboardResult<ChartSpec> {
        let codes = preset_codes(name)
            .ok_or_else(|| DashboardError::NotFound(format!("preset '{name}'")))?;
        let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        self.compare(&codes, since).await
    }
}
