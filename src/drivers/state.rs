//! US state statistics.
//!
//! The daily table comes from a single CSV covering every state; population
//! comes from two local CSVs joined on the state name and is cached
//! permanently. All charts are built from those two tables.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::chart::layouts::REGION_SELECTION;
use crate::chart::{
    grey_panel, legend_panel, region_lines, region_selection, Channel, ChartSpec, Encoding,
    LegendTags, Mark, Panel, View,
};
use crate::config::ChartConfig;
use crate::drivers::{find_region, CodeMenu, DriverContext, RegionRecord, MAIN_TABLE, STATE_HASH};
use crate::error::{DashboardError, DashboardResult};
use crate::transform::{
    group_by, max_value, per_capita, ratio, rolling_mean, rolling_ratio, since, top_n, Dated,
};
use crate::upstream::parse_csv;

pub const DEFAULT_STATE: &str = "CA";

/// Field of the permanent population table.
pub const POPULATION_TABLE: &str = "population";

pub const POPULATION_FILE: &str = "pop-est2019.csv";
pub const ABBREVIATION_FILE: &str = "state-abbre.csv";

/// States always shown in the "big four" comparison.
pub const BIG_FOUR: [&str; 4] = ["TX", "CA", "NY", "FL"];

const TOP_CASES: usize = 4;
const TOP_FATALITIES: usize = 5;

/// Positivity axes always reach at least this fraction.
const MIN_POSITIVITY_DOMAIN: f64 = 0.4;
/// Trailing rows inspected when extending the positivity axis.
const POSITIVITY_LOOKBACK: usize = 14;

/// One state on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDay {
    pub date: NaiveDate,
    pub state: String,
    pub cases: Option<f64>,
    pub deaths: Option<f64>,
    pub tests: Option<f64>,
    pub hospitalized: Option<f64>,
}

impl Dated for StateDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyRow {
    date: u32,
    state: String,
    #[serde(default)]
    positive_increase: Option<f64>,
    #[serde(default)]
    death_increase: Option<f64>,
    #[serde(default)]
    total_test_results_increase: Option<f64>,
    #[serde(default)]
    hospitalized_currently: Option<f64>,
}

/// Decode a `YYYYMMDD` integer date.
pub fn parse_compact_date(raw: u32) -> DashboardResult<NaiveDate> {
    NaiveDate::from_ymd_opt((raw / 10_000) as i32, (raw % 10_000) / 100, raw % 100)
        .ok_or_else(|| DashboardError::Decode(format!("invalid date '{raw}'")))
}

impl TryFrom<DailyRow> for StateDay {
    type Error = DashboardError;

    fn try_from(row: DailyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            date: parse_compact_date(row.date)?,
            state: row.state,
            cases: row.positive_increase,
            deaths: row.death_increase,
            tests: row.total_test_results_increase,
            hospitalized: row.hospitalized_currently,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PopulationRow {
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "POPESTIMATE2010")]
    population: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AbbreviationRow {
    #[serde(rename = "State")]
    name: String,
    #[serde(rename = "Code")]
    code: String,
}

/// Inner join of population estimates and postal codes on the state name.
fn join_population(population: Vec<PopulationRow>, names: Vec<AbbreviationRow>) -> Vec<RegionRecord> {
    let codes: BTreeMap<String, String> = names.into_iter().map(|n| (n.name, n.code)).collect();

    population
        .into_iter()
        .filter_map(|row| {
            codes.get(&row.name).map(|code| RegionRecord {
                code: code.clone(),
                name: row.name,
                population: row.population,
            })
        })
        .collect()
}

async fn read_table<T: DeserializeOwned>(path: &Path) -> DashboardResult<Vec<T>> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| DashboardError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_csv(&body)
}

/// Bottom panel of the single-state chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotMode {
    #[default]
    Deaths,
    Tests,
    Hospitalizations,
}

impl PlotMode {
    /// `T` for tests, `H` for hospitalizations; anything else shows deaths.
    pub fn from_letter(mode: &str) -> Self {
        match mode {
            "T" => Self::Tests,
            "H" => Self::Hospitalizations,
            _ => Self::Deaths,
        }
    }
}

/// Quantity compared across states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cases,
    Fatalities,
}

impl FromStr for Metric {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cases" => Ok(Self::Cases),
            "fatalities" => Ok(Self::Fatalities),
            other => Err(DashboardError::BadRequest(format!("unknown metric '{other}'"))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cases => write!(f, "cases"),
            Self::Fatalities => write!(f, "fatalities"),
        }
    }
}

impl Metric {
    fn pick(self, day: &StateDay) -> Option<f64> {
        match self {
            Self::Cases => day.cases,
            Self::Fatalities => day.deaths,
        }
    }

    fn rolling_title(self, capita: bool) -> &'static str {
        match (self, capita) {
            (Self::Cases, false) => "Cases, 7 day rolling average",
            (Self::Cases, true) => "Cases per 100,000, 7 day rolling average",
            (Self::Fatalities, false) => "Daily fatalities, 7 day rolling average",
            (Self::Fatalities, true) => "Fatalities per 100,000, 7 day rolling average",
        }
    }
}

#[derive(Debug, Serialize)]
struct PlotRow {
    dt: NaiveDate,
    #[serde(rename = "positiveIncrease", skip_serializing_if = "Option::is_none")]
    cases: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    croll: Option<f64>,
    #[serde(rename = "deathIncrease", skip_serializing_if = "Option::is_none")]
    deaths: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    droll: Option<f64>,
    #[serde(rename = "totalTestResultsIncrease", skip_serializing_if = "Option::is_none")]
    tests: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    troll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fpos: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    froll: Option<f64>,
    #[serde(rename = "hospitalizedCurrently", skip_serializing_if = "Option::is_none")]
    hospitalized: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hroll: Option<f64>,
    #[serde(flatten)]
    tags: LegendTags,
}

impl Dated for PlotRow {
    fn date(&self) -> NaiveDate {
        self.dt
    }
}

impl PlotRow {
    fn new(day: &StateDay) -> Self {
        Self {
            dt: day.date,
            cases: day.cases,
            croll: None,
            deaths: None,
            droll: None,
            tests: None,
            troll: None,
            fpos: None,
            froll: None,
            hospitalized: None,
            hroll: None,
            tags: LegendTags::default(),
        }
    }
}

fn column(days: &[StateDay], pick: impl Fn(&StateDay) -> Option<f64>) -> Vec<Option<f64>> {
    days.iter().map(pick).collect()
}

/// Two-panel chart for one state; `days` must be sorted by date.
pub fn plot_chart(
    state: &RegionRecord,
    days: &[StateDay],
    mode: PlotMode,
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let window = charts.rolling_window;
    let cases = column(days, |d| d.cases);
    let croll = rolling_mean(&cases, window);

    let mut rows: Vec<PlotRow> = days.iter().map(PlotRow::new).collect();

    match mode {
        PlotMode::Tests => {
            let tests = column(days, |d| d.tests);
            let troll = rolling_mean(&tests, window);
            let froll = rolling_ratio(&cases, &tests, window);
            for (i, row) in rows.iter_mut().enumerate() {
                row.tests = tests[i];
                row.troll = troll[i];
                row.fpos = ratio(cases[i], tests[i]);
                row.froll = froll[i];
            }
        }
        PlotMode::Hospitalizations => {
            let hospitalized = column(days, |d| d.hospitalized);
            let hroll = rolling_mean(&hospitalized, window);
            for (i, row) in rows.iter_mut().enumerate() {
                row.croll = croll[i];
                row.hospitalized = hospitalized[i];
                row.hroll = hroll[i];
            }
        }
        PlotMode::Deaths => {
            let deaths = column(days, |d| d.deaths);
            let droll = rolling_mean(&deaths, window);
            for (i, row) in rows.iter_mut().enumerate() {
                row.croll = croll[i];
                row.deaths = deaths[i];
                row.droll = droll[i];
            }
        }
    }

    let rows = since(rows, start);

    let cases_panel = Panel::new("positiveIncrease", "croll", "Cases");
    let (top, bottom) = match mode {
        PlotMode::Tests => {
            let top = Panel::new("totalTestResultsIncrease", "troll", "Tests")
                .bounded(max_value(rows.iter().map(|r| r.tests)));
            let recent = rows.iter().rev().take(POSITIVITY_LOOKBACK).map(|r| r.froll);
            let ceiling = max_value(recent).map_or(MIN_POSITIVITY_DOMAIN, |m| m.max(MIN_POSITIVITY_DOMAIN));
            let bottom = Panel::new("fpos", "froll", "Fraction positive").bounded(Some(ceiling));
            (legend_panel(&top), grey_panel(&bottom))
        }
        PlotMode::Hospitalizations => {
            let bottom = Panel::new("hospitalizedCurrently", "hroll", "Hospitalizations")
                .bounded(max_value(rows.iter().map(|r| r.hospitalized)));
            (legend_panel(&cases_panel), grey_panel(&bottom))
        }
        PlotMode::Deaths => {
            let bottom = Panel::new("deathIncrease", "droll", "Fatalities")
                .bounded(max_value(rows.iter().map(|r| r.deaths)));
            (legend_panel(&cases_panel), grey_panel(&bottom))
        }
    };

    let view = View::vconcat(vec![
        top.size(charts.width, charts.height).title(state.name.clone()),
        bottom.size(charts.width, charts.height),
    ]);
    Ok(ChartSpec::new(&rows, view)?.without_legend_title())
}

/// Per-state series keyed by postal code, each sorted by date.
pub type StateSeries = BTreeMap<String, Vec<StateDay>>;

fn population_of(populations: &[RegionRecord], code: &str) -> Option<f64> {
    find_region(populations, code).and_then(|r| r.population)
}

/// Values of `metric` for one state, optionally per 100,000 residents.
fn metric_values(days: &[StateDay], metric: Metric, population: Option<f64>, capita: bool) -> Vec<Option<f64>> {
    days.iter()
        .map(|d| {
            let value = metric.pick(d);
            if capita {
                per_capita(value, population)
            } else {
                value
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct RankRow<'a> {
    dt: NaiveDate,
    state: &'a str,
    daily: Option<f64>,
    roll: Option<f64>,
}

impl Dated for RankRow<'_> {
    fn date(&self) -> NaiveDate {
        self.dt
    }
}

/// Newest present value; blank trailing cells are skipped.
fn latest(values: &[Option<f64>]) -> Option<f64> {
    values.iter().rev().flatten().next().copied()
}

fn ranked_rows<'a>(
    series: &'a StateSeries,
    codes: &[String],
    populations: &[RegionRecord],
    metric: Metric,
    capita: bool,
    start: NaiveDate,
    window: usize,
) -> Vec<RankRow<'a>> {
    let mut rows = Vec::new();
    for (code, days) in series.iter().filter(|(code, _)| codes.contains(*code)) {
        let values = metric_values(days, metric, population_of(populations, code), capita);
        let roll = rolling_mean(&values, window);
        let ranked = days.iter().zip(values).zip(roll).map(|((day, daily), roll)| RankRow {
            dt: day.date,
            state: code,
            daily,
            roll,
        });
        rows.extend(since(ranked, start));
    }
    rows
}

/// The four states with the highest most recent daily cases.
pub fn top_cases_chart(
    series: &StateSeries,
    populations: &[RegionRecord],
    capita: bool,
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let latest = series.iter().map(|(code, days)| {
        let values = metric_values(days, Metric::Cases, population_of(populations, code), capita);
        (code.clone(), latest(&values))
    });
    let worst = top_n(latest, TOP_CASES);

    let rows = ranked_rows(series, &worst, populations, Metric::Cases, capita, start, charts.rolling_window);

    let (daily_title, roll_title, title) = if capita {
        ("Cases per 100,000", Metric::Cases.rolling_title(true), "Top states in new cases per capita")
    } else {
        ("Cases", Metric::Cases.rolling_title(false), "Top states in new cases")
    };

    let top = region_lines("daily", daily_title, "state", max_value(rows.iter().map(|r| r.daily)), true)
        .size(charts.width, charts.height)
        .title(title);
    let bottom = region_lines("roll", roll_title, "state", max_value(rows.iter().map(|r| r.roll)), false)
        .size(charts.width, charts.height);

    let view = View::vconcat(vec![top, bottom]).select(REGION_SELECTION, region_selection("state"));
    ChartSpec::new(&rows, view)
}

/// The five states with the highest most recent rolling fatalities.
pub fn top_fatalities_chart(
    series: &StateSeries,
    populations: &[RegionRecord],
    capita: bool,
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let latest = series.iter().map(|(code, days)| {
        let values = metric_values(days, Metric::Fatalities, population_of(populations, code), capita);
        let roll = rolling_mean(&values, charts.rolling_window);
        (code.clone(), latest(&roll))
    });
    let worst = top_n(latest, TOP_FATALITIES);

    let rows = ranked_rows(series, &worst, populations, Metric::Fatalities, capita, start, charts.rolling_window);
    let title = if capita {
        "Top states in 7 day fatalities per capita"
    } else {
        "Top states in 7 day fatalities"
    };

    rolling_view(&rows, Metric::Fatalities, capita, charts, Some(title))
}

/// Rolling `metric` for Texas, California, New York and Florida.
pub fn big_four_chart(
    series: &StateSeries,
    populations: &[RegionRecord],
    metric: Metric,
    capita: bool,
    start: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let codes: Vec<String> = BIG_FOUR.iter().map(|c| c.to_string()).collect();
    let rows = ranked_rows(series, &codes, populations, metric, capita, start, charts.rolling_window);
    rolling_view(&rows, metric, capita, charts, None)
}

fn rolling_view(
    rows: &[RankRow<'_>],
    metric: Metric,
    capita: bool,
    charts: &ChartConfig,
    title: Option<&str>,
) -> DashboardResult<ChartSpec> {
    let view = region_lines(
        "roll",
        metric.rolling_title(capita),
        "state",
        max_value(rows.iter().map(|r| r.roll)),
        false,
    )
    .size(charts.width, charts.tall_height)
    .select(REGION_SELECTION, region_selection("state"));

    let view = match title {
        Some(title) => view.title(title),
        None => view,
    };
    ChartSpec::new(rows, view)
}

#[derive(Debug, Serialize)]
struct BarRow<'a> {
    state: &'a str,
    #[serde(rename = "deathIncrease")]
    deaths: Option<f64>,
    dper: Option<f64>,
}

/// Latest rolling fatalities for every state with a known population.
pub fn death_bar_chart(
    series: &StateSeries,
    populations: &[RegionRecord],
    today: NaiveDate,
    charts: &ChartConfig,
) -> DashboardResult<ChartSpec> {
    let rows: Vec<BarRow<'_>> = series
        .iter()
        .filter_map(|(code, days)| {
            let region = find_region(populations, code)?;
            let roll = rolling_mean(&column(days, |d| d.deaths), charts.rolling_window);
            let deaths = roll.last().copied().flatten();
            Some(BarRow {
                state: code,
                deaths,
                dper: per_capita(deaths, region.population),
            })
        })
        .collect();

    let bars = |field: &str, title: &str| {
        View::unit(
            Mark::bar(),
            Encoding::xy(
                Channel::nominal("state").title("State"),
                Channel::quantitative(field).title(title),
            ),
        )
        .size(charts.bar_width, charts.height)
    };

    let view = View::vconcat(vec![
        bars("deathIncrease", "Fatalities").title(format!("7 day average {today}")),
        bars("dper", "Fatalities / 100,000 population"),
    ]);
    ChartSpec::new(&rows, view)
}

/// Driver for state charts.
#[derive(Clone)]
pub struct StateDriver {
    ctx: DriverContext,
}

impl StateDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    /// Every state on every day.
    pub async fn fetch_daily(&self) -> DashboardResult<Vec<StateDay>> {
        self.ctx
            .cache
            .get_or_fetch(STATE_HASH, MAIN_TABLE, || async {
                let rows: Vec<DailyRow> = self
                    .ctx
                    .upstream
                    .get_csv("state_daily", &self.ctx.sources.state_daily_url)
                    .await?;
                rows.into_iter()
                    .map(StateDay::try_from)
                    .collect::<DashboardResult<Vec<_>>>()
            })
            .await
    }

    /// State codes, names and 2010 population estimates.
    pub async fn fetch_population(&self) -> DashboardResult<Vec<RegionRecord>> {
        self.ctx
            .cache
            .get_or_build(STATE_HASH, POPULATION_TABLE, || async {
                let dir = Path::new(&self.ctx.sources.data_dir);
                let population: Vec<PopulationRow> = read_table(&dir.join(POPULATION_FILE)).await?;
                let names: Vec<AbbreviationRow> = read_table(&dir.join(ABBREVIATION_FILE)).await?;
                Ok(join_population(population, names))
            })
            .await
    }

    async fn series(&self) -> DashboardResult<StateSeries> {
        let days = self.fetch_daily().await?;
        Ok(group_by(days, |d| d.state.clone()))
    }

    /// Daily rows for one state, oldest first.
    pub async fn fetch_state(&self, code: &str) -> DashboardResult<Vec<StateDay>> {
        let mut days: Vec<StateDay> = self
            .fetch_daily()
            .await?
            .into_iter()
            .filter(|d| d.state == code)
            .collect();
        days.sort_by_key(|d| d.date);
        Ok(days)
    }

    pub async fn menu(&self) -> DashboardResult<CodeMenu> {
        let population = self.fetch_population().await?;
        Ok(CodeMenu::from_regions(&population, DEFAULT_STATE))
    }

    pub async fn plot(&self, code: &str, mode: PlotMode, since: Option<NaiveDate>) -> DashboardResult<ChartSpec> {
        let population = self.fetch_population().await?;
        let state = find_region(&population, code)
            .ok_or_else(|| DashboardError::NotFound(format!("state '{code}'")))?;
        let days = self.fetch_state(code).await?;
        plot_chart(state, &days, mode, self.ctx.window_start(since), &self.ctx.charts)
    }

    pub async fn top_cases(&self, capita: bool) -> DashboardResult<ChartSpec> {
        let series = self.series().await?;
        let population = self.fetch_population().await?;
        top_cases_chart(&series, &population, capita, self.ctx.charts.start_date, &self.ctx.charts)
    }

    pub async fn top_fatalities(&self, capita: bool) -> DashboardResult<ChartSpec> {
        let series = self.series().await?;
        let population = self.fetch_population().await?;
        top_fatalities_chart(&series, &population, capita, self.ctx.charts.start_date, &self.ctx.charts)
    }

    pub async fn big_four(&self, metric: Metric, capita: bool) -> DashboardResult<ChartSpec> {
        let series = self.series().await?;
        let population = self.fetch_population().await?;
        big_four_chart(&series, &population, metric, capita, self.ctx.charts.start_date, &self.ctx.charts)
    }

    pub async fn death_bar(&self, today: NaiveDate) -> DashboardResult<ChartSpec> {
        let series = self.series().await?;
        let population = self.fetch_population().await?;
        death_bar_chart(&series, &population, today, &self.ctx.charts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn date(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + chrono::Days::new(offset)
    }

    /// `n` days for `state`; cases grow by `step` per day.
    fn days(state: &str, n: u64, step: f64) -> Vec<StateDay> {
        (0..n)
            .map(|i| StateDay {
                date: date(i),
                state: state.to_string(),
                cases: Some(step * (i + 1) as f64),
                deaths: Some(step),
                tests: Some(100.0 * step * (i + 1) as f64),
                hospitalized: Some(i as f64),
            })
            .collect()
    }

    fn region(code: &str, name: &str, population: f64) -> RegionRecord {
        RegionRecord {
            code: code.into(),
            name: name.into(),
            population: Some(population),
        }
    }

    fn fixture() -> (StateSeries, Vec<RegionRecord>) {
        let mut all = Vec::new();
        all.extend(days("CA", 10, 5.0));
        all.extend(days("TX", 10, 4.0));
        all.extend(days("NY", 10, 3.0));
        all.extend(days("FL", 10, 2.0));
        all.extend(days("WA", 10, 1.0));
        let series = group_by(all, |d| d.state.clone());

        let populations = vec![
            region("CA", "California", 40_000_000.0),
            region("TX", "Texas", 30_000_000.0),
            region("NY", "New York", 20_000_000.0),
            region("FL", "Florida", 20_000_000.0),
            region("WA", "Washington", 100_000.0),
        ];
        (series, populations)
    }

    fn states_in(value: &Value) -> Vec<String> {
        let mut states: Vec<String> = value["data"]["values"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["state"].as_str().unwrap().to_string())
            .collect();
        states.dedup();
        states
    }

    #[test]
    fn test_parse_compact_date() {
        assert_eq!(parse_compact_date(20200415).unwrap(), NaiveDate::from_ymd_opt(2020, 4, 15).unwrap());
        assert!(matches!(parse_compact_date(20201341), Err(DashboardError::Decode(_))));
    }

    #[test]
    fn test_daily_rows_from_csv() {
        let body = b"date,state,positiveIncrease,deathIncrease,totalTestResultsIncrease,hospitalizedCurrently\n\
            20200302,CA,10,1,200,\n";
        let rows: Vec<DailyRow> = parse_csv(body).unwrap();
        let day = StateDay::try_from(rows.into_iter().next().unwrap()).unwrap();

        assert_eq!(day.date, date(1));
        assert_eq!(day.cases, Some(10.0));
        assert_eq!(day.tests, Some(200.0));
        assert_eq!(day.hospitalized, None);
    }

    #[test]
    fn test_join_population_drops_unmatched_names() {
        let population: Vec<PopulationRow> =
            parse_csv(b"NAME,POPESTIMATE2010,POPESTIMATE2019\nCalifornia,37000000,39500000\nPuerto Rico,3700000,3200000\n")
                .unwrap();
        let names: Vec<AbbreviationRow> =
            parse_csv(b"State,Abbrev,Code\nCalifornia,Calif.,CA\nTexas,Tex.,TX\n").unwrap();

        let joined = join_population(population, names);
        assert_eq!(joined, vec![region("CA", "California", 37_000_000.0)]);
    }

    #[test]
    fn test_plot_mode_letters() {
        assert_eq!(PlotMode::from_letter("T"), PlotMode::Tests);
        assert_eq!(PlotMode::from_letter("H"), PlotMode::Hospitalizations);
        assert_eq!(PlotMode::from_letter("D"), PlotMode::Deaths);
        assert_eq!(PlotMode::from_letter("zzz"), PlotMode::Deaths);
        assert_eq!("cases".parse::<Metric>().unwrap(), Metric::Cases);
        assert!("recoveries".parse::<Metric>().is_err());
    }

    #[test]
    fn test_plot_deaths_mode() {
        let charts = ChartConfig::default();
        let ca = days("CA", 10, 5.0);
        let spec = plot_chart(&region("CA", "California", 1.0), &ca, PlotMode::Deaths, date(2), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        let rows = value["data"]["values"].as_array().unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(value["vconcat"][0]["title"], "California");
        assert_eq!(value["vconcat"][1]["layer"][0]["encoding"]["y"]["field"], "deathIncrease");
        assert_eq!(
            value["vconcat"][1]["layer"][0]["encoding"]["y"]["scale"]["domain"],
            json!([0.0, 5.0])
        );
        // Day 6 is the first full window.
        assert!(rows[3].get("croll").is_none());
        assert_eq!(rows[4]["croll"], 20.0);
        assert!(rows[0].get("hroll").is_none());
        assert_eq!(value["config"]["legend"]["title"], Value::Null);
    }

    #[test]
    fn test_plot_tests_mode_positivity_floor() {
        let charts = ChartConfig::default();
        let ca = days("CA", 10, 5.0);
        let spec = plot_chart(&region("CA", "California", 1.0), &ca, PlotMode::Tests, date(0), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        let rows = value["data"]["values"].as_array().unwrap();
        // Positivity is a constant 1%, below the floor.
        assert_eq!(rows[9]["fpos"], 0.01);
        assert_eq!(
            value["vconcat"][1]["layer"][0]["encoding"]["y"]["scale"]["domain"],
            json!([0.0, 0.4])
        );
        assert_eq!(
            value["vconcat"][0]["layer"][0]["encoding"]["y"]["scale"]["domain"],
            json!([0.0, 5000.0])
        );
        assert_eq!(value["vconcat"][0]["layer"][0]["encoding"]["y"]["title"], "Tests");
    }

    /// Daily tests fixed at 1000; positivity is 60% for the first
    /// `spike_days` days and 10% afterwards.
    fn positivity_days(n: u64, spike_days: u64) -> Vec<StateDay> {
        (0..n)
            .map(|i| StateDay {
                date: date(i),
                state: "CA".to_string(),
                cases: Some(if i < spike_days { 600.0 } else { 100.0 }),
                deaths: Some(1.0),
                tests: Some(1000.0),
                hospitalized: None,
            })
            .collect()
    }

    fn positivity_domain(days: &[StateDay]) -> Value {
        let charts = ChartConfig::default();
        let spec = plot_chart(&region("CA", "California", 1.0), days, PlotMode::Tests, date(0), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();
        value["vconcat"][1]["layer"][0]["encoding"]["y"]["scale"]["domain"].clone()
    }

    #[test]
    fn test_positivity_domain_grows_with_recent_spike() {
        let days = positivity_days(12, 10);
        assert_eq!(positivity_domain(&days), json!([0.0, 0.6]));
    }

    #[test]
    fn test_positivity_domain_ignores_spike_outside_lookback() {
        // Rolling windows touching the spike end on day 15; the last 14
        // rows start at day 16.
        let days = positivity_days(30, 10);
        assert_eq!(positivity_domain(&days), json!([0.0, 0.4]));
    }

    #[test]
    fn test_ranking_skips_blank_newest_cell() {
        let (mut series, populations) = fixture();
        if let Some(last) = series.get_mut("CA").and_then(|days| days.last_mut()) {
            last.cases = None;
        }
        let charts = ChartConfig::default();

        let spec = top_cases_chart(&series, &populations, false, date(0), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(states_in(&value), vec!["CA", "FL", "NY", "TX"]);
    }

    #[test]
    fn test_latest_present_value() {
        assert_eq!(latest(&[Some(1.0), Some(2.0), None]), Some(2.0));
        assert_eq!(latest(&[None, None]), None);
    }

    #[test]
    fn test_plot_hospitalization_mode() {
        let charts = ChartConfig::default();
        let ca = days("CA", 10, 5.0);
        let spec =
            plot_chart(&region("CA", "California", 1.0), &ca, PlotMode::Hospitalizations, date(0), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(
            value["vconcat"][1]["layer"][0]["encoding"]["y"]["field"],
            "hospitalizedCurrently"
        );
        assert_eq!(value["data"]["values"][9]["hroll"], 6.0);
    }

    #[test]
    fn test_top_cases_by_latest_value() {
        let (series, populations) = fixture();
        let charts = ChartConfig::default();

        let absolute = top_cases_chart(&series, &populations, false, date(0), &charts).unwrap();
        let value = serde_json::to_value(&absolute).unwrap();
        assert_eq!(states_in(&value), vec!["CA", "FL", "NY", "TX"]);
        assert_eq!(value["vconcat"][0]["title"], "Top states in new cases");
        assert!(value["vconcat"][0]["selection"]["region"].is_object());

        // Washington has few residents, so it leads per capita.
        let capita = top_cases_chart(&series, &populations, true, date(0), &charts).unwrap();
        let value = serde_json::to_value(&capita).unwrap();
        assert!(states_in(&value).contains(&"WA".to_string()));
        assert_eq!(value["vconcat"][1]["encoding"]["y"]["title"], "Cases per 100,000, 7 day rolling average");
    }

    #[test]
    fn test_top_fatalities_single_view() {
        let (series, populations) = fixture();
        let charts = ChartConfig::default();

        let spec = top_fatalities_chart(&series, &populations, false, date(0), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(states_in(&value).len(), 5);
        assert_eq!(value["height"], 300);
        assert_eq!(value["title"], "Top states in 7 day fatalities");
        assert!(value["selection"]["region"].is_object());
        assert_eq!(value["encoding"]["y"]["scale"]["domain"], json!([0.0, 5.0]));
    }

    #[test]
    fn test_big_four_excludes_other_states() {
        let (series, populations) = fixture();
        let charts = ChartConfig::default();

        let spec = big_four_chart(&series, &populations, Metric::Fatalities, true, date(0), &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(states_in(&value), vec!["CA", "FL", "NY", "TX"]);
        assert_eq!(
            value["encoding"]["y"]["title"],
            "Fatalities per 100,000, 7 day rolling average"
        );
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_death_bar() {
        let (series, populations) = fixture();
        let charts = ChartConfig::default();
        let today = NaiveDate::from_ymd_opt(2020, 7, 4).unwrap();

        let spec = death_bar_chart(&series, &populations, today, &charts).unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        let rows = value["data"]["values"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        let wa = rows.iter().find(|r| r["state"] == "WA").unwrap();
        assert_eq!(wa["deathIncrease"], 1.0);
        assert_eq!(wa["dper"], 1.0);
        assert_eq!(value["vconcat"][0]["title"], "7 day average 2020-07-04");
        assert_eq!(value["vconcat"][0]["width"], 600);
        assert_eq!(value["vconcat"][1]["mark"]["type"], "bar");
    }
}
