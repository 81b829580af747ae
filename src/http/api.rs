//! JSON API: chart specs and region menus.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::chart::ChartSpec;
use crate::drivers::country::DEFAULT_COUNTRY;
use crate::drivers::county::{CountyMenu, DEFAULT_COUNTY};
use crate::drivers::state::{Metric, PlotMode, DEFAULT_STATE};
use crate::drivers::CodeMenu;
use crate::error::DashboardResult;
use crate::http::server::AppState;

/// Query for single-region graphs.
#[derive(Debug, Default, Deserialize)]
pub struct GraphQuery {
    pub code: Option<String>,
    pub since: Option<NaiveDate>,
    /// State plot mode letter.
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated country codes.
    #[serde(default)]
    pub codes: String,
    pub since: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CapitaQuery {
    #[serde(default)]
    pub capita: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SinceQuery {
    pub since: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/country/graph", get(country_graph))
        .route("/api/country/compare", get(country_compare))
        .route("/api/country/preset/{name}", get(country_preset))
        .route("/api/country/menu", get(country_menu))
        .route("/api/state/graph", get(state_graph))
        .route("/api/state/menu", get(state_menu))
        .route("/api/state/top/cases", get(state_top_cases))
        .route("/api/state/top/fatalities", get(state_top_fatalities))
        .route("/api/state/big-four/{metric}", get(state_big_four))
        .route("/api/state/deaths-bar", get(state_deaths_bar))
        .route("/api/county/graph", get(county_graph))
        .route("/api/county/menu", get(county_menu))
}

/// Split `SE, NO,DK` into trimmed, non-empty codes.
pub fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

async fn country_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    let code = query.code.as_deref().unwrap_or(DEFAULT_COUNTRY);
    Ok(Json(state.inner.country.plot(code, query.since).await?))
}

async fn country_compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    let codes = split_codes(&query.codes);
    Ok(Json(state.inner.country.compare(&codes, query.since).await?))
}

async fn country_preset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SinceQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    Ok(Json(state.inner.country.preset(&name, query.since).await?))
}

async fn country_menu(State(state): State<AppState>) -> DashboardResult<Json<CodeMenu>> {
    Ok(Json(state.inner.country.menu().await?))
}

async fn state_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    let code = query.code.as_deref().unwrap_or(DEFAULT_STATE);
    let mode = PlotMode::from_letter(query.mode.as_deref().unwrap_or_default());
    Ok(Json(state.inner.states.plot(code, mode, query.since).await?))
}

async fn state_menu(State(state): State<AppState>) -> DashboardResult<Json<CodeMenu>> {
    Ok(Json(state.inner.states.menu().await?))
}

async fn state_top_cases(
    State(state): State<AppState>,
    Query(query): Query<CapitaQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    Ok(Json(state.inner.states.top_cases(query.capita).await?))
}

async fn state_top_fatalities(
    State(state): State<AppState>,
    Query(query): Query<CapitaQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    Ok(Json(state.inner.states.top_fatalities(query.capita).await?))
}

async fn state_big_four(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(query): Query<CapitaQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    let metric: Metric = metric.parse()?;
    Ok(Json(state.inner.states.big_four(metric, query.capita).await?))
}

async fn state_deaths_bar(State(state): State<AppState>) -> DashboardResult<Json<ChartSpec>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.inner.states.death_bar(today).await?))
}

async fn county_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> DashboardResult<Json<ChartSpec>> {
    let code = query.code.as_deref().unwrap_or(DEFAULT_COUNTY);
    Ok(Json(state.inner.county.plot(code, query.since).await?))
}

async fn county_menu(State(state): State<AppState>) -> DashboardResult<Json<CountyMenu>> {
    Ok(Json(state.inner.county.menu().await?))
}
