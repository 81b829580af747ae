use std::sync::atomic::Ordering;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::cache::CacheEntry;
use crate::drivers::KNOWN_HASHES;
use crate::error::{DashboardError, DashboardResult};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub total_requests: usize,
    pub cache_backend: &'static str,
    pub cache_ttl_secs: u64,
}

#[derive(Serialize)]
pub struct CacheReport {
    pub hash: String,
    pub entries: Vec<CacheEntry>,
}

#[derive(Serialize)]
pub struct FlushReport {
    pub hash: String,
    pub removed: bool,
}

fn known_hash(hash: &str) -> DashboardResult<()> {
    if KNOWN_HASHES.contains(&hash) {
        Ok(())
    } else {
        Err(DashboardError::NotFound(format!("cache hash '{hash}'")))
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = &state.inner;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: inner.started_at.elapsed().as_secs(),
        total_requests: inner.request_count.load(Ordering::Relaxed),
        cache_backend: inner.cache.backend(),
        cache_ttl_secs: inner.cache.ttl().as_secs(),
    })
}

pub async fn get_cache(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> DashboardResult<Json<CacheReport>> {
    known_hash(&hash)?;
    let entries = state.inner.cache.entries(&hash).await?;
    Ok(Json(CacheReport { hash, entries }))
}

pub async fn flush_cache(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> DashboardResult<Json<FlushReport>> {
    known_hash(&hash)?;
    let removed = state.inner.cache.flush(&hash).await?;
    tracing::info!(hash = %hash, removed, "Cache flushed via admin API");
    Ok(Json(FlushReport { hash, removed }))
}
