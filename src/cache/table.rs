//! Expiring table cache.
//!
//! Tables are stored as JSON blobs in a hash field; the companion field
//! `<field>:expires` holds the expiry as a string Unix timestamp. A table is
//! served from cache only while `now < expiry`; otherwise it is refetched and
//! both fields overwritten. Refreshes are not locked, concurrent misses both
//! fetch and the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::store::CacheStore;
use crate::error::DashboardResult;
use crate::observability::metrics;

const EXPIRES_SUFFIX: &str = ":expires";

/// Seconds since the Unix epoch, with sub-second precision.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Field holding the expiry of `field`.
pub fn expiry_field(field: &str) -> String {
    format!("{field}{EXPIRES_SUFFIX}")
}

/// Encode `now + ttl` the way it is stored.
pub fn encode_expiry(now: f64, ttl: Duration) -> String {
    format!("{:.3}", now + ttl.as_secs_f64())
}

/// Decode a stored expiry; unreadable values yield `None`.
pub fn decode_expiry(raw: &[u8]) -> Option<f64> {
    std::str::from_utf8(raw).ok()?.trim().parse().ok()
}

/// Whether a stored expiry is still in the future.
pub fn is_fresh(raw: Option<&[u8]>, now: f64) -> bool {
    raw.and_then(decode_expiry).is_some_and(|expires| now < expires)
}

/// One cached field as reported by [`TableCache::entries`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub field: String,
    /// Stored expiry, `None` for permanent tables.
    pub expires_at: Option<f64>,
    pub fresh: bool,
    pub bytes: usize,
}

/// Expiring cache of serialized tables over a [`CacheStore`].
#[derive(Clone)]
pub struct TableCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl TableCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached table at `hash`/`field` if it has not expired,
    /// otherwise run `fetch`, store its result with a new expiry and return it.
    pub async fn get_or_fetch<T, F, Fut>(&self, hash: &str, field: &str, fetch: F) -> DashboardResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DashboardResult<T>>,
    {
        let expires_key = expiry_field(field);
        let expires = self.store.hget(hash, &expires_key).await?;

        if is_fresh(expires.as_deref(), now_secs()) {
            if let Some(table) = self.read(hash, field).await? {
                metrics::record_cache_lookup(hash, true);
                tracing::debug!(hash, field, "Table cache hit");
                return Ok(table);
            }
        }

        metrics::record_cache_lookup(hash, false);
        tracing::info!(hash, field, "Table cache miss, fetching");

        let table = fetch().await?;
        self.store
            .hset(hash, field, serde_json::to_vec(&table)?)
            .await?;
        self.store
            .hset(hash, &expires_key, encode_expiry(now_secs(), self.ttl).into_bytes())
            .await?;

        Ok(table)
    }

    /// Return the table at `hash`/`field`, building and storing it once if
    /// absent. Permanent tables carry no expiry.
    pub async fn get_or_build<T, F, Fut>(&self, hash: &str, field: &str, build: F) -> DashboardResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DashboardResult<T>>,
    {
        if self.store.hexists(hash, field).await? {
            if let Some(table) = self.read(hash, field).await? {
                metrics::record_cache_lookup(hash, true);
                return Ok(table);
            }
        }

        metrics::record_cache_lookup(hash, false);
        tracing::info!(hash, field, "Building permanent table");

        let table = build().await?;
        self.store
            .hset(hash, field, serde_json::to_vec(&table)?)
            .await?;
        Ok(table)
    }

    /// Decode a stored blob; an undecodable blob is treated as absent.
    async fn read<T: DeserializeOwned>(&self, hash: &str, field: &str) -> DashboardResult<Option<T>> {
        let Some(blob) = self.store.hget(hash, field).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&blob) {
            Ok(table) => Ok(Some(table)),
            Err(e) => {
                tracing::warn!(hash, field, error = %e, "Discarding undecodable cached table");
                Ok(None)
            }
        }
    }

    /// Tables currently stored under `hash`.
    pub async fn entries(&self, hash: &str) -> DashboardResult<Vec<CacheEntry>> {
        let now = now_secs();
        let mut entries = Vec::new();

        for field in self.store.hkeys(hash).await? {
            if field.ends_with(EXPIRES_SUFFIX) {
                continue;
            }
            let bytes = self
                .store
                .hget(hash, &field)
                .await?
                .map_or(0, |blob| blob.len());
            let expires_at = self
                .store
                .hget(hash, &expiry_field(&field))
                .await?
                .and_then(|raw| decode_expiry(&raw));

            entries.push(CacheEntry {
                fresh: expires_at.map_or(true, |e| now < e),
                field,
                expires_at,
                bytes,
            });
        }

        Ok(entries)
    }

    /// Drop every table under `hash`.
    pub async fn flush(&self, hash: &str) -> DashboardResult<bool> {
        let removed = self.store.del(hash).await?;
        tracing::info!(hash, removed, "Flushed cache hash");
        Ok(removed)
    }
}
