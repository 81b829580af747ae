//! Key/value store seam behind the table cache.

use async_trait::async_trait;

use crate::error::DashboardResult;

/// Hash-of-fields store, shaped after Redis hashes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for logs and the admin API.
    fn backend(&self) -> &'static str;

    async fn hget(&self, hash: &str, field: &str) -> DashboardResult<Option<Vec<u8>>>;

    async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> DashboardResult<()>;

    async fn hexists(&self, hash: &str, field: &str) -> DashboardResult<bool>;

    async fn hkeys(&self, hash: &str) -> DashboardResult<Vec<String>>;

    /// Remove a whole hash; returns whether it existed.
    async fn del(&self, hash: &str) -> DashboardResult<bool>;
}
