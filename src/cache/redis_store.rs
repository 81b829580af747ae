//! Redis-backed cache store.
//!
//! Each table hash maps onto a Redis hash, so several dashboard processes
//! behind a load balancer share one set of fetched tables.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::cache::store::CacheStore;
use crate::error::DashboardResult;

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Open a managed (auto-reconnecting) connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> DashboardResult<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;

        tracing::info!(redis_url = %redis_url, "Connected to Redis cache store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn hget(&self, hash: &str, field: &str) -> DashboardResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.hget(hash, field).await?;
        Ok(value)
    }

    async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> DashboardResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.hset(hash, field, value).await?;
        Ok(())
    }

    async fn hexists(&self, hash: &str, field: &str) -> DashboardResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.hexists(hash, field).await?;
        Ok(exists)
    }

    async fn hkeys(&self, hash: &str) -> DashboardResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let mut keys: Vec<String> = conn.hkeys(hash).await?;
        keys.sort();
        Ok(keys)
    }

    async fn del(&self, hash: &str) -> DashboardResult<bool> {
        let mut conn = self.connection.clone();
        let removed: usize = conn.del(hash).await?;
        Ok(removed > 0)
    }
}
