//! Table cache subsystem.
//!
//! # Data Flow
//! ```text
//! driver asks for a table
//!     → table.rs (check `<field>:expires`, decode blob or refetch)
//!     → store.rs (CacheStore trait)
//!         → memory_store.rs (DashMap, single process)
//!         → redis_store.rs (shared Redis hashes)
//! ```

pub mod memory_store;
pub mod redis_store;
pub mod store;
pub mod table;

use std::sync::Arc;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use store::CacheStore;
pub use table::{CacheEntry, TableCache};

use crate::config::{CacheBackend, CacheConfig};
use crate::error::{DashboardError, DashboardResult};

/// Open the store selected by `config`.
pub async fn connect_store(config: &CacheConfig) -> DashboardResult<Arc<dyn CacheStore>> {
    match config.backend {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory cache store");
            Ok(Arc::new(MemoryStore::new()))
        }
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                DashboardError::Config("cache.redis_url is not set".to_string())
            })?;
            Ok(Arc::new(RedisStore::connect(url).await?))
        }
    }
}
