//! Process-local cache store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::store::CacheStore;
use crate::error::DashboardResult;

/// In-memory store; contents are lost on restart and not shared between
/// processes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn hget(&self, hash: &str, field: &str) -> DashboardResult<Option<Vec<u8>>> {
        Ok(self
            .inner
            .get(hash)
            .and_then(|fields| fields.get(field).cloned()))
    }

    async fn hset(&self, hash: &str, field: &str, value: Vec<u8>) -> DashboardResult<()> {
        self.inner
            .entry(hash.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hexists(&self, hash: &str, field: &str) -> DashboardResult<bool> {
        Ok(self
            .inner
            .get(hash)
            .is_some_and(|fields| fields.contains_key(field)))
    }

    async fn hkeys(&self, hash: &str) -> DashboardResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .inner
            .get(hash)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    async fn del(&self, hash: &str) -> DashboardResult<bool> {
        Ok(self.inner.remove(hash).is_some())
    }
}
