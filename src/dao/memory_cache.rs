use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::{
    FutureExt,
    future::{BoxFuture, ready},
};

use crate::error::DependencyResult;

use super::KeyValueStore;

/// Process-local key-value store whose entries expire after their TTL.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let value = self
            .entries
            .get(key)
            .map(|entry| (entry.0.clone(), entry.1))?;

        if value.1 <= now {
            self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
            return None;
        }
        Some(value.0)
    }
}

impl KeyValueStore for MemoryCache {
    fn put(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'_, DependencyResult<()>> {
        self.entries.insert(key, (value, Instant::now() + ttl));
        ready(Ok(())).boxed()
    }

    fn get(&self, key: String) -> BoxFuture<'_, DependencyResult<Option<String>>> {
        ready(Ok(self.lookup(&key))).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_back_a_live_entry() {
        let cache = MemoryCache::new();
        cache
            .put("health:check".into(), "abc".into(), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(
            cache.get("health:check".into()).await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn expired_entries_are_absent_and_evicted() {
        let cache = MemoryCache::new();
        cache
            .put("health:check".into(), "abc".into(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(cache.get("health:check".into()).await.unwrap(), None);
        assert!(cache.entries.is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_absent() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope".into()).await.unwrap(), None);
    }
}
