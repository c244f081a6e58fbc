//! In-process cache backend.
//!
//! A concurrent map with lazy expiry: expired entries are dropped when they
//! are next read, or in bulk by [`InMemoryCacheBackend::purge_expired`].
//! There is no size bound and no LRU.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use paddock_core::PaddockResult;
use tokio::task::JoinHandle;

use crate::keys::CacheKey;
use crate::traits::{CacheBackend, CacheEntry, CacheStats};

#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live_at(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Periodically purge expired entries until the returned task is aborted.
    pub fn spawn_purger(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let backend = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = backend.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired cache entries");
                }
            }
        })
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &CacheKey) -> PaddockResult<Option<CacheEntry>> {
        let now = Utc::now();
        let found = self.entries.get(key.as_str()).map(|entry| entry.clone());

        match found {
            Some(entry) if entry.is_live_at(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry))
            }
            Some(_) => {
                // Only remove if nobody refreshed it in between.
                self.entries
                    .remove_if(key.as_str(), |_, entry| !entry.is_live_at(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn put(&self, entry: CacheEntry) -> PaddockResult<()> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> PaddockResult<()> {
        self.entries.remove(key.as_str());
        Ok(())
    }

    async fn stats(&self) -> PaddockResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
        })
    }

    async fn ping(&self) -> PaddockResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn key() -> CacheKey {
        CacheKey::meetings(NaiveDate::from_ymd_opt(2022, 5, 14).unwrap())
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let backend = InMemoryCacheBackend::new();
        let entry = CacheEntry::new(&key(), json!({"meetings": []}), Utc::now(), Duration::from_secs(60));
        backend.put(entry.clone()).await.unwrap();

        let found = backend.get(&key()).await.unwrap();
        assert_eq!(found, Some(entry));

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let backend = InMemoryCacheBackend::new();
        assert!(backend.get(&key()).await.unwrap().is_none());
        assert_eq!(backend.stats().await.unwrap().misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_returned_and_is_dropped() {
        let backend = InMemoryCacheBackend::new();
        let cached_at = Utc::now() - chrono::Duration::seconds(120);
        backend
            .put(CacheEntry::new(&key(), json!(1), cached_at, Duration::from_secs(60)))
            .await
            .unwrap();

        assert!(backend.get(&key()).await.unwrap().is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let backend = InMemoryCacheBackend::new();
        let now = Utc::now();
        backend
            .put(CacheEntry::new(&key(), json!(1), now, Duration::from_secs(60)))
            .await
            .unwrap();
        backend
            .put(CacheEntry::new(&key(), json!(2), now, Duration::from_secs(60)))
            .await
            .unwrap();

        let found = backend.get(&key()).await.unwrap().unwrap();
        assert_eq!(found.value, json!(2));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = InMemoryCacheBackend::new();
        backend
            .put(CacheEntry::new(&key(), json!(1), Utc::now(), Duration::from_secs(60)))
            .await
            .unwrap();
        backend.delete(&key()).await.unwrap();
        backend.delete(&key()).await.unwrap();
        assert!(backend.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = InMemoryCacheBackend::new();
        let old = Utc::now() - chrono::Duration::seconds(600);
        backend
            .put(CacheEntry::new(&CacheKey::vault_liquidity(), json!(1), old, Duration::from_secs(60)))
            .await
            .unwrap();
        backend
            .put(CacheEntry::new(&CacheKey::vault_performance(), json!(2), Utc::now(), Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(backend.purge_expired(), 1);
        assert_eq!(backend.len(), 1);
        assert!(backend.get(&CacheKey::vault_performance()).await.unwrap().is_some());
    }
}
