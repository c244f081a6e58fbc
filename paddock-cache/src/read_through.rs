//! Read-through cache.
//!
//! Every cached route goes through [`ReadThroughCache::fetch_cached`]: serve a
//! live entry if there is one, otherwise call the fetcher, store its result
//! with the given TTL and return it. Concurrent misses on the same key each
//! call their fetcher; the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use paddock_core::PaddockResult;
use serde::{de::DeserializeOwned, Serialize};

use crate::freshness::CacheRead;
use crate::keys::{CacheCategory, CacheKey};
use crate::traits::{CacheBackend, CacheEntry, CacheStats};

/// Configuration for the read-through cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Prefix for keys in shared backends.
    pub namespace: String,
    pub meetings_ttl: Duration,
    pub race_ttl: Duration,
    pub listings_ttl: Duration,
    pub details_ttl: Duration,
    pub performance_ttl: Duration,
    pub liquidity_ttl: Duration,
    pub history_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "paddock".to_string(),
            meetings_ttl: Duration::from_secs(300),
            race_ttl: Duration::from_secs(60),
            listings_ttl: Duration::from_secs(86_400),
            details_ttl: Duration::from_secs(60),
            performance_ttl: Duration::from_secs(300),
            liquidity_ttl: Duration::from_secs(60),
            history_ttl: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the TTL for one category.
    pub fn with_ttl(mut self, category: CacheCategory, ttl: Duration) -> Self {
        *self.ttl_mut(category) = ttl;
        self
    }

    pub fn ttl_for(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Meetings => self.meetings_ttl,
            CacheCategory::Race => self.race_ttl,
            CacheCategory::Listings => self.listings_ttl,
            CacheCategory::Details => self.details_ttl,
            CacheCategory::Performance => self.performance_ttl,
            CacheCategory::Liquidity => self.liquidity_ttl,
            CacheCategory::History => self.history_ttl,
        }
    }

    fn ttl_mut(&mut self, category: CacheCategory) -> &mut Duration {
        match category {
            CacheCategory::Meetings => &mut self.meetings_ttl,
            CacheCategory::Race => &mut self.race_ttl,
            CacheCategory::Listings => &mut self.listings_ttl,
            CacheCategory::Details => &mut self.details_ttl,
            CacheCategory::Performance => &mut self.performance_ttl,
            CacheCategory::Liquidity => &mut self.liquidity_ttl,
            CacheCategory::History => &mut self.history_ttl,
        }
    }
}

/// Read-through cache over a pluggable backend.
///
/// The cache is advisory: a backend that fails to read or write is logged and
/// bypassed, and the request is served from upstream.
#[derive(Clone)]
pub struct ReadThroughCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl ReadThroughCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn with_defaults(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    /// Fetch `key` with the TTL configured for its category.
    pub async fn fetch<T, F, Fut>(&self, key: &CacheKey, fetcher: F) -> PaddockResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PaddockResult<T>>,
    {
        let ttl = self.config.ttl_for(key.category());
        self.fetch_cached(key, ttl, fetcher).await
    }

    /// Serve `key` from a live entry, or call `fetcher` and cache its result
    /// for `ttl`.
    ///
    /// A fetcher error is returned unchanged and nothing is stored. The cache
    /// never retries.
    pub async fn fetch_cached<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetcher: F,
    ) -> PaddockResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PaddockResult<T>>,
    {
        if let Some(hit) = self.lookup::<T>(key).await {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(hit);
        }

        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache miss, fetching upstream");
        let value = fetcher().await?;

        let cached_at = Utc::now();
        let entry = match serde_json::to_value(&value) {
            Ok(json) => CacheEntry::new(key, json, cached_at, ttl),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Value not cacheable, serving uncached");
                return Ok(CacheRead::from_upstream(value, cached_at, cached_at));
            }
        };
        let expires_at = entry.expires_at;

        if !ttl.is_zero() {
            if let Err(e) = self.backend.put(entry).await {
                tracing::warn!(
                    key = %key,
                    backend = self.backend.name(),
                    error = %e,
                    "Cache write failed"
                );
            }
        }

        Ok(CacheRead::from_upstream(value, cached_at, expires_at))
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CacheRead<T>> {
        let entry = match self.backend.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    backend = self.backend.name(),
                    error = %e,
                    "Cache read failed, bypassing cache"
                );
                return None;
            }
        };

        if !entry.is_live_at(Utc::now()) {
            return None;
        }

        match serde_json::from_value::<T>(entry.value) {
            Ok(value) => Some(CacheRead::from_cache(value, entry.cached_at, entry.expires_at)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value has unexpected shape, refetching");
                None
            }
        }
    }

    pub async fn stats(&self) -> PaddockResult<CacheStats> {
        self.backend.stats().await
    }

    pub async fn ping(&self) -> PaddockResult<()> {
        self.backend.ping().await
    }
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}
