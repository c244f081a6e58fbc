//! Cache backend trait and stored entry type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paddock_core::PaddockResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::keys::CacheKey;

/// A cached JSON value with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry cached at `cached_at` that lives for `ttl`.
    pub fn new(key: &CacheKey, value: serde_json::Value, cached_at: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            key: key.as_str().to_string(),
            value,
            cached_at,
            expires_at: cached_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// An entry is live strictly before its expiry instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Cache backend trait for pluggable cache implementations.
///
/// Backends store opaque JSON entries keyed by [`CacheKey`]. They must never
/// hand back an entry past its `expires_at`; how expired entries are reclaimed
/// is up to the backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Get a live entry, or `None` on miss or expiry.
    async fn get(&self, key: &CacheKey) -> PaddockResult<Option<CacheEntry>>;

    /// Store an entry, replacing any previous one under the same key.
    async fn put(&self, entry: CacheEntry) -> PaddockResult<()>;

    /// Remove an entry. Removing a missing key is not an error.
    async fn delete(&self, key: &CacheKey) -> PaddockResult<()>;

    /// Backend-side statistics.
    async fn stats(&self) -> PaddockResult<CacheStats>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> PaddockResult<()>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently held. Not tracked by the Redis backend.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_entry_liveness_boundary() {
        let now = Utc::now();
        let entry = CacheEntry::new(
            &CacheKey::registry_markets(),
            serde_json::json!([]),
            now,
            Duration::from_secs(60),
        );

        assert!(entry.is_live_at(now));
        assert!(entry.is_live_at(now + chrono::Duration::seconds(59)));
        assert!(!entry.is_live_at(now + chrono::Duration::seconds(60)));
        assert_eq!(entry.remaining_ttl(now + chrono::Duration::seconds(90)), Duration::ZERO);
    }

    #[test]
    fn test_zero_ttl_entry_is_never_live() {
        let now = Utc::now();
        let entry = CacheEntry::new(&CacheKey::vault_liquidity(), serde_json::json!(1), now, Duration::ZERO);
        assert!(!entry.is_live_at(now));
    }
}
