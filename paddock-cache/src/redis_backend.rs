//! Redis cache backend.
//!
//! Entries are stored as JSON strings under `{namespace}:{key}` with a `PX`
//! expiry matching the entry's remaining TTL, so Redis reclaims them itself.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paddock_core::{CacheError, PaddockResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::keys::CacheKey;
use crate::traits::{CacheBackend, CacheEntry, CacheStats};

const BACKEND: &str = "redis";

fn backend_error(err: redis::RedisError) -> CacheError {
    CacheError::Backend {
        backend: BACKEND.to_string(),
        reason: err.to_string(),
    }
}

/// `PX` expiry for `entry` as of `now`, or `None` when less than a
/// millisecond remains and the write should be skipped.
fn expiry_millis(entry: &CacheEntry, now: DateTime<Utc>) -> Option<u64> {
    let millis = u64::try_from(entry.remaining_ttl(now).as_millis()).unwrap_or(u64::MAX);
    (millis > 0).then_some(millis)
}

fn encode_entry(entry: &CacheEntry) -> Result<String, CacheError> {
    serde_json::to_string(entry).map_err(|e| CacheError::Serialization {
        key: entry.key.clone(),
        reason: e.to_string(),
    })
}

/// Decode a stored value, dropping unreadable payloads and entries already
/// past their expiry at `now`.
fn decode_live(raw: &str, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
    let entry = match serde_json::from_str::<CacheEntry>(raw) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry");
            return None;
        }
    };
    // PX expiry is millisecond-granular; recheck against our own clock.
    entry.is_live_at(now).then_some(entry)
}

pub struct RedisCacheBackend {
    conn: ConnectionManager,
    namespace: String,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCacheBackend {
    /// Connect to `url` and scope every key under `namespace`.
    pub async fn connect(url: &str, namespace: impl Into<String>) -> PaddockResult<Self> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        let conn = ConnectionManager::new(client).await.map_err(backend_error)?;
        Ok(Self::with_connection(conn, namespace))
    }

    pub fn with_connection(conn: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            conn,
            namespace: namespace.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl std::fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, key: &CacheKey) -> PaddockResult<Option<CacheEntry>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(key.namespaced(&self.namespace))
            .await
            .map_err(backend_error)?;

        match raw.and_then(|raw| decode_live(&raw, key, Utc::now())) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn put(&self, entry: CacheEntry) -> PaddockResult<()> {
        let Some(ttl_ms) = expiry_millis(&entry, Utc::now()) else {
            return Ok(());
        };
        let payload = encode_entry(&entry)?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .pset_ex(format!("{}:{}", self.namespace, entry.key), payload, ttl_ms)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> PaddockResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(key.namespaced(&self.namespace))
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn stats(&self) -> PaddockResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: 0,
        })
    }

    async fn ping(&self) -> PaddockResult<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_652_495_700, 0).single().unwrap()
    }

    fn entry(ttl: Duration) -> CacheEntry {
        let key = CacheKey::meetings(chrono::NaiveDate::from_ymd_opt(2022, 5, 14).unwrap());
        CacheEntry::new(&key, serde_json::json!({"meetings": ["DOO"]}), now(), ttl)
    }

    #[test]
    fn test_expiry_millis_matches_remaining_ttl() {
        let e = entry(Duration::from_secs(60));
        assert_eq!(expiry_millis(&e, now()), Some(60_000));
        assert_eq!(expiry_millis(&e, now() + chrono::Duration::seconds(59)), Some(1_000));
    }

    #[test]
    fn test_expiry_millis_skips_expired_and_zero_ttl() {
        assert_eq!(expiry_millis(&entry(Duration::ZERO), now()), None);
        assert_eq!(expiry_millis(&entry(Duration::from_micros(400)), now()), None);
        let e = entry(Duration::from_secs(60));
        assert_eq!(expiry_millis(&e, now() + chrono::Duration::seconds(61)), None);
    }

    #[test]
    fn test_encoded_entry_decodes_while_live() {
        let e = entry(Duration::from_secs(300));
        let key = CacheKey::meetings(chrono::NaiveDate::from_ymd_opt(2022, 5, 14).unwrap());
        let raw = encode_entry(&e).unwrap();

        let decoded = decode_live(&raw, &key, now() + chrono::Duration::seconds(10)).unwrap();
        assert_eq!(decoded.key, e.key);
        assert_eq!(decoded.value, e.value);
        assert_eq!(decoded.expires_at, e.expires_at);
    }

    #[test]
    fn test_decode_drops_expired_entry() {
        let e = entry(Duration::from_secs(300));
        let key = CacheKey::meetings(chrono::NaiveDate::from_ymd_opt(2022, 5, 14).unwrap());
        let raw = encode_entry(&e).unwrap();

        assert!(decode_live(&raw, &key, now() + chrono::Duration::seconds(300)).is_none());
    }

    #[test]
    fn test_decode_discards_unreadable_payload() {
        let key = CacheKey::registry(paddock_core::RegistryKind::Markets);
        assert!(decode_live("not json", &key, now()).is_none());
        assert!(decode_live(r#"{"key":"x"}"#, &key, now()).is_none());
    }

    /// Needs a running server: `REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_round_trip_against_live_redis() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let backend = RedisCacheBackend::connect(&url, "paddock-test").await.unwrap();
        let e = CacheEntry::new(
            &CacheKey::vault_liquidity(),
            serde_json::json!({"total": "203000000"}),
            Utc::now(),
            Duration::from_secs(30),
        );
        let key = CacheKey::vault_liquidity();

        backend.put(e.clone()).await.unwrap();
        let fetched = backend.get(&key).await.unwrap().unwrap();
        assert_eq!(fetched.value, e.value);

        backend.delete(&key).await.unwrap();
        assert!(backend.get(&key).await.unwrap().is_none());
        assert_eq!(backend.stats().await.unwrap().hits, 1);
    }
}
