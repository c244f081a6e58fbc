//! Where a cached read came from and how old it is.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Origin of a [`CacheRead`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// A live entry in the backend.
    Cache,
    /// The upstream fetcher, called on this request.
    Upstream,
}

/// A value returned by the read-through cache, with its fetch and expiry
/// times.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
    /// When upstream produced the value.
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T, fetched_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
            fetched_at,
            expires_at,
        }
    }

    pub fn from_upstream(value: T, fetched_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            source: ReadSource::Upstream,
            fetched_at,
            expires_at,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    pub fn was_cache_miss(&self) -> bool {
        self.source == ReadSource::Upstream
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Time since upstream produced the value, zero if `now` is earlier.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Time left before the entry expires, zero once it has.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_652_495_700 + secs, 0).single().unwrap()
    }

    #[test]
    fn test_source_flags() {
        let hit = CacheRead::from_cache(vec![1u8], at(0), at(60));
        assert_eq!(hit.source(), ReadSource::Cache);
        assert!(hit.was_cache_hit());
        assert!(!hit.was_cache_miss());

        let miss = CacheRead::from_upstream(vec![1u8], at(0), at(60));
        assert_eq!(miss.source(), ReadSource::Upstream);
        assert!(miss.was_cache_miss());
        assert_eq!(miss.into_value(), vec![1u8]);
    }

    #[test]
    fn test_age_and_remaining() {
        let read = CacheRead::from_cache("DOO", at(0), at(300));

        assert_eq!(read.age_at(at(45)), Duration::from_secs(45));
        assert_eq!(read.remaining_at(at(45)), Duration::from_secs(255));
        assert_eq!(read.remaining_at(at(301)), Duration::ZERO);
        assert_eq!(read.age_at(at(-5)), Duration::ZERO);
        assert_eq!(read.fetched_at(), at(0));
        assert_eq!(read.expires_at(), at(300));
    }
}
