//! Paddock Cache - TTL cache for upstream responses
//!
//! Upstream results are cached as JSON entries with an absolute expiry. A
//! live entry is served without touching upstream; an expired one is never
//! served. Two backends are provided: an in-process concurrent map and Redis.

pub mod freshness;
pub mod keys;
pub mod memory;
pub mod read_through;
pub mod redis_backend;
pub mod traits;

pub use freshness::{CacheRead, ReadSource};
pub use keys::{CacheCategory, CacheKey};
pub use memory::InMemoryCacheBackend;
pub use read_through::{CacheConfig, ReadThroughCache};
pub use redis_backend::RedisCacheBackend;
pub use traits::{CacheBackend, CacheEntry, CacheStats};
