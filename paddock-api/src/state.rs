//! Shared application state for Axum routers.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use paddock_cache::{CacheKey, CacheRead, ReadThroughCache};
use paddock_chain::{PayloadSigner, ProtocolReader, TokenFaucet};
use paddock_core::PaddockResult;
use paddock_racing::RacingSource;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::ChainSettings;
use crate::telemetry::metrics;

/// The read-through cache every route goes through. The backend (memory or
/// Redis) is chosen at startup.
pub type ApiCache = ReadThroughCache;

/// Application-wide state shared across all routes.
///
/// Upstreams sit behind traits so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ApiCache>,
    pub racing: Arc<dyn RacingSource>,
    pub chain: Arc<dyn ProtocolReader>,
    /// `None` when no faucet tokens are configured.
    pub faucet: Option<Arc<dyn TokenFaucet>>,
    pub signer: Arc<PayloadSigner>,
    pub settings: ChainSettings,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        cache: Arc<ApiCache>,
        racing: Arc<dyn RacingSource>,
        chain: Arc<dyn ProtocolReader>,
        signer: Arc<PayloadSigner>,
    ) -> Self {
        Self {
            cache,
            racing,
            chain,
            faucet: None,
            signer,
            settings: ChainSettings::default(),
            start_time: Instant::now(),
        }
    }

    pub fn with_faucet(mut self, faucet: Arc<dyn TokenFaucet>) -> Self {
        self.faucet = Some(faucet);
        self
    }

    pub fn with_settings(mut self, settings: ChainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Read `key` through the cache with its category TTL, recording the
    /// lookup outcome.
    pub async fn cached<T, F, Fut>(&self, key: &CacheKey, fetcher: F) -> PaddockResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PaddockResult<T>>,
    {
        let result = self.cache.fetch(key, fetcher).await;

        let outcome = match &result {
            Ok(read) if read.was_cache_hit() => "hit",
            Ok(_) => "miss",
            Err(_) => "error",
        };
        if let Some(metrics) = metrics() {
            metrics.record_cache_lookup(key.category().as_str(), outcome);
        }

        result
    }
}

crate::impl_from_ref!(Arc<ApiCache>, cache);
crate::impl_from_ref!(Arc<dyn RacingSource>, racing);
crate::impl_from_ref!(Arc<dyn ProtocolReader>, chain);
crate::impl_from_ref!(Option<Arc<dyn TokenFaucet>>, faucet);
crate::impl_from_ref!(Arc<PayloadSigner>, signer);
crate::impl_from_ref!(ChainSettings, settings);
crate::impl_from_ref!(Instant, start_time);
