//! Router wiring over in-memory fakes.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use paddock_api::{create_api_router, ApiConfig, AppState, ChainSettings};
use paddock_cache::{InMemoryCacheBackend, ReadThroughCache};
use paddock_chain::PayloadSigner;
use paddock_test_utils::{fixtures, FakeFaucet, FakeProtocol, FakeRacingSource, TokenFaucet, DEV_PRIVATE_KEY};
use serde_json::Value;
use tower::ServiceExt;

/// Handles on the fakes behind a test router.
pub struct TestApp {
    pub racing: Arc<FakeRacingSource>,
    pub chain: Arc<FakeProtocol>,
    pub faucet: Option<Arc<FakeFaucet>>,
    pub settings: ChainSettings,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_protocol(fixtures::protocol())
    }

    pub fn with_protocol(protocol: FakeProtocol) -> Self {
        Self {
            racing: Arc::new(fixtures::racing_source()),
            chain: Arc::new(protocol),
            faucet: None,
            settings: ChainSettings::default(),
        }
    }

    pub fn with_faucet(mut self, faucet: FakeFaucet) -> Self {
        self.faucet = Some(Arc::new(faucet));
        self
    }

    pub fn with_settings(mut self, settings: ChainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// A fresh router over the shared fakes with an empty cache.
    pub fn router(&self) -> Router {
        let cache = Arc::new(ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new())));
        let signer = Arc::new(PayloadSigner::from_private_key(DEV_PRIVATE_KEY).expect("dev key parses"));

        let mut state = AppState::new(cache, self.racing.clone(), self.chain.clone(), signer).with_settings(self.settings);
        if let Some(faucet) = &self.faucet {
            let faucet: Arc<dyn TokenFaucet> = faucet.clone();
            state = state.with_faucet(faucet);
        }
        create_api_router(state, &ApiConfig::default())
    }
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request builds");
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    send(router, request).await
}

pub async fn get_text(router: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request builds");
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
