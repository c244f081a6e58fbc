//! Paddock API Server Entry Point
//!
//! Reads configuration, builds the cache, upstream clients, signer and
//! faucet, and serves the Axum router until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use paddock_api::telemetry::{init_tracer, TelemetryConfig};
use paddock_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, CacheBackendKind, ServiceConfig};
use paddock_cache::{CacheBackend, InMemoryCacheBackend, ReadThroughCache, RedisCacheBackend};
use paddock_chain::{EthersFaucet, EthersProtocol, PayloadSigner, TokenFaucet};
use paddock_racing::RacingClient;
use secrecy::ExposeSecret;

/// How often the in-memory backend drops expired entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracer(&TelemetryConfig::default())?;

    let config = ServiceConfig::from_env()?;
    config.validate()?;
    let api_config = ApiConfig::from_env();

    let backend = build_cache_backend(&config).await?;
    let cache = Arc::new(ReadThroughCache::new(backend, config.cache.clone()));

    let racing = Arc::new(RacingClient::new(config.racing.clone())?);
    let protocol = Arc::new(EthersProtocol::new(&config.rpc_url, config.registry()?, config.rpc_timeout)?);

    let key = config
        .private_key
        .as_ref()
        .ok_or_else(|| ApiError::internal_error("PADDOCK_PRIVATE_KEY is not set"))?;
    let signer = Arc::new(PayloadSigner::from_private_key(key.expose_secret())?);
    tracing::info!(owner = %signer.owner(), "Payload signer loaded");

    let mut state = AppState::new(cache, racing, protocol.clone(), signer.clone()).with_settings(config.chain);
    if let Some(faucet) = build_faucet(&config, &protocol, &signer).await? {
        state = state.with_faucet(faucet);
    }

    let app = create_api_router(state, &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Paddock API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

async fn build_cache_backend(config: &ServiceConfig) -> ApiResult<Arc<dyn CacheBackend>> {
    match config.cache_backend {
        CacheBackendKind::Memory => {
            let memory = Arc::new(InMemoryCacheBackend::new());
            memory.spawn_purger(PURGE_INTERVAL);
            tracing::info!("Using in-memory cache");
            Ok(memory)
        }
        CacheBackendKind::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| ApiError::internal_error("PADDOCK_REDIS_URL is not set"))?;
            let redis = RedisCacheBackend::connect(url, config.cache.namespace.clone()).await?;
            tracing::info!(namespace = %config.cache.namespace, "Using Redis cache");
            Ok(Arc::new(redis))
        }
    }
}

/// The faucet, if tokens are configured and the chain id can be read.
///
/// A faucet that cannot be set up is logged and left disabled; the rest of
/// the service still starts.
async fn build_faucet(
    config: &ServiceConfig,
    protocol: &EthersProtocol,
    signer: &PayloadSigner,
) -> ApiResult<Option<Arc<dyn TokenFaucet>>> {
    let tokens = config.faucet_token_addresses()?;
    if tokens.is_empty() {
        tracing::info!("No faucet tokens configured, faucet disabled");
        return Ok(None);
    }

    match EthersFaucet::connect(
        protocol.provider(),
        signer.wallet(),
        tokens,
        config.faucet_amount,
        config.rpc_timeout,
        config.faucet_confirm_timeout,
    )
    .await
    {
        Ok(faucet) => Ok(Some(Arc::new(faucet))),
        Err(e) => {
            tracing::error!(error = %e, "Faucet setup failed, faucet disabled");
            Ok(None)
        }
    }
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("PADDOCK_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("PADDOCK_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
