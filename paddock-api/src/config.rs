//! Service Configuration
//!
//! Everything the service needs is read from the environment once, at
//! startup. Handlers never look at the environment; they receive the parsed
//! values through `AppState`.
//!
//! Each `from_env` has a `from_lookup` twin that takes the variable source
//! as a closure, which is what the tests use.

use std::str::FromStr;
use std::time::Duration;

use paddock_cache::{CacheCategory, CacheConfig};
use paddock_chain::{parse_address, Address};
use paddock_core::{ConfigError, CountBound, RetryPolicy};
use paddock_racing::RacingClientConfig;
use secrecy::{ExposeSecret, SecretString};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP-facing settings (CORS).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// - `PADDOCK_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PADDOCK_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `PADDOCK_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cors_origins = lookup("PADDOCK_CORS_ORIGINS")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let cors_allow_credentials = lookup("PADDOCK_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.cors_allow_credentials);

        let cors_max_age_secs = lookup("PADDOCK_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
        }
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // *.horse.link matches any https subdomain
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Which cache backend to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Redis,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("expected 'memory' or 'redis', got '{}'", other)),
        }
    }
}

/// Chain settings the routes consult on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainSettings {
    pub count_bound: CountBound,
    /// First block scanned for `Placed` events.
    pub history_from_block: u64,
}

/// Upstream, signing, faucet and cache settings.
#[derive(Debug)]
pub struct ServiceConfig {
    pub racing: RacingClientConfig,
    pub rpc_url: String,
    /// Bound on every individual chain read.
    pub rpc_timeout: Duration,
    pub registry_address: Option<String>,
    pub chain: ChainSettings,
    pub private_key: Option<SecretString>,
    pub faucet_tokens: Vec<String>,
    /// Whole tokens sent per faucet transfer.
    pub faucet_amount: u64,
    pub faucet_confirm_timeout: Duration,
    pub cache_backend: CacheBackendKind,
    pub redis_url: Option<String>,
    pub cache: CacheConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            racing: RacingClientConfig::default(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            rpc_timeout: Duration::from_millis(15_000),
            registry_address: None,
            chain: ChainSettings::default(),
            private_key: None,
            faucet_tokens: Vec::new(),
            faucet_amount: 100,
            faucet_confirm_timeout: Duration::from_millis(60_000),
            cache_backend: CacheBackendKind::Memory,
            redis_url: None,
            cache: CacheConfig::default(),
        }
    }
}

/// Environment variable holding a cache category's TTL in seconds,
/// e.g. `PADDOCK_TTL_MEETINGS`.
fn ttl_var(category: CacheCategory) -> String {
    format!("PADDOCK_TTL_{}", category.as_str().to_uppercase())
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    ///
    /// Unset variables take their defaults; set but unparseable ones are an
    /// error. Call [`validate`](Self::validate) before using the result.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let retry = RetryPolicy {
            max_retries: parse_or(&var, "PADDOCK_RETRY_MAX", defaults.racing.retry.max_retries)?,
            initial_backoff: millis_or(&var, "PADDOCK_RETRY_INITIAL_MS", defaults.racing.retry.initial_backoff)?,
            max_backoff: millis_or(&var, "PADDOCK_RETRY_MAX_MS", defaults.racing.retry.max_backoff)?,
            ..defaults.racing.retry.clone()
        };

        let racing = RacingClientConfig {
            base_url: var("PADDOCK_RACING_API_URL").unwrap_or(defaults.racing.base_url),
            jurisdiction: var("PADDOCK_RACING_JURISDICTION").unwrap_or(defaults.racing.jurisdiction),
            timeout: millis_or(&var, "PADDOCK_HTTP_TIMEOUT_MS", defaults.racing.timeout)?,
            retry,
        };

        let chain = ChainSettings {
            count_bound: parse_or(&var, "PADDOCK_REGISTRY_COUNT_BOUND", defaults.chain.count_bound)?,
            history_from_block: parse_or(&var, "PADDOCK_HISTORY_FROM_BLOCK", defaults.chain.history_from_block)?,
        };

        let mut cache = defaults
            .cache
            .with_namespace(var("PADDOCK_CACHE_NAMESPACE").unwrap_or_else(|| "paddock".to_string()));
        for category in CacheCategory::ALL {
            let name = ttl_var(category);
            if var(&name).is_some() {
                let secs: u64 = parse_or(&var, &name, 0)?;
                cache = cache.with_ttl(category, Duration::from_secs(secs));
            }
        }

        Ok(Self {
            racing,
            rpc_url: var("PADDOCK_RPC_URL").unwrap_or(defaults.rpc_url),
            rpc_timeout: millis_or(&var, "PADDOCK_RPC_TIMEOUT_MS", defaults.rpc_timeout)?,
            registry_address: var("PADDOCK_REGISTRY_ADDRESS"),
            chain,
            private_key: var("PADDOCK_PRIVATE_KEY").map(|key| SecretString::new(key.into())),
            faucet_tokens: var("PADDOCK_FAUCET_TOKENS").map(|s| split_list(&s)).unwrap_or_default(),
            faucet_amount: parse_or(&var, "PADDOCK_FAUCET_AMOUNT", defaults.faucet_amount)?,
            faucet_confirm_timeout: millis_or(
                &var,
                "PADDOCK_FAUCET_CONFIRM_TIMEOUT_MS",
                defaults.faucet_confirm_timeout,
            )?,
            cache_backend: parse_or(&var, "PADDOCK_CACHE_BACKEND", defaults.cache_backend)?,
            redis_url: var("PADDOCK_REDIS_URL"),
            cache,
        })
    }

    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.private_key {
            Some(key) if !key.expose_secret().is_empty() => {}
            _ => return Err(missing("PADDOCK_PRIVATE_KEY")),
        }

        self.registry()?;
        self.faucet_token_addresses()?;

        if self.cache_backend == CacheBackendKind::Redis && self.redis_url.is_none() {
            return Err(missing("PADDOCK_REDIS_URL"));
        }
        if self.rpc_timeout.is_zero() {
            return Err(invalid("PADDOCK_RPC_TIMEOUT_MS", "0", "must be greater than zero"));
        }
        if self.racing.timeout.is_zero() {
            return Err(invalid("PADDOCK_HTTP_TIMEOUT_MS", "0", "must be greater than zero"));
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<Address, ConfigError> {
        let value = self
            .registry_address
            .as_deref()
            .ok_or_else(|| missing("PADDOCK_REGISTRY_ADDRESS"))?;
        parse_address(value).map_err(|e| invalid("PADDOCK_REGISTRY_ADDRESS", value, &e.to_string()))
    }

    pub fn faucet_token_addresses(&self) -> Result<Vec<Address>, ConfigError> {
        self.faucet_tokens
            .iter()
            .map(|token| parse_address(token).map_err(|e| invalid("PADDOCK_FAUCET_TOKENS", token, &e.to_string())))
            .collect()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn millis_or(var: &impl Fn(&str) -> Option<String>, name: &str, default: Duration) -> Result<Duration, ConfigError> {
    let ms = parse_or(var, name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const REGISTRY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![("PADDOCK_PRIVATE_KEY", KEY), ("PADDOCK_REGISTRY_ADDRESS", REGISTRY)]
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&minimal())).unwrap();
        config.validate().unwrap();

        assert_eq!(config.racing.jurisdiction, "QLD");
        assert_eq!(config.racing.timeout, Duration::from_secs(10));
        assert_eq!(config.racing.retry.max_retries, 3);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.rpc_timeout, Duration::from_secs(15));
        assert_eq!(config.chain.count_bound, CountBound::Exact);
        assert_eq!(config.chain.history_from_block, 0);
        assert_eq!(config.faucet_amount, 100);
        assert_eq!(config.faucet_confirm_timeout, Duration::from_secs(60));
        assert!(config.faucet_tokens.is_empty());
        assert_eq!(config.cache_backend, CacheBackendKind::Memory);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("PADDOCK_REGISTRY_COUNT_BOUND", "skip-last"),
            ("PADDOCK_HISTORY_FROM_BLOCK", "1200"),
            ("PADDOCK_TTL_MEETINGS", "30"),
            ("PADDOCK_TTL_LISTINGS", "0"),
            ("PADDOCK_CACHE_NAMESPACE", "paddock-test"),
            ("PADDOCK_RETRY_MAX", "0"),
            ("PADDOCK_FAUCET_TOKENS", "0x0000000000000000000000000000000000000001, 0x0000000000000000000000000000000000000002"),
        ]);
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.chain.count_bound, CountBound::SkipLast);
        assert_eq!(config.chain.history_from_block, 1200);
        assert_eq!(config.cache.meetings_ttl, Duration::from_secs(30));
        assert_eq!(config.cache.listings_ttl, Duration::ZERO);
        assert_eq!(config.cache.race_ttl, Duration::from_secs(60));
        assert_eq!(config.cache.namespace, "paddock-test");
        assert_eq!(config.racing.retry.max_retries, 0);
        assert_eq!(config.faucet_token_addresses().unwrap().len(), 2);
    }

    #[test]
    fn test_every_cache_category_has_a_ttl_variable() {
        let names: Vec<(CacheCategory, String)> =
            CacheCategory::ALL.iter().map(|c| (*c, ttl_var(*c))).collect();
        assert_eq!(names[0].1, "PADDOCK_TTL_MEETINGS");
        assert_eq!(names[6].1, "PADDOCK_TTL_HISTORY");

        let config = ServiceConfig::from_lookup(|name| {
            names
                .iter()
                .position(|(_, var)| var == name)
                .map(|i| (i + 1).to_string())
                .or_else(|| minimal().into_iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string()))
        })
        .unwrap();

        for (i, (category, _)) in names.iter().enumerate() {
            assert_eq!(config.cache.ttl_for(*category), Duration::from_secs(i as u64 + 1));
        }
    }

    #[test]
    fn test_unparseable_value_is_rejected() {
        let mut vars = minimal();
        vars.push(("PADDOCK_REGISTRY_COUNT_BOUND", "last"));
        let err = ServiceConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "PADDOCK_REGISTRY_COUNT_BOUND"));

        let err = ServiceConfig::from_lookup(lookup(&[("PADDOCK_HTTP_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_requires_key_and_registry() {
        let config = ServiceConfig::from_lookup(lookup(&[("PADDOCK_REGISTRY_ADDRESS", REGISTRY)])).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingRequired {
                field: "PADDOCK_PRIVATE_KEY".to_string()
            })
        );

        let config = ServiceConfig::from_lookup(lookup(&[("PADDOCK_PRIVATE_KEY", KEY)])).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired { .. })));

        let config = ServiceConfig::from_lookup(lookup(&[
            ("PADDOCK_PRIVATE_KEY", KEY),
            ("PADDOCK_REGISTRY_ADDRESS", "0x1234"),
        ]))
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut vars = minimal();
        vars.push(("PADDOCK_CACHE_BACKEND", "redis"));
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.validate().is_err());

        vars.push(("PADDOCK_REDIS_URL", "redis://127.0.0.1:6379"));
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let config = ServiceConfig::from_lookup(lookup(&minimal())).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ac0974bec"));
    }

    #[test]
    fn test_cors_defaults_allow_all() {
        let config = ApiConfig::from_lookup(|_| None);
        assert!(config.cors_origins.is_empty());
        assert!(config.is_origin_allowed("http://localhost:5173"));
        assert_eq!(config.cors_max_age_secs, 86400);
    }

    #[test]
    fn test_cors_origin_list() {
        let config = ApiConfig::from_lookup(|name| {
            (name == "PADDOCK_CORS_ORIGINS").then(|| "https://horse.link, *.horse.link".to_string())
        });
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.is_origin_allowed("https://horse.link"));
        assert!(config.is_origin_allowed("https://app.horse.link"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(!config.is_origin_allowed("https://nothorse.link"));
    }
}
