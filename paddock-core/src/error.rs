//! Error types for Paddock operations

use std::time::Duration;
use thiserror::Error;

/// Failures talking to the third-party racing REST API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Request to {service} failed with status {status}: {message}")]
    RequestFailed {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Request to {service} could not be sent: {reason}")]
    Transport { service: String, reason: String },

    #[error("Rate limited by {service}, retry after {retry_after_ms}ms")]
    RateLimited { service: String, retry_after_ms: u64 },

    #[error("Malformed payload from {service}: {reason}")]
    MalformedPayload { service: String, reason: String },

    #[error("{service} has no {what} for {key}")]
    NotFound {
        service: String,
        what: String,
        key: String,
    },

    #[error("Request to {service} timed out after {elapsed:?}")]
    Timeout { service: String, elapsed: Duration },
}

impl UpstreamError {
    /// Whether repeating the request could plausibly succeed.
    ///
    /// Transport failures, throttling and 5xx responses are transient; a 4xx
    /// or an unparseable body will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::RateLimited { .. } | Self::Timeout { .. } => true,
            Self::RequestFailed { status, .. } => *status >= 500,
            Self::MalformedPayload { .. } | Self::NotFound { .. } => false,
        }
    }
}

/// Failures reading from or writing to the chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC error: {reason}")]
    Rpc { reason: String },

    #[error("Contract call {method} on {contract} failed: {reason}")]
    ContractCall {
        contract: String,
        method: String,
        reason: String,
    },

    #[error("Invalid address: {value}")]
    InvalidAddress { value: String },

    #[error("Signing failed: {reason}")]
    Signing { reason: String },

    #[error("Token amount {amount} with {decimals} decimals does not fit in uint256")]
    AmountOverflow { amount: u64, decimals: u8 },

    #[error("Transaction {tx_hash} failed: {reason}")]
    TransactionFailed { tx_hash: String, reason: String },

    #[error("Chain call {operation} timed out after {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },
}

/// Cache backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend {backend} failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("Cache entry {key} could not be (de)serialized: {reason}")]
    Serialization { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Request validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all Paddock errors.
#[derive(Debug, Clone, Error)]
pub enum PaddockError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for Paddock operations.
pub type PaddockResult<T> = Result<T, PaddockError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display_request_failed() {
        let err = UpstreamError::RequestFailed {
            service: "racing".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("racing"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_retryable_classification() {
        let server = UpstreamError::RequestFailed {
            service: "racing".to_string(),
            status: 502,
            message: String::new(),
        };
        let client = UpstreamError::RequestFailed {
            service: "racing".to_string(),
            status: 404,
            message: String::new(),
        };
        let malformed = UpstreamError::MalformedPayload {
            service: "racing".to_string(),
            reason: "missing field".to_string(),
        };
        let throttled = UpstreamError::RateLimited {
            service: "racing".to_string(),
            retry_after_ms: 1000,
        };

        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!malformed.is_retryable());
        assert!(throttled.is_retryable());
    }

    #[test]
    fn test_chain_error_display_contract_call() {
        let err = ChainError::ContractCall {
            contract: "0xabc".to_string(),
            method: "marketCount".to_string(),
            reason: "reverted".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("marketCount"));
        assert!(msg.contains("reverted"));
    }

    #[test]
    fn test_paddock_error_from_variants() {
        let err: PaddockError = CacheError::Backend {
            backend: "redis".to_string(),
            reason: "connection refused".to_string(),
        }
        .into();
        assert!(matches!(err, PaddockError::Cache(_)));
        assert!(format!("{}", err).starts_with("Cache error"));

        let err: PaddockError = ConfigError::MissingRequired {
            field: "PADDOCK_PRIVATE_KEY".to_string(),
        }
        .into();
        assert!(matches!(err, PaddockError::Config(_)));
    }
}
