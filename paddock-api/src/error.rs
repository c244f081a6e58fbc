//! Error Types for the Paddock API
//!
//! `ApiError` is the single error shape returned by every handler:
//! `{ "code": ..., "message": ..., "details": ... }` with the HTTP status
//! taken from the code. Domain errors from the lower crates convert into it
//! here, so handlers only ever use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use paddock_core::{CacheError, ChainError, ConfigError, PaddockError, UpstreamError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// The racing API has no such meeting or race
    NotFound,

    // ========================================================================
    // Upstream Errors (502, 504)
    // ========================================================================
    /// The racing API answered with an error
    UpstreamFailed,

    /// An upstream answered with a body that failed validation
    MalformedUpstream,

    /// A JSON-RPC or contract call failed
    ChainFailed,

    /// An upstream call timed out
    Timeout,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Service is temporarily unavailable or not configured
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::MissingField | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::UpstreamFailed | ErrorCode::MalformedUpstream | ErrorCode::ChainFailed => {
                StatusCode::BAD_GATEWAY
            }

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::NotFound => "Not found",
            ErrorCode::UpstreamFailed => "Upstream request failed",
            ErrorCode::MalformedUpstream => "Upstream returned a malformed payload",
            ErrorCode::ChainFailed => "Chain read failed",
            ErrorCode::Timeout => "Upstream request timed out",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ServiceUnavailable => "Service unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("Missing required field: {}", field))
            .with_details(serde_json::json!({ "field": field }))
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Invalid format for {}: expected {}", field, expected),
        )
        .with_details(serde_json::json!({ "field": field, "expected": expected }))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        tracing::warn!(error = %err, "Racing API request failed");
        match &err {
            UpstreamError::NotFound { .. } => ApiError::not_found(err.to_string()),
            UpstreamError::Timeout { .. } => ApiError::new(ErrorCode::Timeout, err.to_string()),
            UpstreamError::MalformedPayload { .. } => ApiError::new(ErrorCode::MalformedUpstream, err.to_string()),
            UpstreamError::RateLimited { retry_after_ms, .. } => {
                ApiError::new(ErrorCode::UpstreamFailed, err.to_string())
                    .with_details(serde_json::json!({ "retry_after_ms": retry_after_ms }))
            }
            UpstreamError::RequestFailed { status, .. } => ApiError::new(ErrorCode::UpstreamFailed, err.to_string())
                .with_details(serde_json::json!({ "upstream_status": status })),
            UpstreamError::Transport { .. } => ApiError::new(ErrorCode::UpstreamFailed, err.to_string()),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match &err {
            ChainError::InvalidAddress { value } => ApiError::invalid_format("address", "0x-prefixed 20-byte hex")
                .with_details(serde_json::json!({ "field": "address", "value": value })),
            ChainError::Timeout { .. } => {
                tracing::warn!(error = %err, "Chain call timed out");
                ApiError::new(ErrorCode::Timeout, err.to_string())
            }
            ChainError::AmountOverflow { .. } => {
                tracing::error!(error = %err, "Faucet amount misconfigured");
                ApiError::internal_error(format!("Faucet misconfigured: {}", err))
            }
            ChainError::Signing { .. } => {
                tracing::error!(error = %err, "Payload signing failed");
                ApiError::internal_error("Failed to sign payload")
            }
            ChainError::Rpc { .. } | ChainError::ContractCall { .. } | ChainError::TransactionFailed { .. } => {
                tracing::warn!(error = %err, "Chain read failed");
                ApiError::new(ErrorCode::ChainFailed, err.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            ValidationError::InvalidValue { field, reason } => {
                ApiError::invalid_input(format!("Invalid value for {}: {}", field, reason))
                    .with_details(serde_json::json!({ "field": field }))
            }
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        tracing::error!(error = %err, "Cache error");
        ApiError::internal_error("Cache operation failed")
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal_error(err.to_string())
    }
}

impl From<PaddockError> for ApiError {
    fn from(err: PaddockError) -> Self {
        match err {
            PaddockError::Upstream(e) => e.into(),
            PaddockError::Chain(e) => e.into(),
            PaddockError::Cache(e) => e.into(),
            PaddockError::Config(e) => e.into(),
            PaddockError::Validation(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::internal_error(format!("JSON serialization failed: {}", err))
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidFormat.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::UpstreamFailed.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::MalformedUpstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::ChainFailed.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_error_mapping() {
        let not_found: ApiError = UpstreamError::NotFound {
            service: "racing".to_string(),
            what: "race".to_string(),
            key: "DOO/9".to_string(),
        }
        .into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let malformed: ApiError = PaddockError::from(UpstreamError::MalformedPayload {
            service: "racing".to_string(),
            reason: "meetings[0]: meetingName is empty".to_string(),
        })
        .into();
        assert_eq!(malformed.code, ErrorCode::MalformedUpstream);
        assert_eq!(malformed.status_code(), StatusCode::BAD_GATEWAY);

        let timeout: ApiError = UpstreamError::Timeout {
            service: "racing".to_string(),
            elapsed: Duration::from_secs(10),
        }
        .into();
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let failed: ApiError = UpstreamError::RequestFailed {
            service: "racing".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert_eq!(failed.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(failed.details, Some(serde_json::json!({ "upstream_status": 503 })));
    }

    #[test]
    fn test_chain_error_mapping() {
        let bad_address: ApiError = ChainError::InvalidAddress {
            value: "0x1234".to_string(),
        }
        .into();
        assert_eq!(bad_address.status_code(), StatusCode::BAD_REQUEST);

        let reverted: ApiError = ChainError::ContractCall {
            contract: "0x0".to_string(),
            method: "totalAssets".to_string(),
            reason: "execution reverted".to_string(),
        }
        .into();
        assert_eq!(reverted.code, ErrorCode::ChainFailed);

        let signing: ApiError = ChainError::Signing {
            reason: "secret detail".to_string(),
        }
        .into();
        assert_eq!(signing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!signing.message.contains("secret detail"));

        let overflow: ApiError = ChainError::AmountOverflow {
            amount: u64::MAX,
            decimals: 255,
        }
        .into();
        assert_eq!(overflow.code, ErrorCode::InternalError);
        assert!(overflow.message.starts_with("Faucet misconfigured"));
        assert!(!overflow.message.contains("sign"));
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::missing_field("to");
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("MISSING_FIELD"));
        assert!(json.contains("\"field\":\"to\""));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);

        let bare = serde_json::to_value(ApiError::from_code(ErrorCode::NotFound))?;
        assert!(bare.get("details").is_none());
        Ok(())
    }
}
