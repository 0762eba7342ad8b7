//! Centralized Error Handling Module
//!
//! Every failure inside the crate carries a unique error code so that
//! log lines and API responses can be grouped by cause.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: chain data provider errors
//! - AUDIT_xxx: audit backend errors
//! - API_xxx: HTTP API errors
//! - CFG_xxx: configuration errors
//! - TELEMETRY_xxx / ACTION_xxx: error pipeline internals
//!
//! These are errors of the crate itself. Errors raised by the host
//! application are *classified* by `core::classifier`, not represented here.

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Chain Data Errors (1xx)
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429)
    RpcRateLimited,
    /// RPC returned error response
    RpcError,
    /// Invalid RPC response (bad hex quantity, missing result)
    RpcInvalidResponse,

    // ============================================
    // Audit Backend Errors (2xx)
    // ============================================
    /// Audit request could not be delivered
    AuditRequestFailed,
    /// Backend answered with `success: false`
    AuditRejected,

    // ============================================
    // API Errors (3xx)
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,

    // ============================================
    // Configuration Errors (4xx)
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Error Pipeline Errors (5xx)
    // ============================================
    /// Analytics sink rejected an event
    AnalyticsSinkFailed,
    /// Telemetry export could not be serialized
    TelemetryExportFailed,
    /// Solution carries no executable action
    ActionUnavailable,
    /// Automatic solution action failed
    ActionFailed,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// External service timeout
    ExternalTimeout,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Chain data
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            // Audit backend
            Self::AuditRequestFailed => "AUDIT_REQUEST_FAILED",
            Self::AuditRejected => "AUDIT_REJECTED",

            // API
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",

            // Configuration
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Error pipeline
            Self::AnalyticsSinkFailed => "TELEMETRY_SINK_FAILED",
            Self::TelemetryExportFailed => "TELEMETRY_EXPORT_FAILED",
            Self::ActionUnavailable => "ACTION_UNAVAILABLE",
            Self::ActionFailed => "ACTION_FAILED",

            // Generic
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue | Self::ActionUnavailable => 400,
            Self::ApiRateLimited | Self::RpcRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcTimeout
                | Self::RpcRateLimited
                | Self::RpcConnectionFailed
                | Self::AuditRequestFailed
                | Self::ExternalTimeout
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// RPC connection failed
    pub fn rpc_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcConnectionFailed, msg)
    }

    /// RPC timeout
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    /// RPC rate limited
    pub fn rpc_rate_limited() -> Self {
        Self::new(ErrorCode::RpcRateLimited, "Rate limited (HTTP 429)")
    }

    /// RPC error object in response
    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg)
    }

    /// Malformed RPC response
    pub fn rpc_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcInvalidResponse, msg)
    }

    /// Audit backend rejected the request
    pub fn audit_rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuditRejected, msg)
    }

    /// Analytics sink failure
    pub fn sink_failed(sink: &str, msg: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AnalyticsSinkFailed,
            format!("{}: {}", sink, msg.into()),
        )
    }

    /// Solution has nothing to execute
    pub fn action_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ActionUnavailable, msg)
    }

    /// Automatic solution action failed
    pub fn action_failed(action: &str, source: AppError) -> Self {
        Self::with_source(
            ErrorCode::ActionFailed,
            format!("Action {} failed: {}", action, source.message),
            source,
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::rpc_timeout("Connection timed out");
        assert_eq!(err.code, ErrorCode::RpcTimeout);
        assert_eq!(err.code_str(), "RPC_TIMEOUT");
        assert_eq!(err.to_string(), "[RPC_TIMEOUT] Connection timed out");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RpcTimeout.is_retryable());
        assert!(ErrorCode::AuditRequestFailed.is_retryable());
        assert!(!ErrorCode::ActionUnavailable.is_retryable());
        assert!(!ErrorCode::ActionFailed.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::RpcRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::Unknown.http_status(), 500);
    }

    #[test]
    fn test_action_failed_keeps_source() {
        let err = AppError::action_failed("switch_rpc", AppError::rpc_timeout("no answer"));
        assert_eq!(err.code_str(), "ACTION_FAILED");
        assert!(err.message.contains("switch_rpc"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("[RPC_TIMEOUT] no answer"));
    }

    #[test]
    fn test_sink_failed_message() {
        let err = AppError::sink_failed("webhook", "HTTP 500");
        assert_eq!(err.code, ErrorCode::AnalyticsSinkFailed);
        assert!(err.message.contains("webhook"));
    }
}
