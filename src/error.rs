//! Error types for post-harvest
//!
//! This module provides the error handling surface for the library:
//! - Domain-specific error types (Database, Fetch, Task, etc.)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for post-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for post-harvest
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "credentials")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Transient failure while fetching from the content platform
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Invalid task submission (bad query, bad target count)
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Task not found
    #[error("task not found: {0}")]
    NotFound(String),

    /// A strategy error that escaped its own handling and failed the task
    #[error("task error: {0}")]
    Task(String),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// I/O error (export log, database directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
///
/// `ConnectionFailed` at startup is fatal: `Harvester::new` propagates it
/// and the process never starts serving tasks.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Errors from the remote content platform
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// Authentication against the platform failed for a credential
    #[error("auth failed for credential {label}: {reason}")]
    Auth {
        /// User-agent label of the failing credential
        label: String,
        /// Why the token request was rejected
        reason: String,
    },

    /// The platform returned a non-success status
    #[error("platform returned status {status}: {body}")]
    Status {
        /// HTTP status code from the platform
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// The listing payload could not be decoded
    #[error("malformed listing: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "Task 123 not found",
///     "details": {
///       "task_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "service unavailable" error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidTask(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Task(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Fetch(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Fetch(e) => match e {
                FetchError::Network(_) => "fetch_network_error",
                FetchError::Auth { .. } => "fetch_auth_error",
                FetchError::Status { .. } => "fetch_status_error",
                FetchError::Decode(_) => "fetch_decode_error",
            },
            Error::InvalidTask(_) => "invalid_task",
            Error::NotFound(_) => "not_found",
            Error::Task(_) => "task_error",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Fetch(FetchError::Status { status, .. }) => Some(serde_json::json!({
                "platform_status": status,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a vec of (Error, expected_status_code, expected_error_code) for
    /// every reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("credentials".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::InvalidTask("query contains spaces".into()),
                400,
                "invalid_task",
            ),
            (Error::NotFound("task 99".into()), 404, "not_found"),
            (
                Error::Database(DatabaseError::QueryFailed("timeout".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Task("strategy panicked".into()), 500, "task_error"),
            (Error::Other("unknown".into()), 500, "internal_error"),
            (
                Error::Fetch(FetchError::Network("connection reset".into())),
                502,
                "fetch_network_error",
            ),
            (
                Error::Fetch(FetchError::Auth {
                    label: "agent-1".into(),
                    reason: "invalid_grant".into(),
                }),
                502,
                "fetch_auth_error",
            ),
            (
                Error::Fetch(FetchError::Status {
                    status: 429,
                    body: "too many requests".into(),
                }),
                502,
                "fetch_status_error",
            ),
            (
                Error::Fetch(FetchError::Decode("missing children".into())),
                502,
                "fetch_decode_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    #[test]
    fn fetch_error_is_502_bad_gateway() {
        let err = Error::Fetch(FetchError::Network("connection refused".into()));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn shutting_down_is_503() {
        assert_eq!(Error::ShuttingDown.status_code(), 503);
    }

    #[test]
    fn invalid_task_is_400_not_500() {
        let err = Error::InvalidTask("target_count must be positive".into());
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn api_error_from_fetch_status_has_platform_status() {
        let err = Error::Fetch(FetchError::Status {
            status: 503,
            body: "upstream busy".into(),
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "fetch_status_error");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["platform_status"], 503);
    }

    #[test]
    fn api_error_from_config_with_key_has_key_detail() {
        let err = Error::Config {
            message: "no credentials configured".into(),
            key: Some("credentials".into()),
        };
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "config_error");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["key"], "credentials");
    }

    #[test]
    fn api_error_from_not_found_has_no_details() {
        let err = Error::NotFound("task 7".into());
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "not_found");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::Task("community handle unavailable".into());
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(api.error.message, display_msg);
    }

    #[test]
    fn api_error_factories_produce_expected_codes() {
        assert_eq!(ApiError::not_found("Task 123").error.code, "not_found");
        assert_eq!(
            ApiError::not_found("Task 123").error.message,
            "Task 123 not found"
        );
        assert_eq!(
            ApiError::validation("query is required").error.code,
            "validation_error"
        );
        assert_eq!(ApiError::internal("boom").error.code, "internal_error");
        assert_eq!(
            ApiError::service_unavailable("shutting down").error.code,
            "service_unavailable"
        );
    }

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api = ApiError::new("test_code", "test message");

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }

    #[test]
    fn api_error_round_trips_through_json() {
        let original = ApiError::with_details(
            "not_found",
            "Task 42 not found",
            serde_json::json!({"task_id": 42}),
        );

        let json_str = serde_json::to_string(&original).unwrap();
        let deserialized: ApiError = serde_json::from_str(&json_str).unwrap();

        assert_eq!(deserialized.error.code, original.error.code);
        assert_eq!(deserialized.error.message, original.error.message);
        assert_eq!(deserialized.error.details, original.error.details);
    }
}
