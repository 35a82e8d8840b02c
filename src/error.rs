use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Main error type for eventdesk
#[derive(Error, Debug)]
pub enum DeskError {
    /// Local check failed before anything was sent
    #[error("{0}")]
    Validation(String),

    /// The backend rejected our credentials (401/403)
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Any other non-2xx response
    #[error("request failed ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Parsed error body, absent when the body was not JSON
        payload: Option<Value>,
    },

    /// No response was received
    #[error("network error: {0}")]
    Network(String),

    /// A 2xx response whose body we could not interpret
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Durable storage could not be read or written
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

/// Type alias for eventdesk results
pub type DeskResult<T> = Result<T, DeskError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationFailed,
    AuthenticationFailed,
    PermissionDenied,
    ApiRequestFailed,
    ApiServerError,
    NetworkUnreachable,
    ResponseInvalid,
    StorageFailed,
    ConfigInvalid,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code_str = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::AuthenticationFailed => "AUTH_FAILED",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::ApiRequestFailed => "API_REQUEST_FAILED",
            ErrorCode::ApiServerError => "API_SERVER_ERROR",
            ErrorCode::NetworkUnreachable => "NETWORK_UNREACHABLE",
            ErrorCode::ResponseInvalid => "RESPONSE_INVALID",
            ErrorCode::StorageFailed => "STORAGE_FAILED",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
        };
        write!(f, "{}", code_str)
    }
}

/// Error category for filtering and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rejected locally, never sent
    Validation,
    /// Session is missing or no longer accepted
    Authentication,
    /// The backend answered with an error
    Service,
    /// The backend could not be reached
    Network,
    /// Local storage, configuration, decoding
    Internal,
}

impl DeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        DeskError::Validation(message.into())
    }

    pub fn storage(error: impl fmt::Display) -> Self {
        DeskError::Storage(error.to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DeskError::Validation(_) => ErrorCode::ValidationFailed,
            DeskError::Auth { status: 403, .. } => ErrorCode::PermissionDenied,
            DeskError::Auth { .. } => ErrorCode::AuthenticationFailed,
            DeskError::Api { status, .. } if *status >= 500 => ErrorCode::ApiServerError,
            DeskError::Api { .. } => ErrorCode::ApiRequestFailed,
            DeskError::Network(_) => ErrorCode::NetworkUnreachable,
            DeskError::Decode(_) => ErrorCode::ResponseInvalid,
            DeskError::Storage(_) => ErrorCode::StorageFailed,
            DeskError::Config(_) => ErrorCode::ConfigInvalid,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DeskError::Validation(_) => ErrorCategory::Validation,
            DeskError::Auth { .. } => ErrorCategory::Authentication,
            DeskError::Api { .. } => ErrorCategory::Service,
            DeskError::Network(_) => ErrorCategory::Network,
            DeskError::Decode(_) | DeskError::Storage(_) | DeskError::Config(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// HTTP status carried by the error, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            DeskError::Auth { status, .. } | DeskError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 responses; the session should end
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, DeskError::Auth { .. })
    }

    /// Whether a read may be served from the local collection cache instead.
    /// Only transport failures and server-side (5xx) errors qualify.
    pub fn allows_cache_fallback(&self) -> bool {
        match self {
            DeskError::Network(_) => true,
            DeskError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            DeskError::Validation(message) => message.clone(),
            DeskError::Auth { message, .. } => format!("Authentication failed: {}", message),
            DeskError::Api { message, .. } => message.clone(),
            DeskError::Network(_) => "Unable to reach the server".to_string(),
            DeskError::Decode(_) => "The server sent an unexpected response".to_string(),
            DeskError::Storage(_) => "Local storage is unavailable".to_string(),
            DeskError::Config(message) => format!("Invalid configuration: {}", message),
        }
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(error: serde_json::Error) -> Self {
        DeskError::Decode(error.to_string())
    }
}
