use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Main error type for the Buddi service
#[derive(Debug)]
pub enum BuddiError {
    /// Configuration or CLI argument errors
    Config(String),

    /// No route for the requested path
    NotFound(String),

    /// Outbound delivery errors
    Transport(String),

    /// Reply generation errors
    Reply(String),

    /// API/HTTP related errors
    Api(String),

    /// System I/O errors
    Io(std::io::Error),

    /// Serialization/deserialization errors
    Serialization(serde_json::Error),

    /// Task join or lock errors
    Concurrency(String),
}

impl fmt::Display for BuddiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuddiError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BuddiError::NotFound(path) => write!(f, "Not found: {}", path),
            BuddiError::Transport(msg) => write!(f, "Transport error: {}", msg),
            BuddiError::Reply(msg) => write!(f, "Reply generation error: {}", msg),
            BuddiError::Api(msg) => write!(f, "API error: {}", msg),
            BuddiError::Io(err) => write!(f, "I/O error: {}", err),
            BuddiError::Serialization(err) => write!(f, "Serialization error: {}", err),
            BuddiError::Concurrency(msg) => write!(f, "Concurrency error: {}", msg),
        }
    }
}

impl std::error::Error for BuddiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuddiError::Io(err) => Some(err),
            BuddiError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

// Convenient type alias for Results using our error type
pub type Result<T> = std::result::Result<T, BuddiError>;

impl IntoResponse for BuddiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.user_message(),
                "type": self.error_type(),
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl BuddiError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BuddiError::Config(_) => StatusCode::BAD_REQUEST,
            BuddiError::NotFound(_) => StatusCode::NOT_FOUND,
            BuddiError::Transport(_) => StatusCode::BAD_GATEWAY,
            BuddiError::Reply(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BuddiError::Api(_) => StatusCode::BAD_REQUEST,
            BuddiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BuddiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BuddiError::Concurrency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            BuddiError::Config(msg) => format!("Configuration error: {}", msg),
            BuddiError::NotFound(_) => "The requested endpoint does not exist".to_string(),
            BuddiError::Transport(_) => "Message delivery failed. Please try again later.".to_string(),
            BuddiError::Reply(_) => "Could not generate a reply. Please try again later.".to_string(),
            BuddiError::Api(msg) => format!("Invalid request: {}", msg),
            BuddiError::Io(_) => "Internal server error. Please try again later.".to_string(),
            BuddiError::Serialization(_) => {
                "Data processing error. Please check your request format.".to_string()
            }
            BuddiError::Concurrency(_) => "Internal server error. Please try again later.".to_string(),
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            BuddiError::Config(_) => "configuration_error",
            BuddiError::NotFound(_) => "not_found",
            BuddiError::Transport(_) => "transport_error",
            BuddiError::Reply(_) => "reply_error",
            BuddiError::Api(_) => "api_error",
            BuddiError::Io(_) => "io_error",
            BuddiError::Serialization(_) => "serialization_error",
            BuddiError::Concurrency(_) => "concurrency_error",
        }
    }
}

// Conversions from common error types
impl From<std::io::Error> for BuddiError {
    fn from(err: std::io::Error) -> Self {
        BuddiError::Io(err)
    }
}

impl From<serde_json::Error> for BuddiError {
    fn from(err: serde_json::Error) -> Self {
        BuddiError::Serialization(err)
    }
}

impl From<reqwest::Error> for BuddiError {
    fn from(err: reqwest::Error) -> Self {
        BuddiError::Transport(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BuddiError {
    fn from(err: tokio::task::JoinError) -> Self {
        BuddiError::Concurrency(err.to_string())
    }
}

// Helper macros for common error construction patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::BuddiError::Config($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::BuddiError::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! transport_error {
    ($msg:expr) => {
        $crate::error::BuddiError::Transport($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::BuddiError::Transport(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! api_error {
    ($msg:expr) => {
        $crate::error::BuddiError::Api($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::BuddiError::Api(format!($fmt, $($arg)*))
    };
}
