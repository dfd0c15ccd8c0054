//! Error types for the storefront client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the storefront client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh {
        status: Option<u16>,
        message: String,
    },

    #[error("Session ended, log in again")]
    SessionEnded,

    #[error("Invalid role in auth response: {role:?}")]
    InvalidRole { role: Option<String> },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ============================================================================
    // Session Storage Errors
    // ============================================================================
    #[error("Session store error: {message}")]
    Session { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a token refresh error
    pub fn token_refresh(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::TokenRefresh {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a session store error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Whether this error means the caller is no longer authenticated
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized { .. } | Error::TokenRefresh { .. } | Error::SessionEnded
        )
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { .. } => Some(401),
            Error::HttpStatus { status, .. } => Some(*status),
            Error::TokenRefresh { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for the storefront client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::validation("email", "must contain '@'");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'email': must contain '@'"
        );

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::token_refresh(Some(401), "refresh rejected");
        assert_eq!(err.to_string(), "Token refresh failed: refresh rejected");
    }

    #[test]
    fn test_is_auth_failure() {
        assert!(Error::Unauthorized {
            body: String::new()
        }
        .is_auth_failure());
        assert!(Error::token_refresh(None, "boom").is_auth_failure());
        assert!(Error::SessionEnded.is_auth_failure());

        assert!(!Error::http_status(401, "").is_auth_failure());
        assert!(!Error::http_status(500, "").is_auth_failure());
        assert!(!Error::config("test").is_auth_failure());
    }

    #[test]
    fn test_status() {
        assert_eq!(
            Error::Unauthorized {
                body: String::new()
            }
            .status(),
            Some(401)
        );
        assert_eq!(Error::http_status(403, "").status(), Some(403));
        assert_eq!(Error::token_refresh(Some(500), "").status(), Some(500));
        assert_eq!(Error::SessionEnded.status(), None);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
