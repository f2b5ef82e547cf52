// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page returned something other than HTTP 200
    #[error("Failed to fetch {url}: HTTP status {status}")]
    FetchStatus { url: String, status: u16 },

    /// Transport-level HTTP failure (DNS, TLS, timeout, ...)
    #[error("Failed to fetch {url}: {message}")]
    FetchTransport { url: String, message: String },

    /// A structural anchor or date pattern was not found in the markup
    #[error("Extraction failed: {0}")]
    Extract(String),

    /// Snapshot could not be read
    #[error("Failed to read snapshot {path:?}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be written
    #[error("Failed to write snapshot {path:?}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Log file could not be opened for append
    #[error("Failed to open log file {path:?}: {source}")]
    LogSink {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Mail relay rejected or failed a message
    #[error("Failed to send email to {receiver}: {message}")]
    Send { receiver: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regex compilation failed
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an extraction error.
    pub fn extract(message: impl Into<String>) -> Self {
        Self::Extract(message.into())
    }

    /// Create a send error for a single receiver.
    pub fn send(receiver: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Send {
            receiver: receiver.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for an error that ends the run.
    ///
    /// | code | meaning                                   |
    /// |------|-------------------------------------------|
    /// | 1    | fetch or current-page extraction failure |
    /// | 2    | notification failure                     |
    /// | 3    | malformed or invalid configuration       |
    /// | 4    | snapshot store failure                   |
    /// | 5    | unexpected I/O or serialization failure  |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::FetchStatus { .. }
            | Self::FetchTransport { .. }
            | Self::Http(_)
            | Self::Extract(_) => 1,
            Self::Send { .. } => 2,
            Self::Config(_)
            | Self::Selector { .. }
            | Self::Toml(_)
            | Self::Url(_)
            | Self::Regex(_)
            | Self::LogSink { .. } => 3,
            Self::StoreRead { .. } | Self::StoreWrite { .. } => 4,
            Self::Io(_) | Self::Json(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_exit_with_one() {
        let err = AppError::FetchStatus {
            url: "https://example.com".into(),
            status: 503,
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Failed to fetch https://example.com: HTTP status 503");
        assert_eq!(AppError::extract("no caption").exit_code(), 1);
    }

    #[test]
    fn test_exit_codes_by_kind() {
        assert_eq!(AppError::send("a@x.com", "auth failed").exit_code(), 2);
        assert_eq!(AppError::config("missing section").exit_code(), 3);
        let err = AppError::StoreRead {
            path: PathBuf::from("webpage_content_20240101000000.txt"),
            source: std::io::Error::other("truncated"),
        };
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_only_store_errors_exit_with_four() {
        let err = AppError::LogSink {
            path: "/var/log/perm-watch.log".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().starts_with("Failed to open log file"));

        let err = AppError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.exit_code(), 5);
        let err = AppError::from(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(err.exit_code(), 5);
    }
}
