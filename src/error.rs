//! Error types and handling for Octolog
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Octolog operations
pub type Result<T> = std::result::Result<T, OctologError>;

/// Main error type for Octolog
#[derive(Debug, Error)]
pub enum OctologError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors (connect, timeout, TLS)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Octopus API returned something we cannot use
    #[error("API error: {message}")]
    Api { message: String },

    /// Non-success HTTP status from the Octopus API
    #[error("HTTP error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Authentication/authorization errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// An endpoint needs an API key and none was configured
    #[error("{endpoint} requires authorisation and no key provided")]
    ApiKeyMissing { endpoint: String },

    /// The API asked us to back off
    #[error("Rate limited by the Octopus API")]
    RateLimited,

    /// Pagination ran past its cap or looped
    #[error("Pagination error: {message}")]
    Pagination { message: String },

    /// Time-series store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl OctologError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        OctologError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        OctologError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        OctologError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        OctologError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        OctologError::Api {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    pub fn http<S: Into<String>>(status: u16, body: S) -> Self {
        OctologError::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        OctologError::Auth {
            message: message.into(),
        }
    }

    /// Create a new missing API key error
    pub fn api_key_missing<S: Into<String>>(endpoint: S) -> Self {
        OctologError::ApiKeyMissing {
            endpoint: endpoint.into(),
        }
    }

    /// Create a new pagination error
    pub fn pagination<S: Into<String>>(message: S) -> Self {
        OctologError::Pagination {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        OctologError::Store {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        OctologError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for OctologError {
    fn from(err: std::io::Error) -> Self {
        OctologError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for OctologError {
    fn from(err: serde_yaml::Error) -> Self {
        OctologError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OctologError {
    fn from(err: serde_json::Error) -> Self {
        OctologError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for OctologError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return OctologError::Serialization {
                message: err.to_string(),
            };
        }
        OctologError::network(err.to_string())
    }
}

#[cfg(feature = "influx")]
impl From<influxdb::Error> for OctologError {
    fn from(err: influxdb::Error) -> Self {
        OctologError::store(err.to_string())
    }
}

impl From<chrono::ParseError> for OctologError {
    fn from(err: chrono::ParseError) -> Self {
        OctologError::validation("datetime", err.to_string())
    }
}
