//! Error handling for TorqueSrv
//!
//! One error type covers both the per-request pipeline and startup. Request
//! errors map onto an HTTP status; startup errors never reach a client and
//! stop the process before it serves traffic.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, TorqueError>;

/// TorqueSrv error types
#[derive(Error, Debug)]
pub enum TorqueError {
    // ======================================
    // Request errors
    // ======================================
    #[error("missing {0} URL parameter")]
    MissingParameter(&'static str),

    #[error("invalid time URL parameter '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Error creating InfluxDB Point: {0}")]
    InvalidPoint(String),

    #[error("Error writing data to InfluxDB: {0}")]
    Write(String),

    // ======================================
    // Startup errors
    // ======================================
    #[error("Error preparing dict: {path}: {message}")]
    Dictionary { path: String, message: String },

    #[error("Error preparing dict: {path}:{line}: expected raw_key,canonical_key")]
    MalformedDictionary { path: String, line: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error creating InfluxDB Client: {0}")]
    Client(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl TorqueError {
    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create point construction error
    pub fn invalid_point(message: impl Into<String>) -> Self {
        Self::InvalidPoint(message.into())
    }

    /// Create storage write error
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }

    /// HTTP status reported to the caller (and recorded in the access log)
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTimestamp { .. }
            | Self::InvalidPoint(_)
            | Self::Write(_)
            | Self::Dictionary { .. }
            | Self::MalformedDictionary { .. }
            | Self::Config(_)
            | Self::Client(_)
            | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned to the caller
    ///
    /// Storage failures are reported without the backend's detail; the full
    /// reason only goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            Self::Write(_) => "Error writing data to InfluxDB".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<figment::Error> for TorqueError {
    fn from(err: figment::Error) -> Self {
        Self::config(err.to_string())
    }
}

// Plain-text body, newline terminated
impl IntoResponse for TorqueError {
    fn into_response(self) -> Response {
        (self.status_code(), format!("{}\n", self.client_message())).into_response()
    }
}
