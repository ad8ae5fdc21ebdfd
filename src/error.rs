//! Unified error types for the GA4 reporting dashboard.

use reqwest::StatusCode;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Service account credentials not found: {0}")]
    MissingCredentials(String),

    #[error("Malformed service account JSON from {source_name}: {detail}")]
    MalformedCredentials { source_name: String, detail: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token request failed with status {status}: {body}")]
    TokenRequestFailed { status: StatusCode, body: String },

    #[error("Token parse error: {0}")]
    TokenParse(String),

    #[error("JWT signing error: {0}")]
    JwtSign(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to create HTTP client: {0}")]
    HttpClientInit(String),
}

/// Upstream report request/response errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("Data API error [{code}]: {message}")]
    Upstream {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Malformed report response: {0}")]
    MalformedResponse(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClientInit(String),
}

/// CSV export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
