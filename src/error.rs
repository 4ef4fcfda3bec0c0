//! Error types for dashboard data loading
//!
//! Errors are split by where they surface:
//! - ApiError: a REST call failed (transport, status, decoding)
//! - FetchFailure: the serializable form a fetcher stores in its state
//! - ConfigError: the config file could not be located, read or parsed

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single REST call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),
}

impl ApiError {
    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    fn kind(&self) -> FailureKind {
        match self {
            ApiError::Http(e) if e.is_decode() => FailureKind::Decode,
            ApiError::Http(_) => FailureKind::Network,
            ApiError::Status { status, .. } if *status == 401 || *status == 403 => {
                FailureKind::Unauthorized
            }
            ApiError::Status { status, .. } if *status == 404 => FailureKind::NotFound,
            ApiError::Status { .. } => FailureKind::Server,
            ApiError::InvalidUrl(_) | ApiError::InvalidSlug(_) => FailureKind::Request,
        }
    }
}

/// Broad classification of a failed fetch, surfaced to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Network,
    Unauthorized,
    NotFound,
    Server,
    Decode,
    Request,
}

/// Serializable error representation held in `FetchState`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub message: String,
    pub kind: FailureKind,
    pub status: Option<u16>,
}

impl From<&ApiError> for FetchFailure {
    fn from(err: &ApiError) -> Self {
        FetchFailure {
            message: err.to_string(),
            kind: err.kind(),
            status: err.status(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Config file not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
