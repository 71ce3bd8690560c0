//! Error types for Flux Action

use thiserror::Error;

/// Main error type for the workflow console
#[derive(Error, Debug)]
pub enum FluxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl FluxError {
    /// True for errors raised before any network call was attempted
    pub fn is_config(&self) -> bool {
        matches!(self, FluxError::Config(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FluxError::Http { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FluxError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FluxError::Http {
                status: status.as_u16(),
            },
            None => FluxError::Transport(err.to_string()),
        }
    }
}
