use eventsource_stream::EventStreamError;
use thiserror::Error;

/// Errors talking to the realtime database
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Permission denied for {0}. Check the database rules or the auth token.")]
    PermissionDenied(String),

    #[error("Invalid database URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Stream for {path} was closed by the server: {reason}")]
    StreamClosed { path: String, reason: String },

    #[error("Malformed stream event: {0}")]
    BadEvent(String),

    #[error("{0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("Request timed out: {}", e)
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else if let Some(status) = e.status() {
            format!("HTTP {} error: {}", status.as_u16(), e)
        } else {
            format!("HTTP error: {}", e)
        };
        StoreError::Http(message)
    }
}

impl From<EventStreamError<reqwest::Error>> for StoreError {
    fn from(e: EventStreamError<reqwest::Error>) -> Self {
        match e {
            EventStreamError::Transport(e) => e.into(),
            other => StoreError::BadEvent(other.to_string()),
        }
    }
}

impl StoreError {
    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(_) => true,
            StoreError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
