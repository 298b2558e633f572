//! Errors returned by the hosted backend services.

use thiserror::Error;

/// Errors that can occur when talking to the auth, store or storage service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error.
    ///
    /// Displays the service's own message so it can be shown to the user
    /// as-is.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Zero (or, for single-row reads, several) matching rows or objects.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body or header could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The store refused a status change.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl BackendError {
    /// HTTP status code if the service answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
