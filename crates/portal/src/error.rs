//! Unified error handling for portal front ends.

use kyc_core::{DocumentError, EmailError, StatusError};
use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::dashboard::ReviewError;
use crate::form::FormError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Auth, store or storage call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Submission form rejected the draft or failed to submit.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Review action was not applied.
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// Chosen document is not acceptable.
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error(transparent)]
    Status(#[from] StatusError),

    /// No session, or the session expired.
    #[error("Not signed in: {0}")]
    NotAuthenticated(String),

    /// Signed in, but the role does not allow this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted session could not be read or written.
    #[error("Session file error: {0}")]
    SessionFile(String),
}

impl AppError {
    /// Whether the error comes from the environment rather than the user.
    ///
    /// Front ends report these to error tracking.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Io(_)
                | Self::SessionFile(_)
                | Self::Backend(BackendError::Http(_) | BackendError::Parse(_))
        )
    }
}
