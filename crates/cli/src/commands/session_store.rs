//! Persisted session between CLI invocations.
//!
//! The session is written as JSON to `KYC_SESSION_FILE` (default
//! `.kyc-session.json`). On Unix the file is created with mode `0600`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use kyc_core::{Email, ProfileId};
use kyc_portal::{AppError, AuthUser, Session};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

/// On-disk shape of a [`Session`].
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    user_id: ProfileId,
    email: Option<Email>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_owned(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|token| token.expose_secret().to_owned()),
            expires_at: session.expires_at,
            user_id: session.user.id,
            email: session.user.email.clone(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
            expires_at: stored.expires_at,
            user: AuthUser {
                id: stored.user_id,
                email: stored.email,
            },
        }
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Option<Session>, AppError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&content).map_err(|e| {
            AppError::SessionFile(format!("{}: {e}", self.path.display()))
        })?;

        Ok(Some(stored.into()))
    }

    /// Save `session`, or remove the file when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or removed.
    pub async fn sync(&self, session: Option<&Session>) -> Result<(), AppError> {
        match session {
            Some(session) => self.save(session).await,
            None => self.clear().await,
        }
    }

    async fn save(&self, session: &Session) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(&StoredSession::from(session))
            .map_err(|e| AppError::SessionFile(e.to_string()))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(&json).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
