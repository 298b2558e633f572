//! Seams to the hosted backend.
//!
//! The portal never owns data. Everything goes through four services:
//!
//! - [`AuthProvider`] - sessions (sign-in, sign-out, change notifications)
//! - [`ProfileStore`] - the `profiles` table
//! - [`SubmissionStore`] - the `kyc_submissions` table
//! - [`DocumentStorage`] - the object store holding uploaded ID documents
//!
//! [`crate::supabase::SupabaseClient`] implements all four. Components are
//! generic over the traits they need so tests can substitute in-memory fakes.

mod error;

pub use error::BackendError;

use std::future::Future;

use chrono::{DateTime, Utc};
use kyc_core::{
    DocumentFile, Email, KycStatus, KycSubmission, NewKycSubmission, Profile, ProfileId,
    SubmissionId,
};
use secrecy::SecretString;
use serde::Deserialize;
use tokio::sync::watch;

use crate::config::redact;

/// The authenticated user a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: ProfileId,
    #[serde(default)]
    pub email: Option<Email>,
}

/// Opaque proof of authentication issued by the auth provider.
///
/// The portal only carries it around; it never validates the token.
#[derive(Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token has passed its expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_ref().map(redact))
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Handle on the auth provider's session-change notifications.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    /// Wrap a receiver of the provider's session channel.
    #[must_use]
    pub const fn new(receiver: watch::Receiver<Option<Session>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next sign-in or sign-out.
    ///
    /// Returns `None` once the provider has gone away.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Treat the latest value as already handled.
    pub fn mark_seen(&mut self) {
        self.receiver.borrow_and_update();
    }
}

/// Identity and session management.
pub trait AuthProvider: Send + Sync {
    /// The session currently held by the provider, refreshed if it expired.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, BackendError>> + Send;

    /// Subscribe to sign-in and sign-out notifications.
    fn on_session_change(&self) -> SessionSubscription;

    /// Sign in with email and password.
    fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<Session, BackendError>> + Send;

    /// Register a new account.
    ///
    /// Returns `None` when the provider requires email confirmation before
    /// issuing a session.
    fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<Option<Session>, BackendError>> + Send;

    /// Invalidate the current session.
    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Read access to `profiles`.
pub trait ProfileStore: Send + Sync {
    /// Fetch exactly one profile by id.
    ///
    /// Fails with [`BackendError::NotFound`] on zero or multiple rows.
    fn profile_by_id(
        &self,
        id: ProfileId,
    ) -> impl Future<Output = Result<Profile, BackendError>> + Send;

    /// Total number of profiles.
    fn count_profiles(&self) -> impl Future<Output = Result<u64, BackendError>> + Send;
}

/// Access to `kyc_submissions`.
pub trait SubmissionStore: Send + Sync {
    /// Insert one submission. Status and owner are server defaults.
    fn insert_submission(
        &self,
        submission: &NewKycSubmission,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// All submissions, newest first.
    fn list_submissions(
        &self,
    ) -> impl Future<Output = Result<Vec<KycSubmission>, BackendError>> + Send;

    /// Set the status of a pending submission.
    ///
    /// Fails with [`BackendError::InvalidTransition`] if the row is not
    /// pending any more.
    fn update_submission_status(
        &self,
        id: SubmissionId,
        status: KycStatus,
    ) -> impl Future<Output = Result<KycSubmission, BackendError>> + Send;
}

/// Object storage for uploaded documents.
pub trait DocumentStorage: Send + Sync {
    /// Upload a document under `key` in `bucket`.
    fn upload(
        &self,
        bucket: &str,
        key: &str,
        file: &DocumentFile,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Public address of an object. Does not check that it exists.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Delete an object.
    fn remove(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
