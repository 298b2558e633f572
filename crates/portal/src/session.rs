//! Session controller.
//!
//! Tracks who is signed in, loads their profile and decides which surface is
//! shown. Session changes arrive through a [`SessionSubscription`] held for
//! the controller's lifetime; dropping the controller releases it.

use std::sync::Arc;

use kyc_core::{Email, Profile, UserRole};
use secrecy::SecretString;
use tracing::{debug, error, info, instrument};

use crate::backend::{AuthProvider, BackendError, ProfileStore, Session, SessionSubscription};

/// The surface to show for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Nobody is signed in.
    SignIn,
    /// A session exists and its profile is being fetched.
    Loading,
    /// Regular users submit their KYC details.
    SubmissionForm,
    /// Admins review submissions.
    ReviewDashboard,
}

impl View {
    #[must_use]
    pub const fn for_role(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::ReviewDashboard,
            UserRole::User => Self::SubmissionForm,
        }
    }
}

/// Owns the session, the matching profile and the change subscription.
pub struct SessionController<B> {
    backend: Arc<B>,
    session: Option<Session>,
    profile: Option<Profile>,
    loading: bool,
    subscription: Option<SessionSubscription>,
}

impl<B> SessionController<B>
where
    B: AuthProvider + ProfileStore,
{
    /// A controller that has not looked at the provider yet.
    #[must_use]
    pub const fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            session: None,
            profile: None,
            loading: true,
            subscription: None,
        }
    }

    /// Subscribe to session changes and load the current session.
    ///
    /// A failed session fetch is logged and treated as signed out.
    #[instrument(skip(self))]
    pub async fn mount(&mut self) {
        self.subscription = Some(self.backend.on_session_change());

        let session = match self.backend.current_session().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Failed to fetch current session");
                None
            }
        };

        self.apply(session).await;
    }

    /// Wait for the next sign-in or sign-out and apply it.
    ///
    /// Returns `false` when there is nothing left to wait for (not mounted,
    /// or the provider went away).
    pub async fn next_change(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        match subscription.changed().await {
            Some(session) => {
                self.apply(session).await;
                true
            }
            None => false,
        }
    }

    /// Sign in and load the new user's profile.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the credentials are rejected.
    pub async fn sign_in(
        &mut self,
        email: &Email,
        password: &SecretString,
    ) -> Result<(), BackendError> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        self.drain_pending_change();
        self.apply(Some(session)).await;
        Ok(())
    }

    /// Register and, if the provider issues a session right away, sign in.
    ///
    /// Returns whether a session was issued.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if registration is refused.
    pub async fn sign_up(
        &mut self,
        email: &Email,
        password: &SecretString,
    ) -> Result<bool, BackendError> {
        let Some(session) = self.backend.sign_up(email, password).await? else {
            return Ok(false);
        };
        self.drain_pending_change();
        self.apply(Some(session)).await;
        Ok(true)
    }

    /// Sign out with the provider and forget the profile.
    ///
    /// The local state is reset even if the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after resetting local state.
    pub async fn sign_out(&mut self) -> Result<(), BackendError> {
        let result = self.backend.sign_out().await;
        self.drain_pending_change();
        self.session = None;
        self.profile = None;
        self.loading = false;
        result
    }

    #[must_use]
    pub fn view(&self) -> View {
        if self.session.is_none() {
            return View::SignIn;
        }
        if self.loading {
            return View::Loading;
        }
        View::for_role(self.role())
    }

    /// Role of the signed-in user; least privilege when unknown.
    #[must_use]
    pub fn role(&self) -> UserRole {
        UserRole::effective(self.profile.as_ref().map(|profile| profile.role))
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Shared backend handle, for the surfaces this controller selects.
    #[must_use]
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// Mark a notification caused by our own call as seen.
    fn drain_pending_change(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.mark_seen();
        }
    }

    async fn apply(&mut self, session: Option<Session>) {
        self.session = session;
        self.profile = None;

        let Some(session) = self.session.as_ref() else {
            debug!("No session; showing sign-in");
            self.loading = false;
            return;
        };

        let user_id = session.user.id;
        self.loading = true;

        match self.backend.profile_by_id(user_id).await {
            Ok(profile) => {
                info!(user_id = %user_id, role = %profile.role, "Profile loaded");
                self.profile = Some(profile);
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to fetch profile");
            }
        }

        self.loading = false;
    }
}

impl<B> std::fmt::Debug for SessionController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.session)
            .field("profile", &self.profile)
            .field("loading", &self.loading)
            .field("subscribed", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{Call, FakeBackend};

    fn backend() -> Arc<FakeBackend> {
        Arc::new(FakeBackend::new())
    }

    #[test]
    fn test_unmounted_controller_is_signed_out() {
        let controller = SessionController::new(backend());
        assert_eq!(controller.view(), View::SignIn);
        assert!(controller.is_loading());
        assert!(!controller.is_subscribed());
    }

    #[tokio::test]
    async fn test_mount_without_session_shows_sign_in() {
        let backend = backend();
        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;

        assert_eq!(controller.view(), View::SignIn);
        assert!(!controller.is_loading());
        assert_eq!(backend.calls(), vec![Call::CurrentSession]);
    }

    #[tokio::test]
    async fn test_mount_routes_by_role() {
        let backend = backend();
        let admin = backend.add_profile(UserRole::Admin);
        backend.emit_session(Some(admin));

        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;

        assert_eq!(controller.view(), View::ReviewDashboard);
        assert_eq!(controller.role(), UserRole::Admin);
        assert_eq!(
            backend.calls(),
            vec![Call::CurrentSession, Call::ProfileById(admin)]
        );
    }

    #[tokio::test]
    async fn test_session_fetch_failure_degrades_to_sign_in() {
        let backend = backend();
        let user = backend.add_profile(UserRole::User);
        backend.emit_session(Some(user));
        backend.fail("session");

        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;

        assert_eq!(controller.view(), View::SignIn);
        assert!(controller.is_subscribed());
    }

    #[tokio::test]
    async fn test_profile_failure_falls_back_to_least_privilege() {
        let backend = backend();
        let admin = backend.add_profile(UserRole::Admin);
        backend.emit_session(Some(admin));
        backend.fail("profile");

        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;

        assert!(!controller.is_loading());
        assert!(controller.profile().is_none());
        assert_eq!(controller.role(), UserRole::User);
        assert_eq!(controller.view(), View::SubmissionForm);
    }

    #[tokio::test]
    async fn test_session_change_reloads_profile() {
        let backend = backend();
        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;
        assert_eq!(controller.view(), View::SignIn);

        let user = backend.add_profile(UserRole::User);
        backend.emit_session(Some(user));
        assert!(controller.next_change().await);
        assert_eq!(controller.view(), View::SubmissionForm);
        assert_eq!(controller.profile().unwrap().id, user);

        backend.emit_session(None);
        assert!(controller.next_change().await);
        assert_eq!(controller.view(), View::SignIn);
        assert!(controller.profile().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_and_sign_out() {
        let backend = backend();
        let admin = backend.add_account("admin@kyc.test", UserRole::Admin);

        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;

        let email = Email::parse("admin@kyc.test").unwrap();
        let password = SecretString::from("correct horse");
        controller.sign_in(&email, &password).await.unwrap();
        assert_eq!(controller.view(), View::ReviewDashboard);
        assert_eq!(controller.session().unwrap().user.id, admin);

        controller.sign_out().await.unwrap();
        assert_eq!(controller.view(), View::SignIn);
        assert!(controller.profile().is_none());
        assert!(backend.calls().contains(&Call::SignOut));
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let backend = backend();
        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;

        let email = Email::parse("nobody@kyc.test").unwrap();
        let err = controller
            .sign_in(&email, &SecretString::from("guess"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized(_)));
        assert_eq!(controller.view(), View::SignIn);
    }

    #[tokio::test]
    async fn test_sign_out_failure_still_resets_profile() {
        let backend = backend();
        let user = backend.add_profile(UserRole::User);
        backend.emit_session(Some(user));

        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;
        backend.fail("sign_out");

        assert!(controller.sign_out().await.is_err());
        assert!(controller.profile().is_none());
        assert_eq!(controller.view(), View::SignIn);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let backend = backend();
        let mut controller = SessionController::new(Arc::clone(&backend));
        controller.mount().await;
        assert_eq!(backend.subscriber_count(), 1);

        drop(controller);
        assert_eq!(backend.subscriber_count(), 0);
    }
}
