//! Supabase Auth (`/auth/v1`).

use chrono::{DateTime, Duration, Utc};
use kyc_core::Email;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::SupabaseClient;
use crate::backend::{AuthProvider, AuthUser, BackendError, Session, SessionSubscription};

/// Token grant returned by sign-in, sign-up and refresh.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));

        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_at,
            user: self.user,
        }
    }
}

impl SupabaseClient {
    /// Exchange a refresh token for a new session.
    #[instrument(skip(self, refresh_token))]
    async fn refresh_session(&self, refresh_token: &SecretString) -> Result<Session, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let response = self
            .request_anon(Method::POST, url)
            .json(&json!({ "refresh_token": refresh_token.expose_secret() }))
            .send()
            .await?;

        let token: TokenResponse = Self::handle_response(response).await?;
        Ok(token.into_session(Utc::now()))
    }
}

impl AuthProvider for SupabaseClient {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(session) = self.session() else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            debug!(user_id = %session.user.id, "Session expired without refresh token");
            self.set_session(None);
            return Ok(None);
        };

        match self.refresh_session(&refresh_token).await {
            Ok(refreshed) => {
                debug!(user_id = %refreshed.user.id, "Session refreshed");
                self.set_session(Some(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(e) => {
                self.set_session(None);
                Err(e)
            }
        }
    }

    fn on_session_change(&self) -> SessionSubscription {
        SessionSubscription::new(self.subscribe())
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Session, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request_anon(Method::POST, url)
            .json(&json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let token: TokenResponse = Self::handle_response(response).await?;
        let session = token.into_session(Utc::now());

        info!(user_id = %session.user.id, "Signed in");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<Session>, BackendError> {
        let url = self.endpoint("auth/v1/signup")?;

        let response = self
            .request_anon(Method::POST, url)
            .json(&json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let body: serde_json::Value = Self::handle_response(response).await?;

        // Projects with email confirmation enabled answer with the bare user
        if body.get("access_token").is_none() {
            info!("Signed up; email confirmation required before sign-in");
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| BackendError::Parse(format!("Failed to parse sign-up response: {e}")))?;
        let session = token.into_session(Utc::now());

        info!(user_id = %session.user.id, "Signed up");
        self.set_session(Some(session.clone()));
        Ok(Some(session))
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), BackendError> {
        let Some(session) = self.session() else {
            debug!("Sign-out requested without a session");
            return Ok(());
        };

        let url = self.endpoint("auth/v1/logout")?;
        let result = match self
            .request_as(Method::POST, url, &session.access_token)
            .send()
            .await
        {
            Ok(response) => Self::expect_success(response).await.map(|_| ()),
            Err(e) => Err(BackendError::from(e)),
        };

        // The local session goes regardless; a stale server session expires on its own
        self.set_session(None);

        match result {
            Ok(()) => {
                info!(user_id = %session.user.id, "Signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Server sign-out failed; local session cleared");
                Err(e)
            }
        }
    }
}
