//! Supabase REST client.
//!
//! One client speaks to the three Supabase services the portal relies on:
//!
//! - **Auth** (`/auth/v1`) - password sign-in, sign-up, refresh, logout
//! - **PostgREST** (`/rest/v1`) - `profiles` and `kyc_submissions`
//! - **Storage** (`/storage/v1`) - the document bucket
//!
//! # Authentication
//!
//! Every request carries the project's anon key as `apikey`. The
//! `Authorization` bearer is the signed-in user's access token, falling back
//! to the anon key when nobody is signed in, so row level security sees the
//! right identity.
//!
//! # Session state
//!
//! The client holds the current session in a `tokio::sync::watch` channel.
//! Sign-in, sign-up, refresh and sign-out replace the value, which notifies
//! every [`crate::backend::SessionSubscription`].

mod auth;
mod rest;
mod storage;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::watch;
use url::Url;

use crate::backend::{BackendError, Session};
use crate::config::SupabaseConfig;

/// Supabase API client.
///
/// Cheap to clone; clones share the HTTP pool and the session.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: watch::Sender<Option<Session>>,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| BackendError::Parse(format!("Invalid anon key format: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("kyc-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (session, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                session,
            }),
        })
    }

    /// Seed the client with a session obtained earlier (e.g. read from disk).
    ///
    /// Subscribers are notified as for a sign-in.
    pub fn restore_session(&self, session: Session) {
        tracing::debug!(user_id = %session.user.id, "Restoring saved session");
        self.set_session(Some(session));
    }

    /// Snapshot of the session currently held, without refreshing it.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.session.borrow().clone()
    }

    /// Project base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub(crate) fn set_session(&self, session: Option<Session>) {
        self.inner.session.send_replace(session);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.session.subscribe()
    }

    /// Resolve a service path against the project URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::Parse(format!("Invalid endpoint {path}: {e}")))
    }

    /// Start a request authorised as the current user (or anonymously).
    pub(crate) fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let bearer = self.inner.session.borrow().as_ref().map_or_else(
            || self.inner.anon_key.expose_secret().to_owned(),
            |session| session.access_token.expose_secret().to_owned(),
        );

        self.inner.http.request(method, url).bearer_auth(bearer)
    }

    /// Start a request authorised with the anon key only.
    pub(crate) fn request_anon(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.request_as(method, url, &self.inner.anon_key)
    }

    /// Start a request authorised with an explicit token.
    pub(crate) fn request_as(
        &self,
        method: reqwest::Method,
        url: Url,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        self.inner
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret())
    }

    /// Handle an API response and parse its JSON body.
    pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::expect_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")))
    }

    /// Turn a non-2xx response into an error, passing successes through.
    pub(crate) async fn expect_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse an error response from any of the Supabase services.
    async fn parse_error(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = error_message(&body);

        match status {
            401 | 403 => BackendError::Unauthorized(message),
            404 => BackendError::NotFound(message),
            _ => BackendError::Api { status, message },
        }
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("signed_in", &self.inner.session.borrow().is_some())
            .finish_non_exhaustive()
    }
}

/// Error body shapes used by Auth, PostgREST and Storage.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pick the most human-readable message out of an error body.
fn error_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}
