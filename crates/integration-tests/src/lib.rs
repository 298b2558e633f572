//! Integration tests for the KYC portal.
//!
//! Each test starts a `wiremock` server standing in for a Supabase project
//! and drives the real [`SupabaseClient`] (and the components built on it)
//! over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kyc-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `supabase_auth` - sign-in, sign-up, refresh, sign-out
//! - `supabase_rest` - `profiles` and `kyc_submissions` over PostgREST
//! - `supabase_storage` - document upload, public URL, removal
//! - `portal_flows` - session controller, submission form and dashboard end to end

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kyc_core::{KycStatus, ProfileId, SubmissionId, UserRole};
use kyc_portal::{AuthUser, Session, SupabaseClient, SupabaseConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::MockServer;

pub const ANON_KEY: &str = "test-anon-key";
pub const USER_TOKEN: &str = "user-access-token";
pub const BUCKET: &str = "kyc-documents";

/// A mocked Supabase project and a client pointed at it.
pub struct TestProject {
    pub server: MockServer,
    pub client: Arc<SupabaseClient>,
}

impl TestProject {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let config =
            SupabaseConfig::new(&server.uri(), SecretString::from(ANON_KEY), BUCKET).unwrap();
        let client = Arc::new(SupabaseClient::new(&config).unwrap());
        Self { server, client }
    }

    /// Sign `user` in without going through the auth endpoint.
    pub fn sign_in(&self, user: ProfileId) {
        self.client.restore_session(session(user, None, None));
    }

    /// `Authorization` value the client should send for a signed-in user.
    #[must_use]
    pub fn user_bearer() -> String {
        format!("Bearer {USER_TOKEN}")
    }

    #[must_use]
    pub fn anon_bearer() -> String {
        format!("Bearer {ANON_KEY}")
    }

    /// Public URL prefix for objects in the document bucket.
    #[must_use]
    pub fn public_prefix(&self) -> String {
        format!("{}/storage/v1/object/public/{BUCKET}/", self.server.uri())
    }

    /// Bodies of all requests the server saw for `method` on `path`.
    pub async fn bodies(&self, method: &str, path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|req| req.method.as_str() == method && req.url.path() == path)
            .map(|req| serde_json::from_slice(&req.body).unwrap_or(Value::Null))
            .collect()
    }
}

#[must_use]
pub fn session(
    user: ProfileId,
    refresh_token: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> Session {
    Session {
        access_token: SecretString::from(USER_TOKEN),
        refresh_token: refresh_token.map(SecretString::from),
        expires_at,
        user: AuthUser { id: user, email: None },
    }
}

/// Token grant as returned by `/auth/v1/token` and `/auth/v1/signup`.
#[must_use]
pub fn token_body(user: ProfileId, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": (Utc::now() + Duration::hours(1)).timestamp(),
        "refresh_token": "refresh-token",
        "user": { "id": user, "email": "ada@kyc.test", "role": "authenticated" }
    })
}

#[must_use]
pub fn profile_row(id: ProfileId, role: UserRole) -> Value {
    json!({
        "id": id,
        "role": role,
        "full_name": null,
        "created_at": "2024-05-01T09:00:00+00:00",
        "updated_at": "2024-05-01T09:00:00+00:00"
    })
}

#[must_use]
pub fn submission_row(id: SubmissionId, status: KycStatus, created_at: &str) -> Value {
    json!({
        "id": id,
        "user_id": ProfileId::random(),
        "full_name": "Ada Lovelace",
        "date_of_birth": "1815-12-10",
        "address": "12 St James's Square, London",
        "id_document_url": "https://abcd.supabase.co/storage/v1/object/public/kyc-documents/a.pdf",
        "status": status,
        "admin_notes": null,
        "created_at": created_at,
        "updated_at": created_at
    })
}
