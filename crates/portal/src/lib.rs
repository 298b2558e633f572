//! KYC portal library.
//!
//! Client-side logic for submitting and reviewing KYC requests against a
//! Supabase project:
//!
//! - [`session`] - who is signed in, their role, and which surface to show
//! - [`form`] - the user's submission form (document upload + insert)
//! - [`dashboard`] - the admin review table and status transitions
//!
//! All data lives in the hosted backend. The components reach it through the
//! traits in [`backend`], implemented over HTTP by [`supabase::SupabaseClient`].
//!
//! # Security
//!
//! Only the project's anon key and the user's own access token are ever
//! held. Authorisation is enforced by the backend's row level security.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod render;
pub mod session;
pub mod supabase;

#[cfg(test)]
mod test_support;

pub use backend::{
    AuthProvider, AuthUser, BackendError, DocumentStorage, ProfileStore, Session,
    SessionSubscription, SubmissionStore,
};
pub use config::{ConfigError, PortalConfig, SupabaseConfig};
pub use dashboard::{ReviewDashboard, ReviewError};
pub use error::AppError;
pub use form::{Draft, FormError, SubmissionForm};
pub use session::{SessionController, View};
pub use supabase::SupabaseClient;
