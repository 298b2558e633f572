//! Core types for the KYC portal.
//!
//! This module provides type-safe wrappers for the KYC domain concepts.

pub mod document;
pub mod email;
pub mod id;
pub mod profile;
pub mod stats;
pub mod status;
pub mod submission;

pub use document::{DocumentError, DocumentFile};
pub use email::{Email, EmailError};
pub use id::*;
pub use profile::Profile;
pub use stats::{DashboardStats, KycStats};
pub use status::*;
pub use submission::{KycSubmission, NewKycSubmission};
