//! KYC Core - Shared domain types.
//!
//! This crate provides the types shared by every KYC portal component:
//! - `portal` - Session controller, submission form and review dashboard
//! - `cli` - Command-line front end driving the portal
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Records are owned by the hosted backend; these types are the
//! transient copies the portal works with.
//!
//! # Modules
//!
//! - [`types`] - Ids, statuses, roles, profiles, submissions, stats and
//!   document upload rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
