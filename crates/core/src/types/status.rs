//! Status and role enums.
//!
//! Both enums are closed: the backend stores them as lowercase text and any
//! other value fails to deserialize rather than being carried around as a
//! free-form string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by status and role handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The text is not one of `pending`, `approved`, `rejected`.
    #[error("invalid KYC status: {0}")]
    InvalidStatus(String),

    /// The text is not one of `admin`, `user`.
    #[error("invalid user role: {0}")]
    InvalidRole(String),

    /// Only pending submissions can be reviewed.
    #[error("cannot move a {from} submission to {to}")]
    InvalidTransition {
        /// Current status.
        from: KycStatus,
        /// Requested status.
        to: KycStatus,
    },
}

/// Review status of a KYC submission.
///
/// `Pending` is the server-assigned default on insert. `Approved` and
/// `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    /// All statuses, in tile order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Validate a review transition.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::InvalidTransition`] unless `self` is `Pending`
    /// and `to` is terminal.
    pub fn transition_to(self, to: Self) -> Result<Self, StatusError> {
        match (self, to) {
            (Self::Pending, Self::Approved | Self::Rejected) => Ok(to),
            _ => Err(StatusError::InvalidTransition { from: self, to }),
        }
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KycStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(StatusError::InvalidStatus(s.to_owned())),
        }
    }
}

/// An administrator's verdict on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    /// Actions offered for a pending submission, in display order.
    pub const PENDING: &'static [Self] = &[Self::Approve, Self::Reject];

    /// Actions available for a submission in `status`.
    ///
    /// Pending submissions get exactly two; terminal ones get none.
    #[must_use]
    pub const fn available_for(status: KycStatus) -> &'static [Self] {
        match status {
            KycStatus::Pending => Self::PENDING,
            KycStatus::Approved | KycStatus::Rejected => &[],
        }
    }

    /// The status this action moves a submission to.
    #[must_use]
    pub const fn target_status(self) -> KycStatus {
        match self {
            Self::Approve => KycStatus::Approved,
            Self::Reject => KycStatus::Rejected,
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Reject => "Reject",
        }
    }
}

/// Role stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Reviews submissions.
    Admin,
    /// Submits KYC information.
    #[default]
    User,
}

impl UserRole {
    /// Resolve the effective role from an optional profile role.
    ///
    /// An unknown role (no profile loaded) is treated as a regular user.
    #[must_use]
    pub fn effective(role: Option<Self>) -> Self {
        role.unwrap_or_default()
    }

    /// Label shown next to the sign-out control.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(StatusError::InvalidRole(s.to_owned())),
        }
    }
}
