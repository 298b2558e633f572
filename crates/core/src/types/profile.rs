//! Profile record (`profiles` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProfileId, UserRole};

/// Per-identity record carrying the role used for view branching.
///
/// There is exactly one profile per auth identity and it shares the
/// identity's id. The portal never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub role: UserRole,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Whether this profile may use the review dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_row() {
        let json = r#"{
            "id": "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b",
            "role": "admin",
            "full_name": null,
            "created_at": "2026-01-05T10:00:00+00:00",
            "updated_at": "2026-01-05T10:00:00+00:00"
        }"#;

        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.is_admin());
        assert!(profile.full_name.is_none());
    }

    #[test]
    fn test_unknown_role_fails_to_deserialize() {
        let json = r#"{
            "id": "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b",
            "role": "owner",
            "full_name": "Ada",
            "created_at": "2026-01-05T10:00:00+00:00",
            "updated_at": "2026-01-05T10:00:00+00:00"
        }"#;

        assert!(serde_json::from_str::<Profile>(json).is_err());
    }
}
