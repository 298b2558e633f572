//! KYC submission records (`kyc_submissions` table).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{KycStatus, ProfileId, ReviewAction, SubmissionId};

/// One user's KYC application as stored by the backend.
///
/// `status` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycSubmission {
    pub id: SubmissionId,
    pub user_id: ProfileId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub id_document_url: String,
    pub status: KycStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KycSubmission {
    /// Review actions currently offered for this submission.
    #[must_use]
    pub const fn actions(&self) -> &'static [ReviewAction] {
        ReviewAction::available_for(self.status)
    }
}

/// Insert payload for a new submission.
///
/// `user_id`, `status` and the timestamps are filled in by the backend
/// (`auth.uid()`, `'pending'`, `now()`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKycSubmission {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub id_document_url: String,
}
