//! Dashboard aggregates.
//!
//! Derived from the fetched submission list on every load; never stored.

use serde::Serialize;

use super::{KycStatus, KycSubmission};

/// Submission counts per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KycStats {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl KycStats {
    /// Count submissions per status. All counters start at zero.
    pub fn from_submissions<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a KycSubmission>,
    {
        submissions
            .into_iter()
            .map(|submission| submission.status)
            .fold(Self::default(), Self::record)
    }

    /// Return the stats with one more submission in `status`.
    #[must_use]
    pub const fn record(mut self, status: KycStatus) -> Self {
        match status {
            KycStatus::Pending => self.pending += 1,
            KycStatus::Approved => self.approved += 1,
            KycStatus::Rejected => self.rejected += 1,
        }
        self
    }

    /// Count for a single status.
    #[must_use]
    pub const fn get(&self, status: KycStatus) -> u64 {
        match status {
            KycStatus::Pending => self.pending,
            KycStatus::Approved => self.approved,
            KycStatus::Rejected => self.rejected,
        }
    }

    /// Sum over all statuses.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pending + self.approved + self.rejected
    }
}

/// Everything the dashboard tiles display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub kyc_stats: KycStats,
}

impl DashboardStats {
    /// Build the stats from a profile count and the fetched submissions.
    pub fn compute<'a, I>(total_users: u64, submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a KycSubmission>,
    {
        Self {
            total_users,
            kyc_stats: KycStats::from_submissions(submissions),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::{ProfileId, SubmissionId};

    fn submission(status: KycStatus) -> KycSubmission {
        KycSubmission {
            id: SubmissionId::random(),
            user_id: ProfileId::random(),
            full_name: "Test User".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            address: "1 Test Street".to_string(),
            id_document_url: "https://cdn.example/doc.pdf".to_string(),
            status,
            admin_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_list_counts_zero() {
        let stats = KycStats::from_submissions(&Vec::<KycSubmission>::new());
        assert_eq!(stats, KycStats::default());
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_counts_match_example_dashboard() {
        let submissions: Vec<_> = [
            KycStatus::Pending,
            KycStatus::Approved,
            KycStatus::Pending,
            KycStatus::Rejected,
            KycStatus::Approved,
            KycStatus::Pending,
        ]
        .into_iter()
        .map(submission)
        .collect();

        let stats = DashboardStats::compute(10, &submissions);
        assert_eq!(stats.total_users, 10);
        assert_eq!(stats.kyc_stats.pending, 3);
        assert_eq!(stats.kyc_stats.approved, 2);
        assert_eq!(stats.kyc_stats.rejected, 1);
    }

    #[test]
    fn test_counts_sum_to_list_length() {
        for len in 0..12_usize {
            let submissions: Vec<_> = (0..len)
                .map(|i| submission(KycStatus::ALL[i % 3]))
                .collect();
            let stats = KycStats::from_submissions(&submissions);
            assert_eq!(stats.total(), len as u64);
        }
    }

    #[test]
    fn test_get_matches_fields() {
        let stats = KycStats {
            pending: 4,
            approved: 5,
            rejected: 6,
        };
        assert_eq!(stats.get(KycStatus::Pending), 4);
        assert_eq!(stats.get(KycStatus::Approved), 5);
        assert_eq!(stats.get(KycStatus::Rejected), 6);
    }

    #[test]
    fn test_dashboard_stats_json_shape() {
        let json = serde_json::to_value(DashboardStats::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalUsers": 0,
                "kycStats": { "pending": 0, "approved": 0, "rejected": 0 }
            })
        );
    }
}
