//! Admin review dashboard.
//!
//! Holds a render-scoped copy of all submissions and the derived
//! [`DashboardStats`]. Nothing is patched locally: every status change is
//! followed by a full refetch. Background failures are logged and leave the
//! previous list on screen.

use std::sync::Arc;

use kyc_core::{DashboardStats, KycSubmission, ReviewAction, StatusError, SubmissionId};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::backend::{BackendError, ProfileStore, SubmissionStore};

/// Why a review action was not applied.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Submission {0} is not on the dashboard")]
    UnknownSubmission(SubmissionId),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The admin review surface.
pub struct ReviewDashboard<B> {
    backend: Arc<B>,
    submissions: Vec<KycSubmission>,
    stats: DashboardStats,
    loading: bool,
}

impl<B> ReviewDashboard<B>
where
    B: SubmissionStore + ProfileStore,
{
    /// An empty dashboard; call [`ReviewDashboard::load`] to fill it.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            submissions: Vec::new(),
            stats: DashboardStats::default(),
            loading: true,
        }
    }

    /// Fetch all submissions and the user count, then recompute the stats.
    ///
    /// A failed fetch is logged and keeps what was shown before.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        self.loading = true;

        match self.backend.list_submissions().await {
            Ok(submissions) => self.submissions = submissions,
            Err(e) => error!(error = %e, "Failed to fetch submissions"),
        }

        let total_users = match self.backend.count_profiles().await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Failed to count profiles");
                self.stats.total_users
            }
        };

        self.stats = DashboardStats::compute(total_users, &self.submissions);
        self.loading = false;
    }

    /// Approve a pending submission.
    ///
    /// # Errors
    ///
    /// See [`ReviewDashboard::apply`].
    pub async fn approve(&mut self, id: SubmissionId) -> Result<KycSubmission, ReviewError> {
        self.apply(id, ReviewAction::Approve).await
    }

    /// Reject a pending submission.
    ///
    /// # Errors
    ///
    /// See [`ReviewDashboard::apply`].
    pub async fn reject(&mut self, id: SubmissionId) -> Result<KycSubmission, ReviewError> {
        self.apply(id, ReviewAction::Reject).await
    }

    /// Apply a review action, then refetch everything.
    ///
    /// The transition is checked against the loaded list before the update
    /// is sent, and the store only changes rows that are still pending.
    /// Failures are logged; the list is not refetched after one.
    ///
    /// # Errors
    ///
    /// Returns an error if the submission is not loaded, not pending, or the
    /// update fails.
    #[instrument(skip(self), fields(submission_id = %id, action = ?action))]
    pub async fn apply(
        &mut self,
        id: SubmissionId,
        action: ReviewAction,
    ) -> Result<KycSubmission, ReviewError> {
        let result = self.update(id, action).await;

        match &result {
            Ok(updated) => {
                info!(status = %updated.status, "Submission reviewed");
                self.load().await;
            }
            Err(e) => error!(error = %e, "Failed to update submission status"),
        }

        result
    }

    async fn update(
        &self,
        id: SubmissionId,
        action: ReviewAction,
    ) -> Result<KycSubmission, ReviewError> {
        let current = self
            .submission(id)
            .ok_or(ReviewError::UnknownSubmission(id))?
            .status;
        let target = current.transition_to(action.target_status())?;

        Ok(self.backend.update_submission_status(id, target).await?)
    }

    /// Actions offered for a submission: two while pending, none after.
    #[must_use]
    pub fn actions_for(&self, id: SubmissionId) -> &'static [ReviewAction] {
        self.submission(id)
            .map(KycSubmission::actions)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn submission(&self, id: SubmissionId) -> Option<&KycSubmission> {
        self.submissions.iter().find(|submission| submission.id == id)
    }

    /// Loaded submissions, newest first.
    #[must_use]
    pub fn submissions(&self) -> &[KycSubmission] {
        &self.submissions
    }

    #[must_use]
    pub const fn stats(&self) -> DashboardStats {
        self.stats
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }
}

impl<B> std::fmt::Debug for ReviewDashboard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewDashboard")
            .field("submissions", &self.submissions.len())
            .field("stats", &self.stats)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}
