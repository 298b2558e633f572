//! PostgREST access to `profiles` and `kyc_submissions` (`/rest/v1`).

use kyc_core::{KycStatus, KycSubmission, NewKycSubmission, Profile, ProfileId, SubmissionId};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_RANGE, HeaderValue};
use serde_json::json;
use tracing::{debug, instrument};

use super::SupabaseClient;
use crate::backend::{BackendError, ProfileStore, SubmissionStore};

const PROFILES: &str = "rest/v1/profiles";
const SUBMISSIONS: &str = "rest/v1/kyc_submissions";

/// Ask PostgREST for a single JSON object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST error code for "zero or multiple rows" on a single-object read.
const SINGULAR_VIOLATION: u16 = 406;

impl ProfileStore for SupabaseClient {
    #[instrument(skip(self), fields(profile_id = %id))]
    async fn profile_by_id(&self, id: ProfileId) -> Result<Profile, BackendError> {
        let mut url = self.endpoint(PROFILES)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"));

        let response = self
            .request(Method::GET, url)
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        if response.status().as_u16() == SINGULAR_VIOLATION {
            return Err(BackendError::NotFound(format!(
                "expected exactly one profile with id {id}"
            )));
        }

        Self::handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn count_profiles(&self) -> Result<u64, BackendError> {
        let mut url = self.endpoint(PROFILES)?;
        url.query_pairs_mut().append_pair("select", "id");

        let response = self
            .request(Method::GET, url)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .send()
            .await?;

        let response = Self::expect_success(response).await?;
        let count = parse_content_range_total(response.headers().get(CONTENT_RANGE))?;

        debug!(count, "Counted profiles");
        Ok(count)
    }
}

impl SubmissionStore for SupabaseClient {
    #[instrument(skip(self, submission))]
    async fn insert_submission(&self, submission: &NewKycSubmission) -> Result<(), BackendError> {
        let url = self.endpoint(SUBMISSIONS)?;

        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(submission)
            .send()
            .await?;

        Self::expect_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_submissions(&self) -> Result<Vec<KycSubmission>, BackendError> {
        let mut url = self.endpoint(SUBMISSIONS)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self.request(Method::GET, url).send().await?;
        let submissions: Vec<KycSubmission> = Self::handle_response(response).await?;

        debug!(count = submissions.len(), "Fetched submissions");
        Ok(submissions)
    }

    #[instrument(skip(self), fields(submission_id = %id, status = %status))]
    async fn update_submission_status(
        &self,
        id: SubmissionId,
        status: KycStatus,
    ) -> Result<KycSubmission, BackendError> {
        let mut url = self.endpoint(SUBMISSIONS)?;
        // Only pending rows may change; a terminal row matches nothing
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("status", &format!("eq.{}", KycStatus::Pending));

        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&json!({ "status": status }))
            .send()
            .await?;

        let updated: Vec<KycSubmission> = Self::handle_response(response).await?;

        updated.into_iter().next().ok_or_else(|| {
            BackendError::InvalidTransition(format!(
                "submission {id} is not pending (or does not exist)"
            ))
        })
    }
}

/// Read the total from a `Content-Range` header such as `0-0/42` or `*/0`.
fn parse_content_range_total(header: Option<&HeaderValue>) -> Result<u64, BackendError> {
    let header = header
        .ok_or_else(|| BackendError::Parse("missing Content-Range header".to_string()))?
        .to_str()
        .map_err(|e| BackendError::Parse(format!("invalid Content-Range header: {e}")))?;

    let (_, total) = header
        .rsplit_once('/')
        .ok_or_else(|| BackendError::Parse(format!("invalid Content-Range header: {header}")))?;

    total
        .parse()
        .map_err(|_| BackendError::Parse(format!("Content-Range has no exact total: {header}")))
}
