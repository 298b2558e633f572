//! Integration tests for PostgREST access (`/rest/v1`).

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use kyc_core::{KycStatus, NewKycSubmission, ProfileId, SubmissionId, UserRole};
use kyc_integration_tests::{ANON_KEY, TestProject, profile_row, submission_row};
use kyc_portal::{BackendError, ProfileStore, SubmissionStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn test_profile_by_id() {
    let project = TestProject::start().await;
    let user = ProfileId::random();
    project.sign_in(user);

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("select", "*"))
        .and(query_param("id", format!("eq.{user}")))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", TestProject::user_bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_row(user, UserRole::Admin)))
        .expect(1)
        .mount(&project.server)
        .await;

    let profile = project.client.profile_by_id(user).await.unwrap();
    assert_eq!(profile.id, user);
    assert!(profile.is_admin());
}

#[tokio::test]
async fn test_profile_missing_row() {
    let project = TestProject::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "details": "The result contains 0 rows",
            "hint": null,
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&project.server)
        .await;

    let err = project
        .client
        .profile_by_id(ProfileId::random())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn test_count_profiles() {
    let project = TestProject::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("select", "id"))
        .and(header("prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "0-0/10")
                .set_body_json(json!([{ "id": ProfileId::random() }])),
        )
        .mount(&project.server)
        .await;

    assert_eq!(project.client.count_profiles().await.unwrap(), 10);
}

#[tokio::test]
async fn test_count_without_content_range() {
    let project = TestProject::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&project.server)
        .await;

    assert!(matches!(
        project.client.count_profiles().await,
        Err(BackendError::Parse(_))
    ));
}

// =============================================================================
// Submissions
// =============================================================================

#[tokio::test]
async fn test_list_submissions_newest_first() {
    let project = TestProject::start().await;
    let newer = SubmissionId::random();
    let older = SubmissionId::random();

    Mock::given(method("GET"))
        .and(path("/rest/v1/kyc_submissions"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            submission_row(newer, KycStatus::Pending, "2024-05-02T10:00:00+00:00"),
            submission_row(older, KycStatus::Approved, "2024-05-01T10:00:00+00:00"),
        ])))
        .mount(&project.server)
        .await;

    let submissions = project.client.list_submissions().await.unwrap();
    let ids: Vec<_> = submissions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![newer, older]);
    assert_eq!(submissions[1].status, KycStatus::Approved);
}

#[tokio::test]
async fn test_list_rejects_unknown_status() {
    let project = TestProject::start().await;
    let mut row = submission_row(SubmissionId::random(), KycStatus::Pending, "2024-05-01T10:00:00+00:00");
    row["status"] = json!("escalated");

    Mock::given(method("GET"))
        .and(path("/rest/v1/kyc_submissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&project.server)
        .await;

    assert!(matches!(
        project.client.list_submissions().await,
        Err(BackendError::Parse(_))
    ));
}

#[tokio::test]
async fn test_insert_submission() {
    let project = TestProject::start().await;
    project.sign_in(ProfileId::random());

    let new = NewKycSubmission {
        full_name: "Ada Lovelace".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
        address: "12 St James's Square, London".to_string(),
        id_document_url: "https://abcd.supabase.co/storage/v1/object/public/kyc-documents/x.pdf"
            .to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/kyc_submissions"))
        .and(header("prefer", "return=minimal"))
        .and(header("authorization", TestProject::user_bearer().as_str()))
        .and(body_json(json!({
            "full_name": "Ada Lovelace",
            "date_of_birth": "1815-12-10",
            "address": "12 St James's Square, London",
            "id_document_url": "https://abcd.supabase.co/storage/v1/object/public/kyc-documents/x.pdf"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&project.server)
        .await;

    project.client.insert_submission(&new).await.unwrap();
}

#[tokio::test]
async fn test_update_status_only_touches_pending_rows() {
    let project = TestProject::start().await;
    let id = SubmissionId::random();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/kyc_submissions"))
        .and(query_param("id", format!("eq.{id}")))
        .and(query_param("status", "eq.pending"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({ "status": "approved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([submission_row(
            id,
            KycStatus::Approved,
            "2024-05-01T10:00:00+00:00"
        )])))
        .expect(1)
        .mount(&project.server)
        .await;

    let updated = project
        .client
        .update_submission_status(id, KycStatus::Approved)
        .await
        .unwrap();
    assert_eq!(updated.id, id);
    assert_eq!(updated.status, KycStatus::Approved);
}

#[tokio::test]
async fn test_update_of_terminal_row_is_invalid_transition() {
    let project = TestProject::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/kyc_submissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&project.server)
        .await;

    let err = project
        .client
        .update_submission_status(SubmissionId::random(), KycStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_row_level_security_error_is_verbatim() {
    let project = TestProject::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/kyc_submissions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy for table \"kyc_submissions\""
        })))
        .mount(&project.server)
        .await;

    let new = NewKycSubmission {
        full_name: "Ada".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
        address: "London".to_string(),
        id_document_url: "https://abcd.supabase.co/x.pdf".to_string(),
    };
    let err = project.client.insert_submission(&new).await.unwrap_err();
    assert!(matches!(err, BackendError::Unauthorized(ref m) if m.contains("row-level security")));
}
