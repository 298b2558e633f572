//! In-memory backend for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, TimeZone, Utc};
use kyc_core::{
    DocumentFile, Email, KycStatus, KycSubmission, NewKycSubmission, Profile, ProfileId,
    SubmissionId, UserRole,
};
use secrecy::SecretString;
use tokio::sync::{Notify, watch};

use crate::backend::{
    AuthProvider, AuthUser, BackendError, DocumentStorage, ProfileStore, Session,
    SessionSubscription, SubmissionStore,
};

/// A backend call as observed by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CurrentSession,
    SignIn(String),
    SignUp(String),
    SignOut,
    ProfileById(ProfileId),
    CountProfiles,
    Insert(NewKycSubmission),
    List,
    Update(SubmissionId, KycStatus),
    Upload { bucket: String, key: String },
    Remove { bucket: String, key: String },
}

/// Records every call and serves canned data.
///
/// Operations named in [`FakeBackend::fail`] answer with a 500 whose message
/// is `"{op} failed"`.
pub struct FakeBackend {
    session: watch::Sender<Option<Session>>,
    accounts: Mutex<HashMap<String, ProfileId>>,
    profiles: Mutex<HashMap<ProfileId, Profile>>,
    extra_users: Mutex<u64>,
    submissions: Mutex<Vec<KycSubmission>>,
    objects: Mutex<HashSet<(String, String)>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
    hold_uploads: AtomicBool,
    upload_entered: Notify,
    upload_gate: Notify,
}

impl FakeBackend {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            session,
            accounts: Mutex::default(),
            profiles: Mutex::default(),
            extra_users: Mutex::default(),
            submissions: Mutex::default(),
            objects: Mutex::default(),
            calls: Mutex::default(),
            failing: Mutex::default(),
            hold_uploads: AtomicBool::new(false),
            upload_entered: Notify::new(),
            upload_gate: Notify::new(),
        }
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn add_profile(&self, role: UserRole) -> ProfileId {
        let id = ProfileId::random();
        self.profiles.lock().unwrap().insert(id, profile(id, role));
        id
    }

    pub fn add_account(&self, email: &str, role: UserRole) -> ProfileId {
        let id = self.add_profile(role);
        self.accounts.lock().unwrap().insert(email.to_string(), id);
        id
    }

    /// Users counted by `count_profiles` without a profile row to look up.
    pub fn add_users(&self, n: u64) {
        *self.extra_users.lock().unwrap() += n;
    }

    pub fn add_submission(&self, status: KycStatus) -> SubmissionId {
        let row = submission(status);
        let id = row.id;
        self.submissions.lock().unwrap().push(row);
        id
    }

    pub fn submissions(&self) -> Vec<KycSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn objects(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Pretend the provider signed `id` in (or out, for `None`).
    pub fn emit_session(&self, id: Option<ProfileId>) {
        self.session.send_replace(id.map(session_for));
    }

    pub fn subscriber_count(&self) -> usize {
        self.session.receiver_count()
    }

    /// Make uploads wait for [`FakeBackend::release_uploads`].
    pub fn hold_uploads(&self) {
        self.hold_uploads.store(true, Ordering::SeqCst);
    }

    pub fn release_uploads(&self) {
        self.upload_gate.notify_one();
    }

    /// Resolves once an upload is in flight.
    pub async fn upload_started(&self) {
        self.upload_entered.notified().await;
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), BackendError> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(BackendError::Api {
                status: 500,
                message: format!("{op} failed"),
            });
        }
        Ok(())
    }
}

impl AuthProvider for FakeBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        self.record(Call::CurrentSession);
        self.check("session")?;
        Ok(self.session.borrow().clone())
    }

    fn on_session_change(&self) -> SessionSubscription {
        SessionSubscription::new(self.session.subscribe())
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        _password: &SecretString,
    ) -> Result<Session, BackendError> {
        self.record(Call::SignIn(email.to_string()));
        self.check("sign_in")?;
        let id = self
            .accounts
            .lock()
            .unwrap()
            .get(email.as_str())
            .copied()
            .ok_or_else(|| BackendError::Unauthorized("Invalid login credentials".to_string()))?;
        let session = session_for(id);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &Email,
        _password: &SecretString,
    ) -> Result<Option<Session>, BackendError> {
        self.record(Call::SignUp(email.to_string()));
        self.check("sign_up")?;
        let id = self.add_account(email.as_str(), UserRole::User);
        let session = session_for(id);
        self.session.send_replace(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.record(Call::SignOut);
        self.session.send_replace(None);
        self.check("sign_out")
    }
}

impl ProfileStore for FakeBackend {
    async fn profile_by_id(&self, id: ProfileId) -> Result<Profile, BackendError> {
        self.record(Call::ProfileById(id));
        self.check("profile")?;
        self.profiles
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("profile {id}")))
    }

    async fn count_profiles(&self) -> Result<u64, BackendError> {
        self.record(Call::CountProfiles);
        self.check("count")?;
        let profiles = self.profiles.lock().unwrap().len() as u64;
        Ok(profiles + *self.extra_users.lock().unwrap())
    }
}

impl SubmissionStore for FakeBackend {
    async fn insert_submission(&self, new: &NewKycSubmission) -> Result<(), BackendError> {
        self.record(Call::Insert(new.clone()));
        self.check("insert")?;
        let mut row = submission(KycStatus::Pending);
        row.full_name.clone_from(&new.full_name);
        row.date_of_birth = new.date_of_birth;
        row.address.clone_from(&new.address);
        row.id_document_url.clone_from(&new.id_document_url);
        self.submissions.lock().unwrap().push(row);
        Ok(())
    }

    async fn list_submissions(&self) -> Result<Vec<KycSubmission>, BackendError> {
        self.record(Call::List);
        self.check("list")?;
        let mut rows = self.submissions();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_submission_status(
        &self,
        id: SubmissionId,
        status: KycStatus,
    ) -> Result<KycSubmission, BackendError> {
        self.record(Call::Update(id, status));
        self.check("update")?;
        let mut rows = self.submissions.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id && row.status == KycStatus::Pending)
            .ok_or_else(|| BackendError::InvalidTransition(format!("submission {id}")))?;
        row.status = status;
        Ok(row.clone())
    }
}

impl DocumentStorage for FakeBackend {
    async fn upload(&self, bucket: &str, key: &str, _file: &DocumentFile) -> Result<(), BackendError> {
        self.record(Call::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        if self.hold_uploads.load(Ordering::SeqCst) {
            self.upload_entered.notify_one();
            self.upload_gate.notified().await;
        }
        self.check("upload")?;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://fake.supabase.co/storage/v1/object/public/{bucket}/{key}")
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.record(Call::Remove {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        self.check("remove")?;
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

pub fn session_for(id: ProfileId) -> Session {
    Session {
        access_token: SecretString::from(format!("token-{id}")),
        refresh_token: None,
        expires_at: None,
        user: AuthUser { id, email: None },
    }
}

pub fn profile(id: ProfileId, role: UserRole) -> Profile {
    let now = Utc::now();
    Profile {
        id,
        role,
        full_name: None,
        created_at: now,
        updated_at: now,
    }
}

/// A stored submission; each call is one second newer than the last.
pub fn submission(status: KycStatus) -> KycSubmission {
    static SEQ: std::sync::atomic::AtomicI64 = std::sync::atomic::AtomicI64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::SeqCst);
    let created_at = Utc.timestamp_opt(1_700_000_000 + seq, 0).unwrap();

    KycSubmission {
        id: SubmissionId::random(),
        user_id: ProfileId::random(),
        full_name: "Ada Lovelace".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
        address: "12 St James's Square, London".to_string(),
        id_document_url: "https://fake.supabase.co/storage/v1/object/public/kyc-documents/a.pdf"
            .to_string(),
        status,
        admin_notes: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn document(name: &str) -> DocumentFile {
    DocumentFile::new(name, b"%PDF-1.7 fake".to_vec()).unwrap()
}
