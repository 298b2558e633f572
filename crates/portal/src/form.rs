//! KYC submission form.
//!
//! The form keeps an immutable [`Draft`] that is replaced wholesale on every
//! edit. Submitting uploads the ID document under a random key, resolves its
//! public URL and inserts one submission row. A failed insert removes the
//! uploaded object again so nothing is left orphaned.
//!
//! Only one submit may be outstanding at a time; a second attempt is
//! rejected with [`FormError::Busy`] before any network call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use kyc_core::{DocumentError, DocumentFile, NewKycSubmission};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::backend::{BackendError, DocumentStorage, SubmissionStore};

/// Date format accepted for the date of birth.
pub const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

/// Errors shown to the user when a submit fails.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please select an ID document")]
    MissingDocument,

    #[error("Please fill in {0}")]
    MissingField(&'static str),

    #[error("Invalid date of birth (expected YYYY-MM-DD): {0}")]
    InvalidDateOfBirth(String),

    #[error("A submission is already in progress")]
    Busy,

    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Upload or insert failed; displays the service's message.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Unsubmitted form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    full_name: String,
    date_of_birth: String,
    address: String,
    file: Option<DocumentFile>,
}

impl Draft {
    #[must_use]
    pub fn with_full_name(self, full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_date_of_birth(self, date_of_birth: impl Into<String>) -> Self {
        Self {
            date_of_birth: date_of_birth.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_address(self, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_file(self, file: Option<DocumentFile>) -> Self {
        Self { file, ..self }
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn date_of_birth(&self) -> &str {
        &self.date_of_birth
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub const fn file(&self) -> Option<&DocumentFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the draft, returning the chosen document and the parsed fields.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: the document, then the text fields
    /// in form order, then the date format.
    pub fn validate(&self) -> Result<(&DocumentFile, ValidDraft), FormError> {
        let file = self.file.as_ref().ok_or(FormError::MissingDocument)?;

        let full_name = required(&self.full_name, "full name")?;
        let date_of_birth = required(&self.date_of_birth, "date of birth")?;
        let address = required(&self.address, "address")?;

        let date_of_birth = NaiveDate::parse_from_str(date_of_birth, DATE_OF_BIRTH_FORMAT)
            .map_err(|_| FormError::InvalidDateOfBirth(date_of_birth.to_string()))?;

        Ok((
            file,
            ValidDraft {
                full_name: full_name.to_string(),
                date_of_birth,
                address: address.to_string(),
            },
        ))
    }
}

/// Draft fields after validation, waiting for the document URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    full_name: String,
    date_of_birth: NaiveDate,
    address: String,
}

impl ValidDraft {
    fn into_submission(self, id_document_url: String) -> NewKycSubmission {
        NewKycSubmission {
            full_name: self.full_name,
            date_of_birth: self.date_of_birth,
            address: self.address,
            id_document_url,
        }
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::MissingField(field));
    }
    Ok(value)
}

#[derive(Debug, Default)]
struct FormState {
    draft: Draft,
    error: Option<String>,
    submitted: bool,
}

/// Clears the busy flag when the submit finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The user-facing submission form.
pub struct SubmissionForm<B> {
    backend: Arc<B>,
    bucket: String,
    state: Mutex<FormState>,
    busy: AtomicBool,
}

impl<B> SubmissionForm<B>
where
    B: DocumentStorage + SubmissionStore,
{
    /// An empty form uploading into `bucket`.
    pub fn new(backend: Arc<B>, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            state: Mutex::default(),
            busy: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current draft.
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.state().draft.clone()
    }

    /// Replace the draft with an edited copy.
    pub fn edit(&self, f: impl FnOnce(Draft) -> Draft) {
        let mut state = self.state();
        let draft = std::mem::take(&mut state.draft);
        state.draft = f(draft);
    }

    /// Choose the ID document.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Document`] (and shows it) if the file is empty,
    /// too large or of an unsupported type; the previous choice is kept.
    pub fn attach(&self, file_name: impl Into<String>, bytes: Vec<u8>) -> Result<(), FormError> {
        match DocumentFile::new(file_name, bytes) {
            Ok(file) => {
                self.edit(|draft| draft.with_file(Some(file)));
                Ok(())
            }
            Err(e) => {
                let e = FormError::from(e);
                self.state().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Message from the last failed submit, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Whether a submit has succeeded and the confirmation is showing.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.state().submitted
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submit the current draft.
    ///
    /// On success the confirmation state is shown and the draft is cleared.
    /// On failure the error message is kept for display and the draft is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Busy`] if another submit is outstanding,
    /// otherwise the validation, upload or insert failure.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn submit(&self) -> Result<(), FormError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            warn!("Submit ignored; another submit is in progress");
            return Err(FormError::Busy);
        };

        let draft = {
            let mut state = self.state();
            state.error = None;
            state.draft.clone()
        };

        let result = self.send(&draft).await;

        let mut state = self.state();
        match &result {
            Ok(()) => {
                state.draft = Draft::default();
                state.submitted = true;
            }
            Err(e) => state.error = Some(e.to_string()),
        }

        result
    }

    async fn send(&self, draft: &Draft) -> Result<(), FormError> {
        let (file, fields) = draft.validate()?;

        let key = file.storage_key(&random_object_name());
        self.backend.upload(&self.bucket, &key, file).await?;

        let url = self.backend.public_url(&self.bucket, &key);
        let submission = fields.into_submission(url);

        if let Err(e) = self.backend.insert_submission(&submission).await {
            if let Err(cleanup) = self.backend.remove(&self.bucket, &key).await {
                warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }

        info!(key = %key, "KYC submission created");
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B> std::fmt::Debug for SubmissionForm<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionForm")
            .field("bucket", &self.bucket)
            .field("busy", &self.busy.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// 128 random bits, hex encoded.
fn random_object_name() -> String {
    format!("{:032x}", rand::random::<u128>())
}
