//! Identity document chosen for upload.

use std::path::Path;

use thiserror::Error;

/// Errors that can occur when accepting a [`DocumentFile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The file has no bytes.
    #[error("document is empty")]
    Empty,

    /// The file exceeds [`DocumentFile::MAX_BYTES`].
    #[error("document must be at most {max} bytes (got {actual})")]
    TooLarge {
        /// Maximum allowed size.
        max: usize,
        /// Size of the rejected file.
        actual: usize,
    },

    /// The extension is not an accepted image or PDF type.
    #[error("unsupported document type: {0} (accepted: PNG, JPG, GIF, WEBP, HEIC, PDF)")]
    UnsupportedType(String),
}

/// Accepted extensions and their content types.
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("pdf", "application/pdf"),
];

/// A document the user picked, held in memory until upload.
///
/// ## Constraints
///
/// - Images (`png`, `jpg`, `jpeg`, `gif`, `webp`, `heic`) or `pdf`
/// - At most 10 MiB
/// - Not empty
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    file_name: String,
    content_type: &'static str,
    bytes: Vec<u8>,
}

impl DocumentFile {
    /// Maximum accepted document size.
    pub const MAX_BYTES: usize = 10 * 1024 * 1024;

    /// Accept a document by its original file name and contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, too large, or not an
    /// accepted type.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DocumentError> {
        let file_name = file_name.into();

        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }

        if bytes.len() > Self::MAX_BYTES {
            return Err(DocumentError::TooLarge {
                max: Self::MAX_BYTES,
                actual: bytes.len(),
            });
        }

        let extension = extension_of(&file_name)
            .ok_or_else(|| DocumentError::UnsupportedType(file_name.clone()))?;
        let content_type = ACCEPTED_TYPES
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, content_type)| *content_type)
            .ok_or_else(|| DocumentError::UnsupportedType(extension.clone()))?;

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Original file name as chosen by the user.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lowercased extension of the original file name.
    #[must_use]
    pub fn extension(&self) -> String {
        extension_of(&self.file_name).unwrap_or_default()
    }

    /// MIME type sent with the upload.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Raw file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for an accepted document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Storage key for this document: `name` plus the original extension.
    #[must_use]
    pub fn storage_key(&self, name: &str) -> String {
        format!("{name}.{}", self.extension())
    }
}

impl std::fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
