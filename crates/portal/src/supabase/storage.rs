//! Supabase Storage (`/storage/v1`).

use kyc_core::DocumentFile;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};
use url::Url;

use super::SupabaseClient;
use crate::backend::{BackendError, DocumentStorage};

impl SupabaseClient {
    /// `storage/v1/object/{bucket}/{key}`, with both segments percent-encoded.
    fn object_url(&self, prefix: &[&str], bucket: &str, key: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint("storage/v1/object")?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Parse("project URL cannot be a base".to_string()))?
            .extend(prefix)
            .push(bucket)
            .push(key);
        Ok(url)
    }
}

impl DocumentStorage for SupabaseClient {
    #[instrument(skip(self, file), fields(bucket = %bucket, key = %key, size = file.len()))]
    async fn upload(&self, bucket: &str, key: &str, file: &DocumentFile) -> Result<(), BackendError> {
        let url = self.object_url(&[], bucket, key)?;

        let response = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, file.content_type())
            .header("x-upsert", "false")
            .body(file.bytes().to_vec())
            .send()
            .await?;

        Self::expect_success(response).await?;
        debug!("Document uploaded");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.object_url(&["public"], bucket, key).map_or_else(
            |_| {
                format!(
                    "{}storage/v1/object/public/{bucket}/{key}",
                    self.base_url()
                )
            },
            String::from,
        )
    }

    #[instrument(skip(self), fields(bucket = %bucket, key = %key))]
    async fn remove(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        let url = self.object_url(&[], bucket, key)?;
        let response = self.request(Method::DELETE, url).send().await?;
        Self::expect_success(response).await?;
        debug!("Document removed");
        Ok(())
    }
}
