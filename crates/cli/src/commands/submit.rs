//! Submit KYC details.
//!
//! # Usage
//!
//! ```bash
//! kyc submit \
//!     --full-name "Ada Lovelace" \
//!     --date-of-birth 1815-12-10 \
//!     --address "12 St James's Square, London" \
//!     --document ./passport.pdf
//! ```

use std::path::Path;
use std::sync::Arc;

use kyc_portal::render::confirmation;
use kyc_portal::{AppError, SubmissionForm, SupabaseClient, View};

use super::{mount, output, require_view};

/// Draft fields collected from the command line.
#[derive(Debug)]
pub struct SubmitArgs<'a> {
    pub full_name: &'a str,
    pub date_of_birth: &'a str,
    pub address: &'a str,
    pub document: &'a Path,
}

/// Fill the submission form and submit it once.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the account is an admin, the
/// document cannot be read or is rejected, or the submit fails.
pub async fn submit(
    client: &Arc<SupabaseClient>,
    bucket: &str,
    args: SubmitArgs<'_>,
) -> Result<(), AppError> {
    let controller = mount(client).await;
    require_view(&controller, View::SubmissionForm)?;

    let form = SubmissionForm::new(controller.backend(), bucket);

    let bytes = tokio::fs::read(args.document).await?;
    let file_name = args
        .document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    form.attach(file_name, bytes)?;

    form.edit(|draft| {
        draft
            .with_full_name(args.full_name)
            .with_date_of_birth(args.date_of_birth)
            .with_address(args.address)
    });

    form.submit().await?;

    output(&confirmation());
    Ok(())
}
