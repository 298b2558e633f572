//! Admin review commands.
//!
//! # Usage
//!
//! ```bash
//! kyc review list
//! kyc review approve 0b7f8a52-3c6e-4a51-9a0e-2f1d4c5b6a70
//! kyc review reject 0b7f8a52-3c6e-4a51-9a0e-2f1d4c5b6a70
//! ```

use std::sync::Arc;

use kyc_core::{ReviewAction, SubmissionId};
use kyc_portal::render::{render_table, render_tiles};
use kyc_portal::{AppError, ReviewDashboard, SupabaseClient, View};

use super::{mount, output, require_view};

async fn open(client: &Arc<SupabaseClient>) -> Result<ReviewDashboard<SupabaseClient>, AppError> {
    let controller = mount(client).await;
    require_view(&controller, View::ReviewDashboard)?;

    let mut dashboard = ReviewDashboard::new(controller.backend());
    dashboard.load().await;
    Ok(dashboard)
}

fn show(dashboard: &ReviewDashboard<SupabaseClient>) {
    output(&render_tiles(&dashboard.stats()));
    output("");
    output(&render_table(dashboard.submissions()));
}

/// Render the tiles and the submissions table.
///
/// # Errors
///
/// Returns an error unless an admin is signed in.
pub async fn list(client: &Arc<SupabaseClient>) -> Result<(), AppError> {
    let dashboard = open(client).await?;
    show(&dashboard);
    Ok(())
}

/// Approve or reject one pending submission, then show the refreshed table.
///
/// # Errors
///
/// Returns an error unless an admin is signed in and the submission is
/// pending.
pub async fn apply(
    client: &Arc<SupabaseClient>,
    id: SubmissionId,
    action: ReviewAction,
) -> Result<(), AppError> {
    let mut dashboard = open(client).await?;

    let updated = dashboard.apply(id, action).await?;
    output(&format!("Submission {} is now {}", updated.id, updated.status));
    output("");
    show(&dashboard);
    Ok(())
}
