//! Plain-text rendering of the portal surfaces.

use std::fmt::Write as _;

use kyc_core::{DashboardStats, KycSubmission, ReviewAction, UserRole};

use crate::session::View;

pub const APP_TITLE: &str = "KYC Management System";
pub const FORM_TITLE: &str = "Submit KYC Information";
pub const TABLE_TITLE: &str = "KYC Submissions";
pub const CONFIRMATION_TITLE: &str = "KYC Submission Successful";
pub const CONFIRMATION_BODY: &str = "Your KYC information has been submitted and is pending review.";

const TABLE_HEADERS: [&str; 6] = ["ID", "User", "Submission Date", "Status", "Document", "Actions"];

/// The four aggregate tiles, in display order.
#[must_use]
pub const fn tiles(stats: &DashboardStats) -> [(&'static str, u64); 4] {
    [
        ("Total Users", stats.total_users),
        ("Pending", stats.kyc_stats.pending),
        ("Approved", stats.kyc_stats.approved),
        ("Rejected", stats.kyc_stats.rejected),
    ]
}

/// Title bar with the role label.
#[must_use]
pub fn navbar(role: UserRole) -> String {
    format!("{APP_TITLE}  [{}]", role.label())
}

/// One-line description of what the session controller shows.
#[must_use]
pub const fn view_label(view: View) -> &'static str {
    match view {
        View::SignIn => "Sign in",
        View::Loading => "Loading...",
        View::SubmissionForm => FORM_TITLE,
        View::ReviewDashboard => TABLE_TITLE,
    }
}

#[must_use]
pub fn confirmation() -> String {
    format!("{CONFIRMATION_TITLE}\n{CONFIRMATION_BODY}\n")
}

#[must_use]
pub fn render_tiles(stats: &DashboardStats) -> String {
    tiles(stats)
        .iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("  |  ")
}

/// Aligned table of submissions with the actions each one offers.
#[must_use]
pub fn render_table(submissions: &[KycSubmission]) -> String {
    let rows: Vec<[String; 6]> = submissions.iter().map(row).collect();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{TABLE_TITLE}");
    push_line(&mut out, &TABLE_HEADERS.map(String::from), &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    if rows.is_empty() {
        out.push_str("(no submissions)\n");
    }
    out
}

fn row(submission: &KycSubmission) -> [String; 6] {
    [
        submission.id.to_string(),
        submission.full_name.clone(),
        submission.created_at.format("%Y-%m-%d").to_string(),
        submission.status.to_string(),
        submission.id_document_url.clone(),
        actions(submission.actions()),
    ]
}

fn actions(actions: &[ReviewAction]) -> String {
    if actions.is_empty() {
        return "-".to_string();
    }
    actions
        .iter()
        .map(|action| action.label())
        .collect::<Vec<_>>()
        .join(" / ")
}

fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
