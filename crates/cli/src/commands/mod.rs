//! CLI command implementations.

pub mod auth;
pub mod review;
pub mod session_store;
pub mod submit;

use std::sync::Arc;

use kyc_portal::render::{navbar, view_label};
use kyc_portal::{AppError, SessionController, SupabaseClient, View};

/// Write user-facing output.
#[allow(clippy::print_stdout)]
pub fn output(text: &str) {
    println!("{text}");
}

/// Mount a session controller over the shared client.
pub async fn mount(client: &Arc<SupabaseClient>) -> SessionController<SupabaseClient> {
    let mut controller = SessionController::new(Arc::clone(client));
    controller.mount().await;
    controller
}

/// Fail unless the controller shows `expected`.
///
/// # Errors
///
/// Returns [`AppError::NotAuthenticated`] when nobody is signed in and
/// [`AppError::Forbidden`] when the role selects another surface.
pub fn require_view(
    controller: &SessionController<SupabaseClient>,
    expected: View,
) -> Result<(), AppError> {
    match controller.view() {
        view if view == expected => {
            output(&navbar(controller.role()));
            Ok(())
        }
        View::SignIn => Err(AppError::NotAuthenticated(
            "run `kyc login` first".to_string(),
        )),
        other => Err(AppError::Forbidden(format!(
            "{} is not available here; this account sees {}",
            view_label(expected),
            view_label(other)
        ))),
    }
}
