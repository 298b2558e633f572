//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! kyc signup -e ada@example.com -p 'correct horse battery staple'
//! kyc login -e ada@example.com -p 'correct horse battery staple'
//! kyc whoami
//! kyc logout
//! ```

use std::sync::Arc;

use kyc_core::Email;
use kyc_portal::render::{navbar, view_label};
use kyc_portal::{AppError, SupabaseClient};
use secrecy::SecretString;
use tracing::info;

use super::{mount, output};

/// Create an account; signs in right away unless email confirmation is on.
///
/// # Errors
///
/// Returns an error if the email is malformed or the provider refuses.
pub async fn signup(
    client: &Arc<SupabaseClient>,
    email: &str,
    password: SecretString,
) -> Result<(), AppError> {
    let email = Email::parse(email)?;
    let mut controller = mount(client).await;

    if controller.sign_up(&email, &password).await? {
        output(&format!("Signed up and signed in as {email}"));
        output(&navbar(controller.role()));
    } else {
        output(&format!(
            "Signed up as {email}. Confirm the address from your inbox, then run `kyc login`."
        ));
    }
    Ok(())
}

/// Sign in with email and password.
///
/// # Errors
///
/// Returns an error if the email is malformed or the credentials are
/// rejected.
pub async fn login(
    client: &Arc<SupabaseClient>,
    email: &str,
    password: SecretString,
) -> Result<(), AppError> {
    let email = Email::parse(email)?;
    let mut controller = mount(client).await;

    controller.sign_in(&email, &password).await?;

    info!(email = %email, "Login succeeded");
    output(&navbar(controller.role()));
    output(view_label(controller.view()));
    Ok(())
}

/// Sign out; the saved session is removed even if the server call fails.
///
/// # Errors
///
/// Returns the provider's error from the sign-out call.
pub async fn logout(client: &Arc<SupabaseClient>) -> Result<(), AppError> {
    let mut controller = mount(client).await;
    if controller.session().is_none() {
        output("Not signed in");
        return Ok(());
    }

    controller.sign_out().await?;
    output("Signed out");
    Ok(())
}

/// Show who is signed in and which surface they get.
pub async fn whoami(client: &Arc<SupabaseClient>) {
    let controller = mount(client).await;

    let Some(session) = controller.session() else {
        output(view_label(controller.view()));
        output("Not signed in");
        return;
    };

    output(&navbar(controller.role()));
    match &session.user.email {
        Some(email) => output(&format!("{email} ({})", session.user.id)),
        None => output(&session.user.id.to_string()),
    }
    output(view_label(controller.view()));
}
