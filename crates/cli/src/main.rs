//! KYC CLI - sign in, submit KYC details and review submissions.
//!
//! # Usage
//!
//! ```bash
//! # Create an account or sign in (the session is saved for later commands)
//! kyc signup -e ada@example.com -p 'correct horse battery staple'
//! kyc login -e ada@example.com -p 'correct horse battery staple'
//!
//! # Submit KYC details as a regular user
//! kyc submit --full-name "Ada Lovelace" --date-of-birth 1815-12-10 \
//!     --address "12 St James's Square, London" --document ./passport.pdf
//!
//! # Review as an admin
//! kyc review list
//! kyc review approve <SUBMISSION_ID>
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Project URL
//! - `SUPABASE_ANON_KEY` - Project anon key
//! - `KYC_DOCUMENT_BUCKET` - Storage bucket for ID documents (default `kyc-documents`)
//! - `KYC_SESSION_FILE` - Where the session is saved (default `.kyc-session.json`)
//! - `KYC_LOG_JSON` - Emit JSON logs
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE` - Error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kyc_core::{ReviewAction, SubmissionId};
use kyc_portal::{AppError, PortalConfig, SupabaseClient};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::session_store::SessionStore;
use commands::submit::SubmitArgs;

mod commands;

#[derive(Parser)]
#[command(name = "kyc")]
#[command(author, version, about = "KYC submission and review")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign in
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user, role and view
    Whoami,
    /// Submit KYC details with an ID document
    Submit {
        /// Full legal name
        #[arg(long)]
        full_name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: String,

        /// Residential address
        #[arg(long)]
        address: String,

        /// ID document (image or PDF, at most 10 MiB)
        #[arg(long)]
        document: PathBuf,
    },
    /// Review submissions (admins only)
    Review {
        #[command(subcommand)]
        action: ReviewCommand,
    },
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Show the tiles and all submissions
    List,
    /// Approve a pending submission
    Approve {
        /// Submission id
        id: SubmissionId,
    },
    /// Reject a pending submission
    Reject {
        /// Submission id
        id: SubmissionId,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PortalConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kyc_portal=info,kyc_cli=info".into());

    // Logs go to stderr; stdout carries command output
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (needed for Sentry init)
    let config = PortalConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing(config.as_ref().is_ok_and(|config| config.log_json));

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_internal() {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Command failed");
            } else {
                tracing::error!(error = %e, "Command failed");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: PortalConfig) -> Result<(), AppError> {
    let client = Arc::new(SupabaseClient::new(config.supabase())?);
    let store = SessionStore::new(&config.session_file);

    if let Some(session) = store.load().await? {
        tracing::debug!(path = %store.path().display(), "Loaded saved session");
        client.restore_session(session);
    }

    let result = dispatch(cli.command, &client, &config).await;

    // Sign-in, refresh and sign-out all change the session; keep the file in step
    store.sync(client.session().as_ref()).await?;

    result
}

async fn dispatch(
    command: Commands,
    client: &Arc<SupabaseClient>,
    config: &PortalConfig,
) -> Result<(), AppError> {
    match command {
        Commands::Signup { email, password } => {
            commands::auth::signup(client, &email, SecretString::from(password)).await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(client, &email, SecretString::from(password)).await?;
        }
        Commands::Logout => commands::auth::logout(client).await?,
        Commands::Whoami => commands::auth::whoami(client).await,
        Commands::Submit {
            full_name,
            date_of_birth,
            address,
            document,
        } => {
            let args = SubmitArgs {
                full_name: &full_name,
                date_of_birth: &date_of_birth,
                address: &address,
                document: &document,
            };
            commands::submit::submit(client, &config.supabase().document_bucket, args).await?;
        }
        Commands::Review { action } => match action {
            ReviewCommand::List => commands::review::list(client).await?,
            ReviewCommand::Approve { id } => {
                commands::review::apply(client, id, ReviewAction::Approve).await?;
            }
            ReviewCommand::Reject { id } => {
                commands::review::apply(client, id, ReviewAction::Reject).await?;
            }
        },
    }
    Ok(())
}
