//! partnerdesk - the Betaday partner portal in a terminal.
//!
//! One-shot commands for sign-in, account recovery and the referral
//! dashboard, plus an interactive shell that enforces the idle timeout.

mod cli;
mod commands;
mod shell;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use partnerdesk_core::config::APP_NAME;
use partnerdesk_core::Config;

use cli::{Args, Command, PortalCommand};
use commands::App;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and to a daily file under `log_dir`. The returned guard
/// flushes the file writer when dropped, so keep it alive for the whole run.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", APP_NAME));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::load()?;

    let log_dir = config.data_dir().ok().map(|dir| dir.join("logs"));
    let _guard = init_tracing(log_dir.as_deref());
    info!("partnerdesk starting");

    let mut app = App::new(config, args.api_url)?;

    match args.command {
        Command::Login { email } => commands::login(&mut app, email).await,
        Command::Logout => commands::logout(&mut app).await,
        Command::Status => commands::status(&mut app).await,
        Command::Register {
            first_name,
            last_name,
            email,
        } => commands::register(&mut app, first_name, last_name, email).await,
        Command::Verify { email, code } => commands::verify(&mut app, &email, &code).await,
        Command::ResendOtp { email } => commands::resend_otp(&mut app, &email).await,
        Command::ForgotPassword { email } => commands::forgot_password(&mut app, &email).await,
        Command::ResetPassword { email, code } => commands::reset_password(&mut app, email, code).await,
        Command::Pricing => commands::pricing(&mut app).await,
        Command::Shell => shell::run(&mut app).await,
        Command::Portal(command @ PortalCommand::Dashboard { offline: true }) => {
            commands::run_portal(&mut app, command).await
        }
        Command::Portal(command) => {
            app.require_user().await?;
            commands::run_portal(&mut app, command).await
        }
    }
}
