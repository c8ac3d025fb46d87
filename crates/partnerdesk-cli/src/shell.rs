//! Interactive shell. Every line typed counts as activity; thirty quiet
//! minutes end the session and close the shell.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::cli::ShellLine;
use crate::commands::{self, App};

const PROMPT: &str = "partnerdesk> ";

/// How long to wait for the notice that follows a forced sign-out
const NOTICE_WAIT: Duration = Duration::from_secs(1);

async fn show_prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(PROMPT.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn run(app: &mut App) -> Result<()> {
    let user = app.require_user().await?;
    println!("Signed in as {}. Type `help` for commands, `exit` to leave.", user.full_name());

    let monitor = app.session.spawn_inactivity_monitor();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    show_prompt().await?;
    loop {
        tokio::select! {
            event = app.events.recv() => {
                let Some(event) = event else { break };
                if app.show_event(event) {
                    // Idle expiry: the error notice follows the navigation.
                    if let Ok(Some(notice)) = tokio::time::timeout(NOTICE_WAIT, app.events.recv()).await {
                        app.show_event(notice);
                    }
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                app.session.record_activity();

                let words: Vec<&str> = line.split_whitespace().collect();
                if !words.is_empty() && !run_line(app, &words).await {
                    break;
                }
                show_prompt().await?;
            }
        }
    }

    monitor.abort();
    info!("Shell closed");
    Ok(())
}

/// Run one shell line. Returns false when the shell should close.
async fn run_line(app: &mut App, words: &[&str]) -> bool {
    let line = match ShellLine::try_parse_from(words.iter().copied()) {
        Ok(line) => line,
        Err(e) => {
            // Help and usage errors both render through clap.
            let _ = e.print();
            return true;
        }
    };

    let result = match line {
        ShellLine::Exit => return false,
        ShellLine::Logout => {
            if let Err(e) = commands::logout(app).await {
                eprintln!("{:#}", e);
            }
            return false;
        }
        ShellLine::Idle => {
            let remaining = app.session.inactivity_remaining();
            println!("Session ends after {} more idle minutes", remaining.as_secs().div_ceil(60));
            Ok(())
        }
        ShellLine::Portal(command) => commands::run_portal(app, command).await,
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
    }
    // A handler may already have flushed the sign-out event itself.
    let to_login = app.flush_events();
    !to_login && app.session.is_authenticated().await
}
