//! Login, logout and audit commands

use colored::Colorize;
use dialoguer::{Password, theme::ColorfulTheme};
use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::domain::Domain;
use crate::error::{Result, SessionError};
use crate::output::json::format_json;
use crate::session::LoginMode;

/// Sign in and store the session
pub async fn login(
    opts: &GlobalOptions,
    username: &str,
    password: Option<String>,
    guest: bool,
    domain: Option<Domain>,
) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let domain = domain.unwrap_or_default();
    let mode = if guest { LoginMode::Guest } else { LoginMode::Admin };

    let password = match password {
        Some(p) => p,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Password for {} ({})", username, domain.title()))
            .interact()?,
    };

    let session = ctx.sessions.sign_in(username, &password, domain, mode).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&session)?),
        _ => {
            let role = session.role.map(|r| r.as_str()).unwrap_or("unknown");
            println!(
                "{} Logged in as {} ({})",
                "✓".green(),
                username.bold(),
                role.cyan()
            );
        }
    }
    Ok(())
}

/// Clear the session and every cached read
pub fn logout(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let was_logged_in = ctx.sessions.is_logged_in();
    ctx.sessions.clear_session()?;

    match ctx.format {
        OutputFormat::Json => println!(
            "{}",
            format_json(&json!({ "logged_out": was_logged_in }))?
        ),
        _ if was_logged_in => println!("{} Logged out", "✓".green()),
        _ => println!("{} No active session", "○".dimmed()),
    }
    Ok(())
}

/// Record an audit entry as the signed-in user
pub async fn audit(opts: &GlobalOptions, action: &str, details: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let handle = ctx
        .sessions
        .log_audit(action, details)
        .ok_or(SessionError::NotLoggedIn)?;

    // Audit failures are logged, never returned
    let _ = handle.await;

    match ctx.format {
        OutputFormat::Json => println!(
            "{}",
            format_json(&json!({ "action": action, "details": details }))?
        ),
        _ => println!("{} Audit entry sent: {}", "✓".green(), action),
    }
    Ok(())
}
