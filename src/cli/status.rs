//! Status command implementation

use colored::Colorize;
use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::domain::Domain;
use crate::error::Result;
use crate::output::formatters::{format_local_time, format_size};
use crate::output::json::format_json;

/// Show the session, cache and configured backends
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let session = ctx.sessions.get_session();
    let stats = ctx.cache.stats()?;

    if ctx.format == OutputFormat::Json {
        let urls = ctx.config.base_urls();
        let status = json!({
            "session": session,
            "cache": stats,
            "backends": {
                "wisuda": urls.wisuda,
                "sosprom": urls.sosprom,
            },
        });
        println!("{}", format_json(&status)?);
        return Ok(());
    }

    println!("{}\n", "SIWARAS Status".bold());

    match &session.username {
        Some(username) => {
            let role = session.role.map(|r| r.as_str()).unwrap_or("unknown");
            println!("{} Logged in as {} ({})", "✓".green(), username.bold(), role);
            if session.role.is_some_and(|r| !r.is_admin()) {
                println!("  {}", "Read-only access".yellow());
            }
            println!("  Domain:     {}", session.domain.title());
            println!("  Since:      {}", format_local_time(session.login_time));
            if let Some(id) = &session.admin_id {
                println!("  Admin ID:   {}", id);
            }
        }
        None => {
            println!("{} Not logged in", "○".dimmed());
            println!("  → Run 'siwaras login <USERNAME>' to sign in");
        }
    }

    println!();
    println!(
        "Cache: {} valid, {} expired ({} of {})",
        stats.valid_entries,
        stats.expired_entries,
        format_size(stats.used_bytes),
        format_size(stats.quota_bytes)
    );

    println!();
    for domain in Domain::ALL {
        println!(
            "{:<8} {}",
            domain.title(),
            ctx.config.base_urls().for_domain(domain).cyan()
        );
    }

    Ok(())
}
