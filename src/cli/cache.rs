//! Cache management commands

use colored::Colorize;
use serde_json::json;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::domain::Domain;
use crate::error::Result;
use crate::output::formatters::{format_size, format_usage};
use crate::output::json::format_json;

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let stats = ctx.cache.stats()?;
    let path = CommandContext::store_path(opts)?;

    match ctx.format {
        OutputFormat::Json => {
            let json = json!({
                "stats": stats,
                "ttl_secs": ctx.cache.ttl().as_secs(),
                "path": path.display().to_string(),
            });
            println!("{}", format_json(&json)?);
        }
        _ => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", path.display());
            println!("TTL:            {}s", ctx.cache.ttl().as_secs());
            println!("Valid entries:  {}", stats.valid_entries);
            println!("Expired:        {}", stats.expired_entries);
            println!(
                "Store size:     {} ({} of quota)",
                format_size(stats.used_bytes),
                format_usage(stats.used_bytes, stats.quota_bytes)
            );
            for domain in Domain::ALL {
                let count = stats.per_domain.get(domain.as_str()).copied().unwrap_or(0);
                println!("  {:<12}  {}", domain.title(), count);
            }
        }
    }

    Ok(())
}

/// Clear cache entries for one domain or all of them
pub fn clear(opts: &GlobalOptions, domain: Option<Domain>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let removed = ctx.cache.invalidate(domain);
    let scope = domain.map(|d| d.as_str()).unwrap_or("all");

    match ctx.format {
        OutputFormat::Json => {
            let json = json!({
                "entries_removed": removed,
                "domain": scope,
                "success": true,
            });
            println!("{}", format_json(&json)?);
        }
        _ => {
            if removed > 0 {
                println!("{} Cleared {} cache entries ({})", "✓".green(), removed, scope);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Remove expired entries.
///
/// Building the context already sweeps once, so this reports the entries
/// that sweep removed plus any found by a second pass.
pub fn sweep(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let removed = ctx.swept + ctx.cache.sweep_expired();

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&json!({ "entries_removed": removed }))?),
        _ => println!("Removed {} expired entries", removed),
    }
    Ok(())
}

/// Show the session store path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    let path = CommandContext::store_path(opts)?;
    println!("{}", path.display());
    Ok(())
}
