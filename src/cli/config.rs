//! Configuration file commands

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::output::json::format_json;

/// Write the built-in defaults to the config file
pub fn init(opts: &GlobalOptions, force: bool) -> Result<()> {
    let path = Config::path_or_default(opts.config_ref())?;
    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }

    Config::default().save_to(path.clone())?;
    println!(
        "{} Configuration saved to: {}",
        "✓".green(),
        path.display()
    );
    Ok(())
}

/// Print the effective configuration (file plus overrides)
pub fn show(opts: &GlobalOptions) -> Result<()> {
    let config = CommandContext::effective_config(opts)?;

    match opts.format {
        OutputFormat::Json => println!("{}", format_json(&config)?),
        _ => {
            let path = Config::path_or_default(opts.config_ref())?;
            let source = if path.exists() {
                path.display().to_string()
            } else {
                "built-in defaults".to_string()
            };
            println!("# {}", source.dimmed());
            print!(
                "{}",
                serde_yaml::to_string(&config).map_err(ConfigError::from)?
            );
        }
    }
    Ok(())
}
