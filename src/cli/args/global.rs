//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// For backend URLs the precedence is: CLI flag > environment variable >
/// config file > built-in default. This struct captures the CLI/env layer;
/// the config file is merged in `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.siwaras/config.yaml)
    pub config: Option<String>,

    /// Custom session store path (defaults to the user cache dir)
    pub store: Option<String>,

    /// Bypass cache and fetch fresh data from API
    pub no_cache: bool,

    pub wisuda_url: Option<String>,
    pub sosprom_url: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            store: cli.store.clone(),
            no_cache: cli.no_cache,
            wisuda_url: cli.wisuda_url.clone(),
            sosprom_url: cli.sosprom_url.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get store path as `Option<&str>`.
    pub fn store_ref(&self) -> Option<&str> {
        self.store.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli() {
        let cli = Cli::try_parse_from([
            "siwaras",
            "--store",
            "/tmp/s.db",
            "--wisuda-url",
            "http://localhost:1/w",
            "logout",
        ])
        .unwrap();
        let opts = GlobalOptions::from_cli(&cli);

        assert_eq!(opts.store_ref(), Some("/tmp/s.db"));
        assert_eq!(opts.wisuda_url.as_deref(), Some("http://localhost:1/w"));
        assert_eq!(opts.config_ref(), None);
        assert!(!opts.no_cache);
    }
}
