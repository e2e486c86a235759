//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

use crate::domain::Domain;

pub mod api;
pub mod args;
pub mod cache;
pub mod config;
pub mod context;
pub mod session;
pub mod status;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// SIWARAS - cached access to the wisuda and sosprom inventory backends
#[derive(Parser, Debug)]
#[command(name = "siwaras")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "SIWARAS_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "SIWARAS_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override session store location (SQLite file)
    #[arg(long, global = true, env = "SIWARAS_STORE", hide_env = true)]
    pub store: Option<String>,

    /// Override the wisuda backend URL
    #[arg(long, global = true, env = "SIWARAS_WISUDA_URL", hide_env = true)]
    pub wisuda_url: Option<String>,

    /// Override the sosprom backend URL
    #[arg(long, global = true, env = "SIWARAS_SOSPROM_URL", hide_env = true)]
    pub sosprom_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "SIWARAS_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass cache, fetch fresh data from API
    #[arg(long, global = true, env = "SIWARAS_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a read operation (cached)
    Read {
        /// Operation name, e.g. readMasterBarang
        operation: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = args::parse_param)]
        params: Vec<(String, String)>,

        /// Backend to query (defaults to the session's domain)
        #[arg(long, value_enum)]
        domain: Option<Domain>,
    },

    /// Fetch the batched dashboard datasets in one call
    Batch {
        #[arg(long, value_enum)]
        domain: Option<Domain>,
    },

    /// Run a write operation (never cached, clears the domain's cache)
    Write {
        /// Operation name, e.g. createMasterBarang
        operation: String,

        /// JSON payload
        #[arg(long, short = 'd')]
        data: String,

        #[arg(long, value_enum)]
        domain: Option<Domain>,
    },

    /// Sign in to a backend
    Login {
        username: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "SIWARAS_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Sign in with the read-only guest role
        #[arg(long)]
        guest: bool,

        /// Backend to sign in to (default: wisuda)
        #[arg(long, value_enum)]
        domain: Option<Domain>,
    },

    /// Sign out and drop all cached data
    Logout,

    /// Show session, cache and backend status
    Status,

    /// Record an audit log entry for the current user
    Audit {
        /// Action tag, e.g. EXPORT_PDF
        action: String,

        /// Free-text details
        details: String,
    },

    /// Manage the local response cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// List known backend operations
    Endpoints,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Remove cached entries
    Clear {
        /// Only clear this domain
        #[arg(long, value_enum)]
        domain: Option<Domain>,
    },

    /// Remove expired entries
    Sweep,

    /// Show the session store path
    Path,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,
}
