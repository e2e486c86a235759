//! SIWARAS CLI - cached, coalesced access to the wisuda and sosprom backends

use clap::Parser;

mod cache;
mod cli;
mod client;
mod clock;
mod config;
mod domain;
mod error;
mod output;
mod session;
mod storage;

use cli::{CacheCommands, Cli, Commands, ConfigCommands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over --debug
    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Read {
            operation,
            params,
            domain,
        } => cli::api::read(&opts, &operation, params, domain).await,
        Commands::Batch { domain } => cli::api::batch(&opts, domain).await,
        Commands::Write {
            operation,
            data,
            domain,
        } => cli::api::write(&opts, &operation, &data, domain).await,
        Commands::Login {
            username,
            password,
            guest,
            domain,
        } => cli::session::login(&opts, &username, password, guest, domain).await,
        Commands::Logout => cli::session::logout(&opts),
        Commands::Status => cli::status::run(&opts),
        Commands::Audit { action, details } => cli::session::audit(&opts, &action, &details).await,
        Commands::Cache(cmd) => match cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear { domain } => cli::cache::clear(&opts, domain),
            CacheCommands::Sweep => cli::cache::sweep(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
        },
        Commands::Endpoints => cli::api::list_endpoints(opts.format),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Init { force } => cli::config::init(&opts, force),
            ConfigCommands::Show => cli::config::show(&opts),
        },
    }
}
