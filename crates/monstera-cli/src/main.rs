//! # monstera-cli
//!
//! Command line companion for the Monstera API client.
//!
//! Lists the client presets, shows how a preset resolves against the local
//! `monstera.toml` and `NEXT_PUBLIC_*` variables, validates session tokens and
//! sends one-off requests through a fully configured client.

use clap::{Parser, Subcommand};
use monstera_core::error::{MonsteraError, MonsteraResult};
use std::process::ExitCode;
use tracing::{error, info};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Inspect and exercise Monstera API client configurations
#[derive(Parser)]
#[command(name = "monstera", version, about = "Monstera API client toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the client presets
    Presets,
    /// Show the configuration a preset resolves to
    Resolve {
        #[arg(default_value = "default")]
        preset: String,
        /// API version segment, e.g. v2
        #[arg(long = "api-version")]
        api_version: Option<String>,
        /// development, staging or production
        #[arg(long, short)]
        environment: Option<String>,
    },
    /// Send a GET request through a configured client
    Get {
        path: String,
        #[arg(long, short, default_value = "default")]
        preset: String,
        /// Bearer token to send instead of an anonymous request
        #[arg(long, env = "MONSTERA_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Query parameters as key=value
        #[arg(long = "query", short = 'q')]
        query: Vec<String>,
    },
    /// Check a session token or Cookie header
    Token {
        token: Option<String>,
        /// Parse a full Cookie header instead
        #[arg(long, conflicts_with = "token")]
        cookie: Option<String>,
    },
    /// Validate monstera.toml and the environment
    Check,
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting monstera v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_abort() => ExitCode::from(130),
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> MonsteraResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| MonsteraError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.json)?;

        match cli.command {
            Some(command) => commands::dispatch_command(command, &ctx).await,
            None => commands::show_help(&ctx).await,
        }
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "monstera={level},monstera_core={level},monstera_config={level},monstera_client={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("monstera encountered an unexpected error: {}", panic_info);
        eprintln!("monstera crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/monstera-dev/monstera-api/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
