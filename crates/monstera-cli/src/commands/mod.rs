//! Command implementations and dispatch logic.
//!
//! Each command is an async function that takes a [`CommandContext`].

use camino::Utf8PathBuf;
use monstera_config::{ConfigLayering, ConfigLoader};
use monstera_core::error::{MonsteraError, MonsteraResult};
use monstera_core::Preset;
use serde::Serialize;
use tracing::info;

pub mod check;
pub mod presets;
pub mod request;
pub mod resolve;
pub mod token;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub json: bool,
}

impl CommandContext {
    pub fn new(json: bool) -> MonsteraResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| MonsteraError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| MonsteraError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("Current directory is not valid UTF-8: {}", e),
        })?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            json,
        })
    }

    /// Config layering for the current directory
    pub async fn layering(&self) -> MonsteraResult<ConfigLayering> {
        ConfigLoader::new(self.cwd.clone()).load_layering().await
    }

    /// Print `value` as pretty JSON on stdout
    pub fn print_json<T: Serialize>(&self, value: &T) -> MonsteraResult<()> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|e| MonsteraError::decode("Failed to render JSON".to_string(), e))?;
        println!("{}", rendered);
        Ok(())
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> MonsteraResult<()> {
    match command {
        Commands::Presets => {
            info!("Listing presets");
            presets::execute(ctx).await
        }
        Commands::Resolve {
            preset,
            api_version,
            environment,
        } => {
            info!("Resolving preset: {} (version: {:?}, environment: {:?})", preset, api_version, environment);
            resolve::execute(&preset, api_version.as_deref(), environment.as_deref(), ctx).await
        }
        Commands::Get {
            path,
            preset,
            token,
            query,
        } => {
            info!("GET {} with preset {}", path, preset);
            request::execute(&path, &preset, token.as_deref(), &query, ctx).await
        }
        Commands::Token { token, cookie } => {
            info!("Checking session token");
            token::execute(token.as_deref(), cookie.as_deref(), ctx).await
        }
        Commands::Check => {
            info!("Checking configuration");
            check::execute(ctx).await
        }
        Commands::Version => show_version(ctx).await,
    }
}

/// Parse a preset name strictly, pointing at the closest known name on a typo
pub fn parse_preset(name: &str, ctx: &CommandContext) -> MonsteraResult<Preset> {
    name.parse::<Preset>().map_err(|e| {
        if let Some(suggestion) = suggest_similar_preset(name) {
            ctx.output.info(&format!("Did you mean '{}'?", suggestion));
        }
        e
    })
}

/// Show help information
pub async fn show_help(ctx: &CommandContext) -> MonsteraResult<()> {
    ctx.output.info("monstera - Monstera API client toolkit");
    ctx.output.info("");
    ctx.output.info("Usage: monstera [COMMAND] [OPTIONS]");
    ctx.output.info("");
    ctx.output.info("Configuration:");
    ctx.output.info("  presets                List the client presets");
    ctx.output.info("  resolve <preset>       Show a resolved configuration");
    ctx.output.info("  check                  Validate monstera.toml");
    ctx.output.info("");
    ctx.output.info("Requests:");
    ctx.output.info("  get <path>             Send a GET request");
    ctx.output.info("  token <jwt>            Check a session token");
    ctx.output.info("");
    ctx.output.info("Run 'monstera <command> --help' for more information on a command.");
    Ok(())
}

async fn show_version(ctx: &CommandContext) -> MonsteraResult<()> {
    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "buildDate": env!("MONSTERA_BUILD_DATE"),
            "rustc": env!("MONSTERA_RUSTC_VERSION"),
            "profile": env!("MONSTERA_BUILD_PROFILE"),
        }));
    }

    ctx.output.info(&format!("monstera {}", env!("CARGO_PKG_VERSION")));
    ctx.output.info(&format!("Built: {}", env!("MONSTERA_BUILD_DATE")));
    ctx.output.info(&format!("Rust: {}", env!("MONSTERA_RUSTC_VERSION")));
    ctx.output.info(&format!("Profile: {}", env!("MONSTERA_BUILD_PROFILE")));
    Ok(())
}

/// Closest preset name within edit distance 2
pub fn suggest_similar_preset(input: &str) -> Option<String> {
    let input = input.to_lowercase();
    Preset::ALL
        .iter()
        .map(|preset| (preset.as_str(), edit_distance(&input, preset.as_str())))
        .filter(|(_, distance)| *distance <= 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name.to_string())
}

/// Levenshtein distance between two strings
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
