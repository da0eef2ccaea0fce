//! `monstera check`: validate configuration files and variables

use monstera_config::{ConfigLoader, ConfigSource};
use monstera_core::error::MonsteraResult;

use super::CommandContext;

pub async fn execute(ctx: &CommandContext) -> MonsteraResult<()> {
    let loader = ConfigLoader::new(ctx.cwd.clone());

    match loader.load_project_config().await? {
        Some((config, ConfigSource::Project(path))) => {
            ctx.output.success(&format!("{} is valid", path));
            if !config.presets.is_empty() {
                let names: Vec<&str> = config.presets.keys().map(String::as_str).collect();
                ctx.output.info(&format!("Preset overrides: {}", names.join(", ")));
            }
        }
        Some(_) => {}
        None => ctx.output.warn("No monstera.toml found; using built-in defaults"),
    }

    // Variables can still be malformed even without a file
    let layering = loader.load_layering().await?;
    let settings = layering.settings();
    let host = settings
        .host
        .as_deref()
        .or(settings.base_url.as_deref())
        .unwrap_or("-");
    ctx.output.info(&format!("Host: {}", host));
    ctx.output.info(&format!("Version: {}", settings.version));
    if let Some(environment) = settings.environment {
        ctx.output.info(&format!("Environment: {}", environment));
    }

    ctx.output.success("Configuration is valid");
    Ok(())
}
