//! `monstera resolve`: show one fully-layered configuration

use monstera_config::{ConfigOverrides, ResolvedConfig};
use monstera_core::error::MonsteraResult;
use monstera_core::{ApiVersion, Environment};

use super::{parse_preset, CommandContext};

pub async fn execute(
    preset: &str,
    version: Option<&str>,
    environment: Option<&str>,
    ctx: &CommandContext,
) -> MonsteraResult<()> {
    let resolved = resolve(preset, version, environment, ctx).await?;

    if ctx.json {
        return ctx.print_json(&resolved);
    }

    print_resolved(&resolved, ctx);
    Ok(())
}

pub async fn resolve(
    preset: &str,
    version: Option<&str>,
    environment: Option<&str>,
    ctx: &CommandContext,
) -> MonsteraResult<ResolvedConfig> {
    let preset = parse_preset(preset, ctx)?;
    let version = version.map(str::parse::<ApiVersion>).transpose()?;
    let environment = environment.map(str::parse::<Environment>).transpose()?;

    ctx.layering()
        .await?
        .resolve(preset, version.as_ref(), environment, &ConfigOverrides::new())
}

fn print_resolved(resolved: &ResolvedConfig, ctx: &CommandContext) {
    let environment = resolved
        .environment
        .map(|e| e.to_string())
        .unwrap_or_else(|| "-".to_string());

    ctx.output.success(&format!("{} @ {}", resolved.preset, resolved.version));
    println!("  base url      {}", resolved.config.base_url);
    println!("  environment   {}", environment);
    println!("  timeout       {}ms", resolved.config.timeout.as_millis());
    println!("  credentials   {}", resolved.config.with_credentials);
    for (name, value) in &resolved.config.headers {
        println!("  header        {}: {}", name, value);
    }

    let options = &resolved.options;
    let flags = [
        ("auth", options.enable_auth),
        ("retry", options.enable_retry),
        ("logging", options.enable_logging),
        ("errors", options.enable_error_handling),
        ("case", options.enable_case_conversion),
        ("profiling", options.enable_profiling),
        ("compression", options.compression),
    ];
    let enabled: Vec<&str> = flags.iter().filter(|(_, on)| *on).map(|(name, _)| *name).collect();
    println!("  interceptors  {}", enabled.join(", "));
    if options.enable_retry {
        println!(
            "  retries       {} (base delay {}ms)",
            options.max_retries,
            options.retry_delay.as_millis()
        );
    }
}
