//! `monstera presets`: the preset table as it resolves here

use monstera_config::{ConfigOverrides, ConfigLayering};
use monstera_core::error::MonsteraResult;
use monstera_core::Preset;
use serde::Serialize;

use super::CommandContext;

/// One row of the preset table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSummary {
    pub name: &'static str,
    pub timeout_ms: u64,
    pub auth: bool,
    pub retry: bool,
    pub max_retries: u32,
    pub credentials: bool,
}

pub fn summarize(layering: &ConfigLayering) -> MonsteraResult<Vec<PresetSummary>> {
    Preset::ALL
        .iter()
        .map(|&preset| {
            let resolved = layering.resolve(preset, None, None, &ConfigOverrides::new())?;
            Ok(PresetSummary {
                name: preset.as_str(),
                timeout_ms: resolved.config.timeout.as_millis() as u64,
                auth: resolved.options.enable_auth,
                retry: resolved.options.enable_retry,
                max_retries: resolved.options.max_retries,
                credentials: resolved.config.with_credentials,
            })
        })
        .collect()
}

pub async fn execute(ctx: &CommandContext) -> MonsteraResult<()> {
    let layering = ctx.layering().await?;
    let rows = summarize(&layering)?;

    if ctx.json {
        return ctx.print_json(&rows);
    }

    ctx.output.step(
        "#",
        &format!(
            "{:<10} {:>9} {:>5} {:>6} {:>8} {:>12}",
            "preset", "timeout", "auth", "retry", "retries", "credentials"
        ),
    );
    for row in rows {
        println!(
            "  {:<10} {:>8}s {:>5} {:>6} {:>8} {:>12}",
            row.name,
            row.timeout_ms / 1000,
            yes_no(row.auth),
            yes_no(row.retry),
            row.max_retries,
            yes_no(row.credentials)
        );
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
