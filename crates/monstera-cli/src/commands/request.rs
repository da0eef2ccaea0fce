//! `monstera get`: one request through a fully configured client

use monstera_client::{ApiClientFactory, ApiRequest, ApiResponse, ClientRequest};
use monstera_core::error::{MonsteraError, MonsteraResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{parse_preset, CommandContext};

pub async fn execute(
    path: &str,
    preset: &str,
    token: Option<&str>,
    query: &[String],
    ctx: &CommandContext,
) -> MonsteraResult<()> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let response = send(path, preset, token, query, &cancel, ctx).await?;

    if ctx.json {
        return ctx.print_json(&response.body);
    }

    ctx.output.success(&format!(
        "{} in {}ms",
        response.status,
        response.elapsed.as_millis()
    ));
    ctx.print_json(&response.body)
}

pub async fn send(
    path: &str,
    preset: &str,
    token: Option<&str>,
    query: &[String],
    cancel: &CancellationToken,
    ctx: &CommandContext,
) -> MonsteraResult<ApiResponse> {
    let preset = parse_preset(preset, ctx)?;
    let factory = ApiClientFactory::new(ctx.layering().await?);

    let mut request = ClientRequest::new(preset);
    if let Some(token) = token {
        request = request.auth_token(token);
    }
    let client = factory.client_with(request)?;
    debug!(base_url = %client.base_url(), "Using client");

    let mut api_request = ApiRequest::get(path);
    for pair in query {
        let (name, value) = parse_query(pair)?;
        api_request = api_request.query(name, value);
    }

    client.send_with_cancel(api_request, cancel).await
}

/// Split a `key=value` argument
pub fn parse_query(pair: &str) -> MonsteraResult<(&str, &str)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(MonsteraError::ConfigValidation {
            field: "query".to_string(),
            reason: format!("Expected key=value, got '{}'", pair),
        }),
    }
}
