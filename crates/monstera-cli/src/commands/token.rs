//! `monstera token`: check a session token or Cookie header

use monstera_core::error::{MonsteraError, MonsteraResult};
use monstera_core::utils::token::validate_jwt_shape;
use monstera_core::utils::SessionCookies;

use super::CommandContext;

pub async fn execute(
    token: Option<&str>,
    cookie: Option<&str>,
    ctx: &CommandContext,
) -> MonsteraResult<()> {
    match (token, cookie) {
        (_, Some(cookie)) => check_cookie(cookie, ctx),
        (Some(token), None) => {
            validate_jwt_shape(token)?;
            if ctx.json {
                return ctx.print_json(&serde_json::json!({ "valid": true }));
            }
            ctx.output.success("Token is a well-formed JWT");
            Ok(())
        }
        (None, None) => Err(MonsteraError::ConfigValidation {
            field: "token".to_string(),
            reason: "Pass a token or --cookie".to_string(),
        }),
    }
}

fn check_cookie(cookie: &str, ctx: &CommandContext) -> MonsteraResult<()> {
    let session = SessionCookies::parse(cookie);

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "authenticated": session.is_authenticated(),
            "accessToken": session.access_token.is_some(),
            "refreshToken": session.refresh_token.is_some(),
        }));
    }

    if session.is_authenticated() {
        ctx.output.success("Cookie carries an access token");
    } else {
        ctx.output.warn("Cookie carries no usable access token");
    }
    if session.refresh_token.is_some() {
        ctx.output.info("A refresh token is present");
    }
    Ok(())
}
