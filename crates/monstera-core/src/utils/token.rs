//! Session cookie parsing and token shape checks.
//!
//! Tokens are only checked for the three-segment JWT layout; signatures are
//! verified server-side.

use crate::error::{MonsteraError, MonsteraResult};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// True when `token` looks like `header.payload.signature` in base64url
pub fn is_jwt_shaped(token: &str) -> bool {
    validate_jwt_shape(token).is_ok()
}

/// Like [`is_jwt_shaped`], with the reason for rejection
pub fn validate_jwt_shape(token: &str) -> MonsteraResult<()> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(MonsteraError::InvalidToken {
            reason: format!("expected 3 segments, found {}", segments.len()),
        });
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(MonsteraError::InvalidToken {
                reason: format!("segment {} is empty", index + 1),
            });
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
        {
            return Err(MonsteraError::InvalidToken {
                reason: format!("segment {} is not base64url", index + 1),
            });
        }
    }

    Ok(())
}

/// Session tokens carried in a `Cookie` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionCookies {
    /// Parse a `Cookie` header value (`a=1; access_token=...; b=2`).
    ///
    /// Tokens that are not JWT-shaped are dropped.
    pub fn parse(header: &str) -> Self {
        let mut cookies = SessionCookies::default();

        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"');
            if !is_jwt_shaped(value) {
                continue;
            }
            match name.trim() {
                ACCESS_TOKEN_COOKIE => cookies.access_token = Some(value.to_string()),
                REFRESH_TOKEN_COOKIE => cookies.refresh_token = Some(value.to_string()),
                _ => {}
            }
        }

        cookies
    }

    /// True when a usable access token is present
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Render back to a `Cookie` header value
    pub fn to_header(&self) -> Option<String> {
        let parts: Vec<String> = [
            (ACCESS_TOKEN_COOKIE, &self.access_token),
            (REFRESH_TOKEN_COOKIE, &self.refresh_token),
        ]
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
        .collect();

        (!parts.is_empty()).then(|| parts.join("; "))
    }
}
