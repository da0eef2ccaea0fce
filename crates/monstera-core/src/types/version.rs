//! API version segment (`v1`, `v2`, ...).
//!
//! The version is interpolated into base URLs as `{host}/api/{version}`, so it
//! must be a single, path-safe segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonsteraError;

/// Path segment selecting an API version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        ApiVersion("v1".to_string())
    }
}

impl FromStr for ApiVersion {
    type Err = MonsteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().trim_matches('/');

        if input.is_empty() {
            return Err(MonsteraError::InvalidVersion {
                input: s.to_string(),
                reason: "version must not be empty".to_string(),
            });
        }

        if let Some(bad) = input
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(MonsteraError::InvalidVersion {
                input: s.to_string(),
                reason: format!("unexpected character '{}'", bad),
            });
        }

        // Bare numbers are shorthand for `v<N>`
        if input.chars().all(|c| c.is_ascii_digit()) {
            return Ok(ApiVersion(format!("v{}", input)));
        }

        Ok(ApiVersion(input.to_string()))
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = MonsteraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
