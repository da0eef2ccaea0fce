//! Deployment environments the API can be reached in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonsteraError;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Host used when no environment variable overrides it
    pub fn default_host(&self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:8080",
            Environment::Staging => "https://staging-api.monstera.com",
            Environment::Production => "https://api.monstera.com",
        }
    }

    /// Environment variable that overrides the host for this environment
    pub fn host_variable(&self) -> &'static str {
        match self {
            Environment::Development => "NEXT_PUBLIC_DEV_API_HOST",
            Environment::Staging => "NEXT_PUBLIC_STAGING_API_HOST",
            Environment::Production => "NEXT_PUBLIC_PRODUCTION_API_HOST",
        }
    }
}

impl FromStr for Environment {
    type Err = MonsteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(MonsteraError::UnknownEnvironment {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_aliases() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("Staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_default_hosts() {
        assert_eq!(Environment::Development.default_host(), "http://localhost:8080");
        assert_eq!(Environment::Production.default_host(), "https://api.monstera.com");
    }
}
