//! Client preset identifiers.
//!
//! A preset names a predefined bundle of HTTP client settings. The set is
//! closed: configuration for each variant lives in `monstera-config`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::MonsteraError;

/// Named client configuration bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// General purpose authenticated client
    Default,
    /// Authentication endpoints
    Auth,
    /// Administrator endpoints
    Admin,
    /// Endpoints that need no session
    Public,
    /// File uploads (long timeout, multipart)
    Upload,
    /// Batch jobs (very long timeout, more retries)
    Batch,
    /// Latency-sensitive calls (short timeout, no retry)
    Realtime,
}

impl Preset {
    /// Every preset, in table order
    pub const ALL: [Preset; 7] = [
        Preset::Default,
        Preset::Auth,
        Preset::Admin,
        Preset::Public,
        Preset::Upload,
        Preset::Batch,
        Preset::Realtime,
    ];

    /// Lowercase identifier used in config files and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Auth => "auth",
            Preset::Admin => "admin",
            Preset::Public => "public",
            Preset::Upload => "upload",
            Preset::Batch => "batch",
            Preset::Realtime => "realtime",
        }
    }

    /// Parse a preset name, falling back to `Default` for unknown names.
    ///
    /// Unknown names are logged at warn level so typos stay visible.
    pub fn parse_or_default(name: &str) -> Preset {
        match name.parse() {
            Ok(preset) => preset,
            Err(_) => {
                warn!(preset = name, "Unknown client preset, falling back to default");
                Preset::Default
            }
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::Default
    }
}

impl FromStr for Preset {
    type Err = MonsteraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == name)
            .ok_or_else(|| MonsteraError::UnknownPreset {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
