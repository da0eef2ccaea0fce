//! Configuration resolution for the Monstera API client
//!
//! This crate owns the static preset table, per-environment overrides, the
//! `NEXT_PUBLIC_*` environment settings and the optional `monstera.toml` file,
//! and merges them into a fully-populated [`ResolvedConfig`].

pub mod env;
pub mod merge;
pub mod presets;
pub mod toml;

// Re-export main types
pub use env::{environment_override, ApiSettings};
pub use merge::{
    build_base_url, ClientConfig, ClientOptions, ConfigLayering, ConfigLoader, ConfigOverrides,
    ConfigSource, ResolvedConfig,
};
pub use presets::{preset_layer, timeouts, ConfigLayer};
pub use self::toml::{ApiSection, MonsteraToml, PresetSection};

use monstera_core::error::MonsteraError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, MonsteraError>;

/// Serde helpers storing `Duration`s as integer milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
