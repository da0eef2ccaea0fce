//! monstera.toml configuration parsing and serialization

use std::collections::BTreeMap;
use std::time::Duration;

use monstera_core::error::MonsteraError;
use monstera_core::{ApiVersion, Environment, Preset};
use serde::{Deserialize, Serialize};

use crate::presets::ConfigLayer;
use crate::ConfigResult;

/// Complete monstera.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonsteraToml {
    /// Connection defaults
    #[serde(default)]
    pub api: ApiSection,

    /// Per-preset overrides, keyed by preset name
    #[serde(default)]
    pub presets: BTreeMap<String, PresetSection>,

    /// Feature toggles
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

/// `[api]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<ApiVersion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// `[presets.<name>]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_credentials: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_auth: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_retry: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_logging: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_error_handling: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_case_conversion: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

impl PresetSection {
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            timeout: self.timeout_ms.map(Duration::from_millis),
            with_credentials: self.with_credentials,
            headers: self.headers.clone(),
            enable_auth: self.enable_auth,
            enable_retry: self.enable_retry,
            enable_logging: self.enable_logging,
            enable_error_handling: self.enable_error_handling,
            enable_case_conversion: self.enable_case_conversion,
            enable_profiling: None,
            compression: None,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay_ms.map(Duration::from_millis),
        }
    }
}

impl MonsteraToml {
    /// File override layer for a preset, if the file has one
    pub fn preset_layer(&self, preset: Preset) -> Option<ConfigLayer> {
        self.presets.get(preset.as_str()).map(PresetSection::to_layer)
    }
}

/// Parse TOML string to MonsteraToml configuration
pub fn parse_monstera_toml(content: &str) -> ConfigResult<MonsteraToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    // Then parse with serde for type safety
    let config: MonsteraToml = toml::from_str(content)
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize MonsteraToml to TOML string
pub fn serialize_monstera_toml(config: &MonsteraToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| MonsteraError::TomlParse {
        message: format!("TOML serialization error: {}", e),
        line: 0,
        column: 0,
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &MonsteraToml) -> ConfigResult<()> {
    for name in config.presets.keys() {
        // Strict here: a misspelled section would otherwise be silently ignored
        name.parse::<Preset>()?;
    }

    for (field, value) in [("api.host", &config.api.host), ("api.base_url", &config.api.base_url)] {
        if let Some(value) = value {
            url::Url::parse(value).map_err(|e| MonsteraError::ConfigValidation {
                field: field.to_string(),
                reason: format!("'{}' is not a valid URL: {}", value, e),
            })?;
        }
    }

    if config.api.timeout_ms == Some(0) {
        return Err(MonsteraError::ConfigValidation {
            field: "api.timeout_ms".to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }

    for (name, section) in &config.presets {
        if section.timeout_ms == Some(0) {
            return Err(MonsteraError::ConfigValidation {
                field: format!("presets.{}.timeout_ms", name),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
    }

    Ok(())
}

/// Load and parse monstera.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<MonsteraToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MonsteraError::io(format!("Failed to read {}", path), e))?;

    parse_monstera_toml(&content).map_err(|e| match e {
        MonsteraError::TomlParse {
            message,
            line,
            column,
        } => MonsteraError::TomlParse {
            message: format!("In file {}: {}", path, message),
            line,
            column,
        },
        MonsteraError::ConfigValidation { field, reason } => MonsteraError::ConfigValidation {
            field,
            reason: format!("In file {}: {}", path, reason),
        },
        other => other,
    })
}

fn located_error(content: &str, message: &str, span: Option<std::ops::Range<usize>>) -> MonsteraError {
    let (line, column) = span
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));
    MonsteraError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|newline| before[newline + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count())
        + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_monstera_toml("").unwrap();
        assert_eq!(config, MonsteraToml::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[api]
host = "https://api.example.com"
version = "v2"
environment = "production"
timeout_ms = 20000

[presets.admin]
timeout_ms = 45000
headers = { "X-Tenant" = "acme" }

[presets.upload]
max_retries = 1
retry_delay_ms = 500

[features]
expense_export = true
"#;

        let config = parse_monstera_toml(toml).unwrap();
        assert_eq!(config.api.host.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.api.version.as_ref().map(|v| v.as_str()), Some("v2"));
        assert_eq!(config.api.environment, Some(Environment::Production));
        assert_eq!(config.features.get("expense_export"), Some(&true));

        let admin = config.preset_layer(Preset::Admin).unwrap();
        assert_eq!(admin.timeout, Some(Duration::from_secs(45)));
        assert_eq!(admin.headers.get("X-Tenant").map(String::as_str), Some("acme"));

        let upload = config.preset_layer(Preset::Upload).unwrap();
        assert_eq!(upload.max_retries, Some(1));
        assert_eq!(upload.retry_delay, Some(Duration::from_millis(500)));

        assert!(config.preset_layer(Preset::Batch).is_none());
    }

    #[test]
    fn test_unknown_preset_section_is_rejected() {
        let toml = r#"
[presets.amdin]
timeout_ms = 1000
"#;
        match parse_monstera_toml(toml) {
            Err(MonsteraError::UnknownPreset { name }) => assert_eq!(name, "amdin"),
            other => panic!("Expected UnknownPreset, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_has_location() {
        let toml = "[api]\nhost = \n";
        match parse_monstera_toml(toml) {
            Err(MonsteraError::TomlParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected TomlParse, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_host_url() {
        let toml = "[api]\nhost = \"not a url\"\n";
        assert!(matches!(
            parse_monstera_toml(toml),
            Err(MonsteraError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let toml = "[presets.batch]\ntimeout_ms = 0\n";
        match parse_monstera_toml(toml) {
            Err(MonsteraError::ConfigValidation { field, .. }) => {
                assert_eq!(field, "presets.batch.timeout_ms")
            }
            other => panic!("Expected ConfigValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_serialized_config_parses_back() {
        let toml = "[api]\nversion = \"v3\"\n\n[presets.realtime]\ntimeout_ms = 2000\n";
        let config = parse_monstera_toml(toml).unwrap();
        let serialized = serialize_monstera_toml(&config).unwrap();
        assert_eq!(parse_monstera_toml(&serialized).unwrap(), config);
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 1));
        assert_eq!(line_column("abc\ndef", 5), (2, 2));
    }
}
