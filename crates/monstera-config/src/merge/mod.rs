//! Configuration layering, base URL building and config file discovery

use std::collections::BTreeMap;
use std::time::Duration;

use camino::Utf8PathBuf;
use monstera_core::error::MonsteraError;
use monstera_core::{ApiVersion, Environment, Preset};
use serde::Serialize;
use tracing::debug;

use crate::env::{environment_override, ApiSettings};
use crate::presets::{preset_layer, timeouts, ConfigLayer};
use crate::toml::MonsteraToml;
use crate::ConfigResult;

pub const CONFIG_FILE_NAME: &str = "monstera.toml";

/// Connection settings handed to the HTTP client. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(rename = "timeout_ms", with = "crate::duration_ms")]
    pub timeout: Duration,
    pub with_credentials: bool,
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Default connection settings for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            base_url: base_url.into(),
            timeout: timeouts::DEFAULT,
            with_credentials: true,
            headers,
        }
    }

    /// Insert a header, replacing any existing header with the same name in any case
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Behavioral switches for a client's interceptor chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientOptions {
    pub enable_auth: bool,
    pub enable_retry: bool,
    pub enable_logging: bool,
    pub enable_error_handling: bool,
    pub enable_case_conversion: bool,
    pub enable_profiling: bool,
    pub compression: bool,
    pub max_retries: u32,
    #[serde(rename = "retry_delay_ms", with = "crate::duration_ms")]
    pub retry_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            enable_auth: true,
            enable_retry: true,
            enable_logging: false,
            enable_error_handling: true,
            enable_case_conversion: true,
            enable_profiling: false,
            compression: false,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Call-site overrides, applied last
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigOverrides {
    /// Use this base URL verbatim
    pub base_url: Option<String>,
    /// Build the base URL from this host
    pub host: Option<String>,
    pub layer: ConfigLayer,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.layer.timeout = Some(timeout);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.layer.with_credentials = Some(with_credentials);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.layer.headers.insert(name.into(), value.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.layer.max_retries = Some(max_retries);
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.layer.retry_delay = Some(retry_delay);
        self
    }

    pub fn enable_retry(mut self, enabled: bool) -> Self {
        self.layer.enable_retry = Some(enabled);
        self
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.layer.enable_logging = Some(enabled);
        self
    }

    pub fn enable_auth(mut self, enabled: bool) -> Self {
        self.layer.enable_auth = Some(enabled);
        self
    }

    pub fn enable_case_conversion(mut self, enabled: bool) -> Self {
        self.layer.enable_case_conversion = Some(enabled);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }
}

/// Fully-populated configuration for one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub preset: Preset,
    pub version: ApiVersion,
    pub environment: Option<Environment>,
    pub config: ClientConfig,
    pub options: ClientOptions,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project monstera.toml file
    Project(Utf8PathBuf),
    /// Environment variables only
    Environment,
}

/// Merges settings, presets, environment overrides and file sections into
/// [`ResolvedConfig`]s.
///
/// Priority, lowest first: built-in defaults, process environment (logging
/// and compression only), preset table, requested environment, file preset
/// section, call-site overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayering {
    settings: ApiSettings,
    file: Option<MonsteraToml>,
}

impl ConfigLayering {
    /// Create a layering over the given settings
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            settings,
            file: None,
        }
    }

    /// Add monstera.toml preset sections
    pub fn with_file(mut self, file: MonsteraToml) -> Self {
        self.file = Some(file);
        self
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn file(&self) -> Option<&MonsteraToml> {
        self.file.as_ref()
    }

    /// Resolve the configuration for a preset
    pub fn resolve(
        &self,
        preset: Preset,
        version: Option<&ApiVersion>,
        environment: Option<Environment>,
        overrides: &ConfigOverrides,
    ) -> ConfigResult<ResolvedConfig> {
        let base_url = build_base_url(
            &self.settings,
            overrides.base_url.as_deref(),
            overrides.host.as_deref(),
            version,
            environment,
        )?;

        let mut config = ClientConfig::new(base_url);
        config.timeout = self.settings.timeout;
        let mut options = ClientOptions::default();

        if let Some(process_env) = self.settings.environment {
            let full = environment_override(process_env);
            let ambient = ConfigLayer {
                enable_logging: full.enable_logging,
                enable_profiling: full.enable_profiling,
                compression: full.compression,
                ..Default::default()
            };
            ambient.apply_to(&mut config, &mut options);
        }

        preset_layer(preset).apply_to(&mut config, &mut options);

        if let Some(environment) = environment {
            environment_override(environment).apply_to(&mut config, &mut options);
        }

        if let Some(layer) = self.file.as_ref().and_then(|f| f.preset_layer(preset)) {
            layer.apply_to(&mut config, &mut options);
        }

        overrides.layer.apply_to(&mut config, &mut options);

        debug!(
            preset = %preset,
            base_url = %config.base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "Resolved client configuration"
        );

        Ok(ResolvedConfig {
            preset,
            version: version.cloned().unwrap_or_else(|| self.settings.version.clone()),
            environment: environment.or(self.settings.environment),
            config,
            options,
        })
    }
}

/// Build the base URL for a client.
///
/// An explicit `base_url` wins. Otherwise the host is taken from `host`, the
/// requested environment, or the settings (in that order) and combined with the
/// version as `{host}/api/{version}`. Without any host, the settings' full
/// base URL is used.
pub fn build_base_url(
    settings: &ApiSettings,
    base_url: Option<&str>,
    host: Option<&str>,
    version: Option<&ApiVersion>,
    environment: Option<Environment>,
) -> ConfigResult<String> {
    let url = match base_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => {
            let host = host
                .or_else(|| environment.map(|env| settings.environment_host(env)))
                .or(settings.host.as_deref());

            match host {
                Some(host) => {
                    let version = version.unwrap_or(&settings.version);
                    format!("{}/api/{}", host.trim_end_matches('/'), version)
                }
                None => settings.base_url.clone().ok_or_else(|| MonsteraError::ConfigValidation {
                    field: "base_url".to_string(),
                    reason: "no API host or base URL is configured".to_string(),
                })?,
            }
        }
    };

    url::Url::parse(&url).map_err(|e| MonsteraError::ConfigValidation {
        field: "base_url".to_string(),
        reason: format!("'{}' is not a valid URL: {}", url, e),
    })?;

    Ok(url)
}

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load the project's monstera.toml, if there is one
    pub async fn load_project_config(&self) -> ConfigResult<Option<(MonsteraToml, ConfigSource)>> {
        let path = self.resolve_config_path(CONFIG_FILE_NAME)?;
        if path.exists() {
            let config = crate::toml::load_from_file(&path).await?;
            return Ok(Some((config, ConfigSource::Project(path))));
        }
        Ok(None)
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> ConfigResult<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Ok(config_path);
            }

            // Move up one directory
            if let Some(parent) = current.parent() {
                current = parent;
            } else {
                // Reached filesystem root
                break;
            }
        }

        // Return path in current directory even if it doesn't exist
        Ok(self.cwd.join(filename))
    }

    /// Load global configuration from `~/.monstera/config.toml`
    pub async fn load_global_config(&self) -> ConfigResult<Option<(MonsteraToml, ConfigSource)>> {
        let home_dir = dirs::home_dir().ok_or_else(|| MonsteraError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;

        let global_config_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| MonsteraError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })?
            .join(".monstera")
            .join("config.toml");

        if global_config_path.exists() {
            let config = crate::toml::load_from_file(&global_config_path).await?;
            Ok(Some((config, ConfigSource::Global(global_config_path))))
        } else {
            Ok(None)
        }
    }

    /// Build a layering from the global file, the project file and the process environment
    pub async fn load_layering(&self) -> ConfigResult<ConfigLayering> {
        let global = self.load_global_config().await.unwrap_or_else(|e| {
            debug!(error = %e, "Skipping global configuration");
            None
        });
        let project = self.load_project_config().await?;

        for (_, source) in global.iter().chain(project.iter()) {
            debug!(source = ?source, "Loaded configuration file");
        }

        let file = merge_files(global.map(|(f, _)| f), project.map(|(f, _)| f));
        let mut settings = ApiSettings::default();
        if let Some(file) = &file {
            settings = settings.apply_file(file);
        }
        settings = settings.apply_vars(std::env::vars())?;

        let layering = ConfigLayering::new(settings);
        Ok(match file {
            Some(file) => layering.with_file(file),
            None => layering,
        })
    }
}

/// Merge two config files, `project` taking precedence
pub fn merge_files(global: Option<MonsteraToml>, project: Option<MonsteraToml>) -> Option<MonsteraToml> {
    match (global, project) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only),
        (Some(mut merged), Some(project)) => {
            let api = project.api;
            merged.api.host = api.host.or(merged.api.host);
            merged.api.version = api.version.or(merged.api.version);
            merged.api.base_url = api.base_url.or(merged.api.base_url);
            merged.api.environment = api.environment.or(merged.api.environment);
            merged.api.timeout_ms = api.timeout_ms.or(merged.api.timeout_ms);

            for (name, section) in project.presets {
                merged.presets.insert(name, section);
            }
            merged.features.extend(project.features);
            Some(merged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toml::parse_monstera_toml;

    fn layering() -> ConfigLayering {
        ConfigLayering::new(ApiSettings::default())
    }

    fn v(version: &str) -> ApiVersion {
        version.parse().unwrap()
    }

    #[test]
    fn test_default_resolution() {
        let resolved = layering()
            .resolve(Preset::Default, None, None, &ConfigOverrides::default())
            .unwrap();

        assert_eq!(resolved.config.base_url, "http://localhost:8080/api/v1");
        assert_eq!(resolved.config.timeout, timeouts::DEFAULT);
        assert!(resolved.config.with_credentials);
        assert_eq!(resolved.config.header("Content-Type"), Some("application/json"));
        assert!(resolved.options.enable_auth);
        assert!(resolved.options.enable_retry);
        assert!(!resolved.options.enable_logging);
        assert_eq!(resolved.options.max_retries, 3);
    }

    #[test]
    fn test_versioned_base_url() {
        let resolved = layering()
            .resolve(Preset::Default, Some(&v("v2")), None, &ConfigOverrides::default())
            .unwrap();
        assert!(resolved.config.base_url.ends_with("/api/v2"));
        assert_eq!(resolved.version.as_str(), "v2");
    }

    #[test]
    fn test_environment_host_and_override() {
        let resolved = layering()
            .resolve(
                Preset::Default,
                None,
                Some(Environment::Development),
                &ConfigOverrides::default(),
            )
            .unwrap();

        assert_eq!(resolved.config.base_url, "http://localhost:8080/api/v1");
        assert!(resolved.options.enable_logging);
        assert!(resolved.options.enable_profiling);
        assert_eq!(resolved.config.timeout, timeouts::LONG);
        assert_eq!(resolved.options.max_retries, 5);

        let prod = layering()
            .resolve(
                Preset::Auth,
                None,
                Some(Environment::Production),
                &ConfigOverrides::default(),
            )
            .unwrap();
        assert_eq!(prod.config.base_url, "https://api.monstera.com/api/v1");
        assert!(prod.config.with_credentials);
        assert!(!prod.options.enable_logging);
        assert_eq!(prod.options.max_retries, 2);
        assert!(prod.options.compression);
    }

    #[test]
    fn test_priority_preset_then_environment_then_call_site() {
        let overrides = ConfigOverrides::new().timeout(Duration::from_millis(25_000));
        let resolved = layering()
            .resolve(
                Preset::Public,
                None,
                Some(Environment::Development),
                &overrides,
            )
            .unwrap();

        // Call site wins
        assert_eq!(resolved.config.timeout, Duration::from_millis(25_000));
        // Environment beats preset
        assert!(resolved.options.enable_logging);
        // Preset survives where nothing overrides it
        assert!(!resolved.config.with_credentials);
    }

    #[test]
    fn test_custom_headers_merge_with_defaults() {
        let overrides = ConfigOverrides::new()
            .timeout(Duration::from_millis(15_000))
            .header("X-Custom-Header", "test");
        let resolved = layering()
            .resolve(Preset::Default, None, None, &overrides)
            .unwrap();

        assert_eq!(resolved.config.timeout, Duration::from_millis(15_000));
        assert_eq!(resolved.config.header("X-Custom-Header"), Some("test"));
        assert_eq!(resolved.config.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_process_environment_only_touches_logging() {
        let settings = ApiSettings {
            environment: Some(Environment::Development),
            ..Default::default()
        };
        let resolved = ConfigLayering::new(settings)
            .resolve(Preset::Upload, None, None, &ConfigOverrides::default())
            .unwrap();

        assert!(resolved.options.enable_logging);
        assert_eq!(resolved.config.timeout, timeouts::UPLOAD);
        assert_eq!(resolved.environment, Some(Environment::Development));
    }

    #[test]
    fn test_file_preset_section_applies() {
        let file = parse_monstera_toml("[presets.admin]\ntimeout_ms = 45000\n").unwrap();
        let resolved = layering()
            .with_file(file)
            .resolve(Preset::Admin, None, None, &ConfigOverrides::default())
            .unwrap();

        assert_eq!(resolved.config.timeout, Duration::from_secs(45));
        assert_eq!(resolved.config.header("X-Admin-Request"), Some("true"));
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let overrides = ConfigOverrides::new().base_url("https://files.example.com/upload/");
        let resolved = layering()
            .resolve(Preset::Upload, Some(&v("v9")), None, &overrides)
            .unwrap();
        assert_eq!(resolved.config.base_url, "https://files.example.com/upload");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let overrides = ConfigOverrides::new().host("not a host");
        let result = layering().resolve(Preset::Default, None, None, &overrides);
        assert!(matches!(result, Err(MonsteraError::ConfigValidation { .. })));
    }

    #[test]
    fn test_base_url_fallback_without_host() {
        let settings =
            ApiSettings::from_vars([("NEXT_PUBLIC_API_URL", "https://gateway.example.com/api/v1")])
                .unwrap();
        let url = build_base_url(&settings, None, None, None, None).unwrap();
        assert_eq!(url, "https://gateway.example.com/api/v1");

        let settings = ApiSettings {
            host: None,
            base_url: None,
            ..Default::default()
        };
        assert!(build_base_url(&settings, None, None, None, None).is_err());
    }

    #[test]
    fn test_url_for() {
        let config = ClientConfig::new("http://localhost:8080/api/v1/");
        assert_eq!(config.url_for("/weekly-reports"), "http://localhost:8080/api/v1/weekly-reports");
        assert_eq!(config.url_for("expenses/12"), "http://localhost:8080/api/v1/expenses/12");
        assert_eq!(config.url_for("https://other.example.com/x"), "https://other.example.com/x");
    }

    #[test]
    fn test_merge_files_prefers_project() {
        let global = parse_monstera_toml(
            "[api]\nhost = \"https://global.example.com\"\nversion = \"v1\"\n\n[presets.batch]\nmax_retries = 9\n",
        )
        .unwrap();
        let project = parse_monstera_toml("[api]\nversion = \"v2\"\n").unwrap();

        let merged = merge_files(Some(global), Some(project)).unwrap();
        assert_eq!(merged.api.host.as_deref(), Some("https://global.example.com"));
        assert_eq!(merged.api.version.as_ref().map(|v| v.as_str()), Some("v2"));
        assert!(merged.presets.contains_key("batch"));
    }

    #[tokio::test]
    async fn test_resolve_config_path_walks_up() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let nested = root.join("apps").join("admin");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "[api]\nversion = \"v2\"\n").unwrap();

        let loader = ConfigLoader::new(nested.clone());
        let path = loader.resolve_config_path(CONFIG_FILE_NAME).unwrap();
        assert_eq!(path, root.join(CONFIG_FILE_NAME));

        let (config, source) = loader.load_project_config().await.unwrap().unwrap();
        assert_eq!(config.api.version.map(|v| v.to_string()).as_deref(), Some("v2"));
        assert_eq!(source, ConfigSource::Project(root.join(CONFIG_FILE_NAME)));
    }

    #[tokio::test]
    async fn test_missing_project_config() {
        let temp = tempfile::tempdir().unwrap();
        let cwd = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let loader = ConfigLoader::new(cwd);
        // The temp directory has no monstera.toml above it unless the host has one at /
        if !Utf8PathBuf::from("/").join(CONFIG_FILE_NAME).exists() {
            assert!(loader.load_project_config().await.unwrap().is_none());
        }
    }
}
