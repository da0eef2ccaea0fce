//! `NEXT_PUBLIC_*` environment settings and per-environment overrides

use std::collections::BTreeMap;
use std::time::Duration;

use monstera_core::{ApiVersion, Environment};
use tracing::warn;

use crate::presets::{timeouts, ConfigLayer};
use crate::toml::MonsteraToml;
use crate::ConfigResult;

pub const API_HOST_VAR: &str = "NEXT_PUBLIC_API_HOST";
pub const API_VERSION_VAR: &str = "NEXT_PUBLIC_API_VERSION";
pub const API_URL_VAR: &str = "NEXT_PUBLIC_API_URL";
pub const API_TIMEOUT_VAR: &str = "NEXT_PUBLIC_API_TIMEOUT";
pub const ENVIRONMENT_VAR: &str = "NEXT_PUBLIC_ENVIRONMENT";

const DEFAULT_HOST: &str = "http://localhost:8080";

/// Process-wide API settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Default API host; `None` only when a full `NEXT_PUBLIC_API_URL` is given instead
    pub host: Option<String>,
    pub version: ApiVersion,
    /// Fallback base URL used when no host is known
    pub base_url: Option<String>,
    /// Default request timeout
    pub timeout: Duration,
    /// Environment the process runs in
    pub environment: Option<Environment>,
    pub environment_hosts: BTreeMap<Environment, String>,
    /// `NEXT_PUBLIC_<NAME>_FEATURE` toggles, keyed by lowercase `<name>`
    pub features: BTreeMap<String, bool>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: Some(DEFAULT_HOST.to_string()),
            version: ApiVersion::default(),
            base_url: None,
            timeout: timeouts::DEFAULT,
            environment: None,
            environment_hosts: Environment::ALL
                .iter()
                .map(|env| (*env, env.default_host().to_string()))
                .collect(),
            features: BTreeMap::new(),
        }
    }
}

impl ApiSettings {
    /// Read settings from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Read settings from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        ApiSettings::default().apply_vars(vars)
    }

    /// Layer `NEXT_PUBLIC_*` variables over the current settings
    pub fn apply_vars<I, K, V>(mut self, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut host = None;
        let mut url_given = false;

        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            if value.is_empty() {
                continue;
            }

            match key {
                API_HOST_VAR => host = Some(value.trim_end_matches('/').to_string()),
                API_VERSION_VAR => self.version = value.parse()?,
                API_URL_VAR => {
                    self.base_url = Some(value.trim_end_matches('/').to_string());
                    url_given = true;
                }
                API_TIMEOUT_VAR => match value.parse::<u64>() {
                    Ok(ms) if ms > 0 => self.timeout = Duration::from_millis(ms),
                    _ => warn!(
                        variable = API_TIMEOUT_VAR,
                        value, "Ignoring invalid timeout, using the default"
                    ),
                },
                ENVIRONMENT_VAR => self.environment = Some(value.parse()?),
                key => {
                    if let Some(env) = Environment::ALL.iter().find(|e| e.host_variable() == key) {
                        self.environment_hosts
                            .insert(*env, value.trim_end_matches('/').to_string());
                    } else if let Some(name) = key
                        .strip_prefix("NEXT_PUBLIC_")
                        .and_then(|rest| rest.strip_suffix("_FEATURE"))
                    {
                        self.features.insert(name.to_ascii_lowercase(), parse_flag(value));
                    }
                }
            }
        }

        // A full URL without a host means "use the URL as-is"
        match host {
            Some(host) => self.host = Some(host),
            None if url_given => self.host = None,
            None => {}
        }

        Ok(self)
    }

    /// Layer the `[api]` and `[features]` sections of monstera.toml over the current settings
    pub fn apply_file(mut self, file: &MonsteraToml) -> Self {
        let api = &file.api;
        if let Some(host) = &api.host {
            self.host = Some(host.trim_end_matches('/').to_string());
        }
        if let Some(version) = &api.version {
            self.version = version.clone();
        }
        if let Some(base_url) = &api.base_url {
            self.base_url = Some(base_url.trim_end_matches('/').to_string());
            if api.host.is_none() {
                self.host = None;
            }
        }
        if let Some(environment) = api.environment {
            self.environment = Some(environment);
        }
        if let Some(ms) = api.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        for (name, enabled) in &file.features {
            self.features.insert(name.to_ascii_lowercase(), *enabled);
        }
        self
    }

    /// Host serving the given environment
    pub fn environment_host(&self, environment: Environment) -> &str {
        self.environment_hosts
            .get(&environment)
            .map(String::as_str)
            .unwrap_or_else(|| environment.default_host())
    }

    /// Whether `NEXT_PUBLIC_<NAME>_FEATURE` is switched on
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(false)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// Settings that differ per deployment environment
pub fn environment_override(environment: Environment) -> ConfigLayer {
    match environment {
        Environment::Development => ConfigLayer {
            enable_logging: Some(true),
            enable_profiling: Some(true),
            timeout: Some(timeouts::LONG),
            max_retries: Some(5),
            ..Default::default()
        },
        Environment::Staging => ConfigLayer {
            enable_logging: Some(false),
            enable_profiling: Some(false),
            timeout: Some(timeouts::DEFAULT),
            max_retries: Some(3),
            ..Default::default()
        },
        Environment::Production => ConfigLayer {
            enable_logging: Some(false),
            enable_profiling: Some(false),
            timeout: Some(timeouts::DEFAULT),
            max_retries: Some(2),
            compression: Some(true),
            ..Default::default()
        },
    }
}
