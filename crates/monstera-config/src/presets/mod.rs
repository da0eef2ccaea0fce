//! Static preset table and the partial configuration layer type

use std::collections::BTreeMap;
use std::time::Duration;

use monstera_core::Preset;

use crate::merge::{ClientConfig, ClientOptions};

/// Standard request timeouts
pub mod timeouts {
    use std::time::Duration;

    pub const DEFAULT: Duration = Duration::from_secs(30);
    pub const SHORT: Duration = Duration::from_secs(5);
    pub const LONG: Duration = Duration::from_secs(60);
    pub const UPLOAD: Duration = Duration::from_secs(120);
    pub const BATCH: Duration = Duration::from_secs(300);
}

/// A partial configuration. Unset fields leave lower layers untouched;
/// headers are merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigLayer {
    pub timeout: Option<Duration>,
    pub with_credentials: Option<bool>,
    pub headers: BTreeMap<String, String>,
    pub enable_auth: Option<bool>,
    pub enable_retry: Option<bool>,
    pub enable_logging: Option<bool>,
    pub enable_error_handling: Option<bool>,
    pub enable_case_conversion: Option<bool>,
    pub enable_profiling: Option<bool>,
    pub compression: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
}

impl ConfigLayer {
    /// Write every set field onto `config` and `options`
    pub fn apply_to(&self, config: &mut ClientConfig, options: &mut ClientOptions) {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(with_credentials) = self.with_credentials {
            config.with_credentials = with_credentials;
        }
        for (name, value) in &self.headers {
            config.set_header(name, value);
        }

        let flags = [
            (self.enable_auth, &mut options.enable_auth),
            (self.enable_retry, &mut options.enable_retry),
            (self.enable_logging, &mut options.enable_logging),
            (self.enable_error_handling, &mut options.enable_error_handling),
            (self.enable_case_conversion, &mut options.enable_case_conversion),
            (self.enable_profiling, &mut options.enable_profiling),
            (self.compression, &mut options.compression),
        ];
        for (value, slot) in flags {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(max_retries) = self.max_retries {
            options.max_retries = max_retries;
        }
        if let Some(retry_delay) = self.retry_delay {
            options.retry_delay = retry_delay;
        }
    }

    /// Combine two layers, `other` taking precedence
    pub fn merged_with(mut self, other: &ConfigLayer) -> ConfigLayer {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if other.$field.is_some() { self.$field = other.$field; } )*
            };
        }
        take!(
            timeout,
            with_credentials,
            enable_auth,
            enable_retry,
            enable_logging,
            enable_error_handling,
            enable_case_conversion,
            enable_profiling,
            compression,
            max_retries,
            retry_delay
        );
        for (name, value) in &other.headers {
            self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigLayer::default()
    }
}

/// The built-in layer for a preset
pub fn preset_layer(preset: Preset) -> ConfigLayer {
    match preset {
        Preset::Default => ConfigLayer {
            enable_auth: Some(true),
            enable_retry: Some(true),
            enable_error_handling: Some(true),
            with_credentials: Some(true),
            ..Default::default()
        },
        Preset::Auth => ConfigLayer {
            enable_auth: Some(true),
            enable_error_handling: Some(true),
            with_credentials: Some(true),
            timeout: Some(timeouts::DEFAULT),
            ..Default::default()
        },
        Preset::Admin => ConfigLayer {
            enable_auth: Some(true),
            enable_logging: Some(true),
            enable_error_handling: Some(true),
            with_credentials: Some(true),
            ..Default::default()
        }
        .with_header("X-Admin-Request", "true"),
        Preset::Public => ConfigLayer {
            enable_auth: Some(false),
            enable_retry: Some(true),
            enable_error_handling: Some(true),
            with_credentials: Some(false),
            timeout: Some(timeouts::SHORT),
            ..Default::default()
        },
        Preset::Upload => ConfigLayer {
            enable_auth: Some(true),
            enable_retry: Some(false),
            enable_error_handling: Some(true),
            with_credentials: Some(true),
            timeout: Some(timeouts::UPLOAD),
            ..Default::default()
        }
        .with_header("Content-Type", "multipart/form-data"),
        Preset::Batch => ConfigLayer {
            enable_auth: Some(true),
            enable_retry: Some(true),
            enable_error_handling: Some(true),
            with_credentials: Some(true),
            timeout: Some(timeouts::BATCH),
            max_retries: Some(5),
            retry_delay: Some(Duration::from_secs(2)),
            ..Default::default()
        },
        Preset::Realtime => ConfigLayer {
            enable_auth: Some(true),
            enable_retry: Some(false),
            enable_error_handling: Some(true),
            with_credentials: Some(true),
            timeout: Some(timeouts::SHORT),
            ..Default::default()
        },
    }
}
