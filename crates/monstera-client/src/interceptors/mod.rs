//! Request/response interceptors and the per-client chain

mod auth;
mod case;
mod errors;
mod logging;
mod retry;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use monstera_config::ResolvedConfig;
use monstera_core::error::MonsteraResult;
use monstera_core::ApiFailure;
use parking_lot::RwLock;
use serde::Serialize;

use crate::auth::AuthStore;
use crate::client::{ApiRequest, ApiResponse};
use crate::errors::ErrorHandler;

pub use auth::AuthInterceptor;
pub use case::CaseConversionInterceptor;
pub use errors::ErrorNormalizingInterceptor;
pub use logging::LoggingInterceptor;
pub use retry::{RetryInterceptor, RETRYABLE_STATUSES};

/// Identifies an interceptor; a chain holds at most one of each kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptorKind {
    Logging,
    Auth,
    CaseConversion,
    Retry,
    ErrorHandling,
    Custom(String),
}

impl fmt::Display for InterceptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptorKind::Logging => f.write_str("logging"),
            InterceptorKind::Auth => f.write_str("auth"),
            InterceptorKind::CaseConversion => f.write_str("case_conversion"),
            InterceptorKind::Retry => f.write_str("retry"),
            InterceptorKind::ErrorHandling => f.write_str("error_handling"),
            InterceptorKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Hooks run around every request a client sends.
///
/// All hooks are synchronous; `retry_after` only decides the delay and the
/// client does the waiting.
pub trait Interceptor: Send + Sync {
    fn kind(&self) -> InterceptorKind;

    /// Runs once before the first attempt
    fn on_request(&self, _request: &mut ApiRequest) -> MonsteraResult<()> {
        Ok(())
    }

    fn on_response(&self, _request: &ApiRequest, _response: &mut ApiResponse) {}

    /// Runs once on the final failure, after retries are exhausted
    fn on_error(&self, _request: &ApiRequest, _failure: &mut ApiFailure) {}

    /// Delay before attempt `attempt + 1`, or `None` to give up
    fn retry_after(&self, _request: &ApiRequest, _failure: &ApiFailure, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Ordered, de-duplicated list of interceptors
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: RwLock<Vec<Arc<dyn Interceptor>>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain for a resolved configuration, in the order logging, auth, case
    /// conversion, retry, error handling
    pub fn standard(
        resolved: &ResolvedConfig,
        auth: Arc<dyn AuthStore>,
        errors: Arc<ErrorHandler>,
    ) -> Self {
        let options = &resolved.options;
        let chain = Self::new();

        if options.enable_logging {
            let mut logging = LoggingInterceptor::new();
            if options.enable_profiling {
                logging = logging.with_slow_threshold(Duration::from_secs(1));
            }
            chain.register(Arc::new(logging));
        }
        if options.enable_auth {
            chain.register(Arc::new(AuthInterceptor::new(
                auth,
                resolved.config.with_credentials,
            )));
        }
        if options.enable_case_conversion {
            chain.register(Arc::new(CaseConversionInterceptor));
        }
        if options.enable_retry {
            chain.register(Arc::new(RetryInterceptor::new(
                options.max_retries,
                options.retry_delay,
            )));
        }
        if options.enable_error_handling {
            chain.register(Arc::new(ErrorNormalizingInterceptor::new(errors)));
        }

        chain
    }

    /// Append an interceptor. Returns `false` when one of the same kind is already registered.
    pub fn register(&self, interceptor: Arc<dyn Interceptor>) -> bool {
        let mut interceptors = self.interceptors.write();
        let kind = interceptor.kind();
        if interceptors.iter().any(|existing| existing.kind() == kind) {
            return false;
        }
        interceptors.push(interceptor);
        true
    }

    /// Remove the interceptor of `kind`, if registered
    pub fn remove(&self, kind: &InterceptorKind) -> bool {
        let mut interceptors = self.interceptors.write();
        let before = interceptors.len();
        interceptors.retain(|existing| existing.kind() != *kind);
        interceptors.len() != before
    }

    pub fn remove_all(&self) {
        self.interceptors.write().clear();
    }

    /// Registered kinds, in execution order
    pub fn kinds(&self) -> Vec<InterceptorKind> {
        self.interceptors.read().iter().map(|i| i.kind()).collect()
    }

    pub fn contains(&self, kind: &InterceptorKind) -> bool {
        self.interceptors.read().iter().any(|i| i.kind() == *kind)
    }

    pub fn len(&self) -> usize {
        self.interceptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.read().is_empty()
    }

    // Hooks run on a snapshot so interceptors may touch the chain
    fn snapshot(&self) -> Vec<Arc<dyn Interceptor>> {
        self.interceptors.read().clone()
    }

    pub fn on_request(&self, request: &mut ApiRequest) -> MonsteraResult<()> {
        for interceptor in self.snapshot() {
            interceptor.on_request(request)?;
        }
        Ok(())
    }

    pub fn on_response(&self, request: &ApiRequest, response: &mut ApiResponse) {
        for interceptor in self.snapshot() {
            interceptor.on_response(request, response);
        }
    }

    pub fn on_error(&self, request: &ApiRequest, failure: &mut ApiFailure) {
        for interceptor in self.snapshot() {
            interceptor.on_error(request, failure);
        }
    }

    /// First delay offered by any interceptor
    pub fn retry_after(&self, request: &ApiRequest, failure: &ApiFailure, attempt: u32) -> Option<Duration> {
        self.snapshot()
            .iter()
            .find_map(|interceptor| interceptor.retry_after(request, failure, attempt))
    }
}

#[cfg(test)]
mod tests;
