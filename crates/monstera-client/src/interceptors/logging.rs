use std::time::Duration;

use monstera_core::ApiFailure;
use tracing::{debug, warn};

use super::{Interceptor, InterceptorKind};
use crate::client::{ApiRequest, ApiResponse};

/// Emits a debug event per request and response
#[derive(Debug, Default)]
pub struct LoggingInterceptor {
    /// Warn about responses slower than this
    slow_threshold: Option<Duration>,
}

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }
}

impl Interceptor for LoggingInterceptor {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Logging
    }

    fn on_request(&self, request: &mut ApiRequest) -> monstera_core::MonsteraResult<()> {
        debug!(method = %request.method, url = %request.url, "API request");
        Ok(())
    }

    fn on_response(&self, request: &ApiRequest, response: &mut ApiResponse) {
        let elapsed_ms = response.elapsed.as_millis() as u64;
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            elapsed_ms,
            "API response"
        );

        if let Some(threshold) = self.slow_threshold {
            if response.elapsed > threshold {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    elapsed_ms,
                    threshold_ms = threshold.as_millis() as u64,
                    "Slow API response"
                );
            }
        }
    }

    fn on_error(&self, request: &ApiRequest, failure: &mut ApiFailure) {
        debug!(
            method = %request.method,
            url = %request.url,
            status = failure.status,
            kind = %failure.kind,
            "API request failed"
        );
    }
}
