use std::time::Duration;

use monstera_core::{ApiFailure, ErrorKind};

use super::{Interceptor, InterceptorKind};
use crate::client::ApiRequest;

/// Statuses worth another attempt
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Exponential backoff for idempotent requests
#[derive(Debug, Clone)]
pub struct RetryInterceptor {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryInterceptor {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// `base_delay * 2^(attempt - 1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    pub fn should_retry(failure: &ApiFailure) -> bool {
        matches!(failure.kind, ErrorKind::NetworkError | ErrorKind::Timeout)
            || RETRYABLE_STATUSES.contains(&failure.status)
    }
}

impl Interceptor for RetryInterceptor {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Retry
    }

    fn retry_after(&self, request: &ApiRequest, failure: &ApiFailure, attempt: u32) -> Option<Duration> {
        if attempt > self.max_retries || !request.is_idempotent() || !Self::should_retry(failure) {
            return None;
        }
        Some(self.delay_for(attempt))
    }
}
