//! Repeated GETs until a condition holds

use std::sync::Arc;
use std::time::Duration;

use monstera_core::error::MonsteraError;
use monstera_core::ApiFailure;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest, ApiResponse};
use crate::ClientResult;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Polls an endpoint, e.g. an export job's status
#[derive(Debug, Clone)]
pub struct Poller {
    client: Arc<ApiClient>,
    interval: Duration,
    max_attempts: u32,
}

impl Poller {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// GET `path` every interval until `done` accepts a response.
    ///
    /// Fails with a `Timeout` failure after `max_attempts` responses were
    /// rejected and with an `Abort` failure once `cancel` fires. Request
    /// failures end polling immediately.
    pub async fn poll_until<F>(
        &self,
        path: &str,
        cancel: &CancellationToken,
        mut done: F,
    ) -> ClientResult<ApiResponse>
    where
        F: FnMut(&ApiResponse) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(aborted(path));
            }

            let response = self
                .client
                .send_with_cancel(ApiRequest::get(path), cancel)
                .await?;
            if done(&response) {
                debug!(path, attempt, "Polling finished");
                return Ok(response);
            }

            if attempt < self.max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(aborted(path)),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }

        Err(MonsteraError::Api(
            ApiFailure::timeout(format!(
                "Polling gave up after {} attempts",
                self.max_attempts
            ))
            .with_request("GET", self.client.config().url_for(path)),
        ))
    }
}

fn aborted(path: &str) -> MonsteraError {
    let mut failure = ApiFailure::aborted();
    failure.url = Some(path.to_string());
    MonsteraError::Api(failure)
}
