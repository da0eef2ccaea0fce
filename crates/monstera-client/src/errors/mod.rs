//! Central handling for failed API calls: logging, frequency tracking and listeners

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use monstera_core::{ApiFailure, ErrorKind, ErrorSeverity};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Window in which repeated failures are counted
pub const FREQUENCY_WINDOW: Duration = Duration::from_secs(5 * 60);
/// Repeats within the window that trigger a warning
pub const FREQUENCY_THRESHOLD: usize = 5;
const RECENT_CAPACITY: usize = 50;
const RECENT_REPORTED: usize = 10;

pub type ErrorListener = Arc<dyn Fn(&ApiFailure) + Send + Sync>;

/// Handle returned by [`ErrorHandler::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Snapshot of handled failures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorStats {
    pub total_errors: u64,
    pub errors_by_code: BTreeMap<String, u64>,
    /// Most recent failures, newest last
    pub recent_errors: Vec<ApiFailure>,
}

pub struct ErrorHandler {
    listeners: RwLock<Vec<(ListenerId, ErrorListener)>>,
    next_listener: AtomicU64,
    frequency: Mutex<HashMap<String, VecDeque<Instant>>>,
    window: Duration,
    threshold: usize,
    total: AtomicU64,
    by_code: Mutex<BTreeMap<String, u64>>,
    recent: Mutex<VecDeque<ApiFailure>>,
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("listeners", &self.listeners.read().len())
            .field("window", &self.window)
            .field("threshold", &self.threshold)
            .field("total", &self.total.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self::with_window(FREQUENCY_WINDOW, FREQUENCY_THRESHOLD)
    }

    pub fn with_window(window: Duration, threshold: usize) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            frequency: Mutex::new(HashMap::new()),
            window,
            threshold,
            total: AtomicU64::new(0),
            by_code: Mutex::new(BTreeMap::new()),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)),
        }
    }

    /// Process a failure. Returns `false` when it was swallowed (cancelled requests).
    pub fn handle(&self, failure: &ApiFailure) -> bool {
        if failure.kind == ErrorKind::Abort {
            debug!(url = ?failure.url, "Request cancelled");
            return false;
        }

        self.log(failure);
        self.track_frequency(failure);
        self.record(failure);

        let listeners: Vec<ErrorListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(failure);
        }

        true
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ApiFailure) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Failures with `key` (`code:status`) seen within the window
    pub fn frequency(&self, key: &str) -> usize {
        let mut frequency = self.frequency.lock();
        match frequency.get_mut(key) {
            Some(seen) => {
                prune(seen, self.window, Instant::now());
                seen.len()
            }
            None => 0,
        }
    }

    pub fn stats(&self) -> ErrorStats {
        let recent = self.recent.lock();
        ErrorStats {
            total_errors: self.total.load(Ordering::Relaxed),
            errors_by_code: self.by_code.lock().clone(),
            recent_errors: recent
                .iter()
                .skip(recent.len().saturating_sub(RECENT_REPORTED))
                .cloned()
                .collect(),
        }
    }

    pub fn clear_stats(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.by_code.lock().clear();
        self.recent.lock().clear();
        self.frequency.lock().clear();
    }

    fn log(&self, failure: &ApiFailure) {
        let url = failure.url.as_deref().unwrap_or("-");
        let method = failure.method.as_deref().unwrap_or("-");
        match failure.severity() {
            ErrorSeverity::Critical => error!(
                code = %failure.code,
                status = failure.status,
                method,
                url,
                "Critical API failure: {}",
                failure.message
            ),
            ErrorSeverity::Error => error!(
                code = %failure.code,
                status = failure.status,
                method,
                url,
                "API failure: {}",
                failure.message
            ),
            ErrorSeverity::Warning => warn!(
                code = %failure.code,
                status = failure.status,
                method,
                url,
                "API request rejected: {}",
                failure.message
            ),
            ErrorSeverity::Info => info!(
                code = %failure.code,
                status = failure.status,
                method,
                url,
                "API request failed: {}",
                failure.message
            ),
        }
    }

    fn track_frequency(&self, failure: &ApiFailure) {
        let key = failure.frequency_key();
        let now = Instant::now();
        let count = {
            let mut frequency = self.frequency.lock();
            let seen = frequency.entry(key.clone()).or_default();
            prune(seen, self.window, now);
            seen.push_back(now);
            seen.len()
        };

        if count >= self.threshold {
            warn!(
                key = %key,
                count,
                window_secs = self.window.as_secs(),
                "Repeated API failure"
            );
        }
    }

    fn record(&self, failure: &ApiFailure) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.by_code.lock().entry(failure.code.clone()).or_insert(0) += 1;

        let mut recent = self.recent.lock();
        if recent.len() == RECENT_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(failure.clone());
    }
}

fn prune(seen: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    while let Some(first) = seen.front() {
        if now.duration_since(*first) > window {
            seen.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_abort_is_swallowed() {
        let handler = ErrorHandler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        handler.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!handler.handle(&ApiFailure::aborted()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(handler.stats().total_errors, 0);
    }

    #[test]
    fn test_listeners_receive_failures() {
        let handler = ErrorHandler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = handler.subscribe(move |failure| {
            assert_eq!(failure.kind, ErrorKind::NotFound);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handler.handle(&ApiFailure::from_status(404, None)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(handler.unsubscribe(id));
        assert!(!handler.unsubscribe(id));
        handler.handle(&ApiFailure::from_status(404, None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stats_by_code() {
        let handler = ErrorHandler::new();
        handler.handle(&ApiFailure::from_status(500, None));
        handler.handle(&ApiFailure::from_status(500, None));
        handler.handle(&ApiFailure::network("connection refused"));

        let stats = handler.stats();
        assert_eq!(stats.total_errors, 3);
        assert_eq!(stats.errors_by_code.get("INTERNAL_SERVER_ERROR"), Some(&2));
        assert_eq!(stats.errors_by_code.get("NETWORK_ERROR"), Some(&1));
        assert_eq!(stats.recent_errors.len(), 3);
        assert_eq!(stats.recent_errors[2].kind, ErrorKind::NetworkError);

        handler.clear_stats();
        assert_eq!(handler.stats(), ErrorStats::default());
    }

    #[test]
    fn test_recent_errors_are_capped() {
        let handler = ErrorHandler::new();
        for _ in 0..(RECENT_CAPACITY + 5) {
            handler.handle(&ApiFailure::from_status(409, None));
        }
        let stats = handler.stats();
        assert_eq!(stats.total_errors, (RECENT_CAPACITY + 5) as u64);
        assert_eq!(stats.recent_errors.len(), RECENT_REPORTED);
    }

    #[test]
    fn test_frequency_window() {
        let handler = ErrorHandler::with_window(Duration::from_millis(50), 3);
        let failure = ApiFailure::from_status(503, None);
        for _ in 0..3 {
            handler.handle(&failure);
        }
        assert_eq!(handler.frequency(&failure.frequency_key()), 3);

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(handler.frequency(&failure.frequency_key()), 0);
        assert_eq!(handler.frequency("UNKNOWN:0"), 0);
    }
}
