//! Client factory: resolves presets, attaches interceptors and memoizes clients

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use monstera_config::{ApiSettings, ConfigLayering, ConfigLoader, ConfigOverrides};
use monstera_core::{ApiVersion, Environment, Preset};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::{AuthStore, MemoryAuthStore};
use crate::cache::{CacheEntrySnapshot, CacheKey, CacheStats, ClientCache};
use crate::client::ApiClient;
use crate::errors::{ErrorHandler, ErrorStats};
use crate::interceptors::{InterceptorChain, InterceptorKind};
use crate::ClientResult;

/// How often development builds sweep the cache, and the age they evict at
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const CLEANUP_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Everything that identifies a client request to the factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequest {
    pub preset: Preset,
    pub version: Option<ApiVersion>,
    pub environment: Option<Environment>,
    pub overrides: ConfigOverrides,
    /// Fixed bearer token, sent instead of the auth store's token
    pub auth_token: Option<String>,
    /// Extra cache discriminator
    pub scope: Option<String>,
    pub use_cache: bool,
}

impl ClientRequest {
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            version: None,
            environment: None,
            overrides: ConfigOverrides::default(),
            auth_token: None,
            scope: None,
            use_cache: true,
        }
    }

    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn uncached(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Cache key for this request.
    ///
    /// Tokens and call-site overrides are folded into the scope as hashes, so
    /// differently configured clients never share an entry.
    pub fn cache_key(&self) -> CacheKey {
        let mut parts: Vec<String> = Vec::new();
        match (&self.scope, &self.auth_token) {
            (Some(scope), _) => parts.push(scope.clone()),
            (None, Some(token)) => parts.push(format!("session-{:016x}", hash_of(token))),
            (None, None) => {}
        }
        if !self.overrides.is_empty() {
            parts.push(format!("overrides-{:016x}", hash_of(&self.overrides)));
        }

        CacheKey {
            preset: self.preset,
            version: self.version.as_ref().map(ToString::to_string),
            environment: self.environment,
            scope: (!parts.is_empty()).then(|| parts.join("+")),
        }
    }
}

// Keeps raw tokens and header values out of cache keys and debug output
fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Interceptors attached to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterceptorStatus {
    pub kinds: Vec<InterceptorKind>,
    pub count: usize,
}

/// Factory state for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    pub cache_stats: CacheStats,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub default_client_exists: bool,
    pub entries: Vec<CacheEntrySnapshot>,
    pub error_stats: ErrorStats,
}

/// Builds and memoizes [`ApiClient`]s.
///
/// The cache, auth store and error handler are owned by the factory and shared
/// with the clients it creates. Construct one factory per application.
#[derive(Debug)]
pub struct ApiClientFactory {
    layering: ConfigLayering,
    cache: Arc<ClientCache>,
    auth: Arc<dyn AuthStore>,
    errors: Arc<ErrorHandler>,
    shutdown: CancellationToken,
}

impl Default for ApiClientFactory {
    fn default() -> Self {
        Self::new(ConfigLayering::default())
    }
}

impl Drop for ApiClientFactory {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl ApiClientFactory {
    pub fn new(layering: ConfigLayering) -> Self {
        Self {
            layering,
            cache: Arc::new(ClientCache::new()),
            auth: Arc::new(MemoryAuthStore::new()),
            errors: Arc::new(ErrorHandler::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Factory configured from `NEXT_PUBLIC_*` variables only
    pub fn from_env() -> ClientResult<Self> {
        Ok(Self::new(ConfigLayering::new(ApiSettings::from_env()?)))
    }

    /// Factory configured from config files and the process environment
    pub async fn load(loader: &ConfigLoader) -> ClientResult<Self> {
        Ok(Self::new(loader.load_layering().await?))
    }

    pub fn with_auth_store(mut self, auth: Arc<dyn AuthStore>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_error_handler(mut self, errors: Arc<ErrorHandler>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ClientCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn layering(&self) -> &ConfigLayering {
        &self.layering
    }

    pub fn auth_store(&self) -> &Arc<dyn AuthStore> {
        &self.auth
    }

    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.errors
    }

    pub fn cache(&self) -> &Arc<ClientCache> {
        &self.cache
    }

    /// Cached client for a preset
    pub fn client(&self, preset: Preset) -> ClientResult<Arc<ApiClient>> {
        self.client_with(ClientRequest::new(preset))
    }

    pub fn client_with(&self, request: ClientRequest) -> ClientResult<Arc<ApiClient>> {
        if !request.use_cache {
            return self.build(&request);
        }

        let key = request.cache_key().to_string();
        self.cache.get_or_try_insert_with(&key, || {
            debug!(key = %key, "Building API client");
            self.build(&request)
        })
    }

    /// Cached client for a preset name; unknown names fall back to `default`
    pub fn client_for_name(&self, name: &str) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::parse_or_default(name))
    }

    /// Like [`ApiClientFactory::client_for_name`], rejecting unknown names
    pub fn try_client_for_name(&self, name: &str) -> ClientResult<Arc<ApiClient>> {
        self.client(name.parse()?)
    }

    pub fn default_client(&self) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::Default)
    }

    /// Auth-preset client; with a token, one client per token sending it as the bearer token
    pub fn authenticated_client(&self, token: Option<&str>) -> ClientResult<Arc<ApiClient>> {
        let mut request = ClientRequest::new(Preset::Auth);
        if let Some(token) = token {
            request = request.auth_token(token);
        }
        self.client_with(request)
    }

    pub fn admin_client(&self) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::Admin)
    }

    pub fn public_client(&self) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::Public)
    }

    pub fn upload_client(&self) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::Upload)
    }

    pub fn batch_client(&self) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::Batch)
    }

    pub fn realtime_client(&self) -> ClientResult<Arc<ApiClient>> {
        self.client(Preset::Realtime)
    }

    /// Default-preset client for an API version such as `v2`
    pub fn versioned_client(&self, version: &str) -> ClientResult<Arc<ApiClient>> {
        self.client_with(ClientRequest::new(Preset::Default).version(version.parse()?))
    }

    /// Default-preset client for a deployment environment
    pub fn environment_client(&self, environment: Environment) -> ClientResult<Arc<ApiClient>> {
        self.client_with(ClientRequest::new(Preset::Default).environment(environment))
    }

    /// A fresh default-preset client with call-site overrides; never cached
    pub fn custom_client(&self, overrides: ConfigOverrides) -> ClientResult<Arc<ApiClient>> {
        self.client_with(ClientRequest::new(Preset::Default).overrides(overrides).uncached())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn remove_from_cache(&self, key: &str) -> bool {
        let removed = self.cache.remove(key);
        if removed {
            debug!(key = %key, "Removed API client from cache");
        }
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_client(&self, key: &str) -> Option<Arc<ApiClient>> {
        self.cache.get(key)
    }

    pub fn cache_entries(&self) -> Vec<CacheEntrySnapshot> {
        self.cache.entries()
    }

    pub fn interceptor_status(&self, client: &ApiClient) -> InterceptorStatus {
        let kinds = client.interceptors().kinds();
        InterceptorStatus {
            count: kinds.len(),
            kinds,
        }
    }

    pub fn debug_info(&self) -> DebugInfo {
        let default_key = CacheKey::new(Preset::Default).to_string();
        DebugInfo {
            cache_stats: self.cache.stats(),
            cache_size: self.cache.len(),
            cache_capacity: self.cache.capacity(),
            default_client_exists: self.cache.contains(&default_key),
            entries: self.cache.entries(),
            error_stats: self.errors.stats(),
        }
    }

    /// Periodically evict old clients until the factory is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_cache_cleanup(&self, interval: Duration, max_age: Duration) -> JoinHandle<()> {
        self.cache
            .spawn_cleanup(interval, max_age, self.shutdown.child_token())
    }

    /// Start the default cleanup sweep when running in development.
    ///
    /// Returns `None` outside development or outside a tokio runtime.
    pub fn start_development_cleanup(&self) -> Option<JoinHandle<()>> {
        if self.layering.settings().environment != Some(Environment::Development) {
            return None;
        }
        tokio::runtime::Handle::try_current().ok()?;
        debug!(
            interval_secs = CLEANUP_INTERVAL.as_secs(),
            max_age_secs = CLEANUP_MAX_AGE.as_secs(),
            "Starting client cache cleanup"
        );
        Some(self.spawn_cache_cleanup(CLEANUP_INTERVAL, CLEANUP_MAX_AGE))
    }

    fn build(&self, request: &ClientRequest) -> ClientResult<Arc<ApiClient>> {
        let mut resolved = self.layering.resolve(
            request.preset,
            request.version.as_ref(),
            request.environment,
            &request.overrides,
        )?;
        if let Some(token) = &request.auth_token {
            resolved
                .config
                .set_header("Authorization", &format!("Bearer {}", token));
        }

        let chain = InterceptorChain::standard(&resolved, Arc::clone(&self.auth), Arc::clone(&self.errors));
        Ok(Arc::new(ApiClient::new(resolved, chain)?))
    }
}
