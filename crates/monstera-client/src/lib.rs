//! Preset-driven HTTP clients for the Monstera API
//!
//! This crate builds [`ApiClient`]s from resolved presets, attaches the
//! interceptor chain (logging, auth, case conversion, retry, error
//! normalization) and memoizes clients per `(preset, version, environment)`
//! in an explicit [`ClientCache`] owned by the [`ApiClientFactory`].

pub mod auth;
pub mod cache;
pub mod client;
pub mod errors;
pub mod factory;
pub mod interceptors;
pub mod polling;

// Re-export main types
pub use auth::{AuthStore, MemoryAuthStore};
pub use cache::{CacheEntry, CacheEntrySnapshot, CacheKey, CacheStats, ClientCache};
pub use client::{ApiClient, ApiRequest, ApiResponse};
pub use errors::{ErrorHandler, ErrorStats, ListenerId};
pub use factory::{ApiClientFactory, ClientRequest, DebugInfo, InterceptorStatus};
pub use interceptors::{Interceptor, InterceptorChain, InterceptorKind};
pub use polling::Poller;

use monstera_core::error::MonsteraError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, MonsteraError>;
