//! Session token storage consulted by the auth interceptor

use std::fmt;

use monstera_core::error::MonsteraResult;
use monstera_core::utils::token::validate_jwt_shape;
use monstera_core::utils::SessionCookies;
use parking_lot::RwLock;
use tracing::debug;

/// Source of the current session's tokens.
///
/// Implementations must be cheap to query; the auth interceptor reads the
/// token on every request.
pub trait AuthStore: Send + Sync + fmt::Debug {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

/// In-memory token store shared between clients
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    session: RwLock<SessionCookies>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a `Cookie` header; malformed tokens are ignored
    pub fn from_cookie_header(header: &str) -> Self {
        Self {
            session: RwLock::new(SessionCookies::parse(header)),
        }
    }

    pub fn set_access_token(&self, token: &str) -> MonsteraResult<()> {
        validate_jwt_shape(token)?;
        self.session.write().access_token = Some(token.to_string());
        debug!("Stored access token");
        Ok(())
    }

    pub fn set_refresh_token(&self, token: &str) -> MonsteraResult<()> {
        validate_jwt_shape(token)?;
        self.session.write().refresh_token = Some(token.to_string());
        Ok(())
    }

    /// Replace both tokens at once
    pub fn set_session(&self, session: SessionCookies) {
        *self.session.write() = session;
    }

    pub fn session(&self) -> SessionCookies {
        self.session.read().clone()
    }

    /// Forget both tokens (logout)
    pub fn clear(&self) {
        *self.session.write() = SessionCookies::default();
        debug!("Cleared session tokens");
    }
}

impl AuthStore for MemoryAuthStore {
    fn access_token(&self) -> Option<String> {
        self.session.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.session.read().refresh_token.clone()
    }
}
