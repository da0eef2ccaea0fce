use std::sync::Arc;

use monstera_core::error::MonsteraResult;
use monstera_core::utils::token::ACCESS_TOKEN_COOKIE;
use monstera_core::{ApiFailure, ErrorKind};
use tracing::warn;

use super::{Interceptor, InterceptorKind};
use crate::auth::AuthStore;
use crate::client::ApiRequest;

/// Adds the session's access token to outgoing requests
pub struct AuthInterceptor {
    store: Arc<dyn AuthStore>,
    with_credentials: bool,
}

impl AuthInterceptor {
    pub fn new(store: Arc<dyn AuthStore>, with_credentials: bool) -> Self {
        Self {
            store,
            with_credentials,
        }
    }
}

impl Interceptor for AuthInterceptor {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::Auth
    }

    fn on_request(&self, request: &mut ApiRequest) -> MonsteraResult<()> {
        // A fixed bearer token (authenticated clients) wins over the store
        let token = match bearer_token(request) {
            Some(token) => token,
            None => match self.store.access_token() {
                Some(token) => {
                    request.set_header("Authorization", &format!("Bearer {}", token));
                    token
                }
                None => return Ok(()),
            },
        };

        if self.with_credentials {
            let session = format!("{}={}", ACCESS_TOKEN_COOKIE, token);
            let cookie = match request.header_value("Cookie") {
                Some(existing) if existing.contains(&format!("{}=", ACCESS_TOKEN_COOKIE)) => {
                    existing.to_string()
                }
                Some(existing) => format!("{}; {}", existing, session),
                None => session,
            };
            request.set_header("Cookie", &cookie);
        }

        Ok(())
    }

    fn on_error(&self, request: &ApiRequest, failure: &mut ApiFailure) {
        if failure.kind == ErrorKind::Unauthorized {
            warn!(
                method = %request.method,
                url = %request.url,
                "Request was rejected as unauthenticated; the session may have expired"
            );
        }
    }
}

fn bearer_token(request: &ApiRequest) -> Option<String> {
    request
        .header_value("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
