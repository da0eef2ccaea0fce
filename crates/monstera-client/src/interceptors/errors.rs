use std::sync::Arc;

use monstera_core::ApiFailure;

use super::{Interceptor, InterceptorKind};
use crate::client::ApiRequest;
use crate::errors::ErrorHandler;

/// Forwards final failures to the shared [`ErrorHandler`]
pub struct ErrorNormalizingInterceptor {
    handler: Arc<ErrorHandler>,
}

impl ErrorNormalizingInterceptor {
    pub fn new(handler: Arc<ErrorHandler>) -> Self {
        Self { handler }
    }
}

impl Interceptor for ErrorNormalizingInterceptor {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::ErrorHandling
    }

    fn on_error(&self, request: &ApiRequest, failure: &mut ApiFailure) {
        if failure.url.is_none() {
            failure.url = Some(request.url.clone());
            failure.method = Some(request.method.to_string());
        }
        if !failure.handled && self.handler.handle(failure) {
            failure.handled = true;
        }
    }
}
