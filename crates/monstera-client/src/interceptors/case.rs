use monstera_core::error::MonsteraResult;
use monstera_core::utils::{keys_to_camel, keys_to_snake};

use super::{Interceptor, InterceptorKind};
use crate::client::{ApiRequest, ApiResponse};

/// Request bodies go out in snake_case, response bodies come back in camelCase
pub struct CaseConversionInterceptor;

impl Interceptor for CaseConversionInterceptor {
    fn kind(&self) -> InterceptorKind {
        InterceptorKind::CaseConversion
    }

    fn on_request(&self, request: &mut ApiRequest) -> MonsteraResult<()> {
        if let Some(body) = request.body.take() {
            request.body = Some(keys_to_snake(body));
        }
        Ok(())
    }

    fn on_response(&self, _request: &ApiRequest, response: &mut ApiResponse) {
        let body = std::mem::take(&mut response.body);
        response.body = keys_to_camel(body);
    }
}
