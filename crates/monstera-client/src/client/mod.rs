//! HTTP client bound to one resolved configuration

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use monstera_config::{ClientConfig, ClientOptions, ResolvedConfig};
use monstera_core::error::MonsteraError;
use monstera_core::{ApiFailure, ErrorKind, Preset};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::interceptors::InterceptorChain;
use crate::ClientResult;

const USER_AGENT: &str = concat!("monstera-client/", env!("CARGO_PKG_VERSION"));

/// An outgoing request, as seen by interceptors
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the client's base URL, or an absolute URL
    pub path: String,
    /// Absolute URL, filled in by the client before interceptors run
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            url: String::new(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| MonsteraError::decode(format!("Failed to encode request body: {}", e), e))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Insert a header, replacing any existing header with the same name in any case
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// GET, HEAD and OPTIONS may be repeated safely
    pub fn is_idempotent(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

/// A successful response with its decoded body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON body; `Null` when empty, a string when the body is not JSON
    pub body: Value,
    pub elapsed: Duration,
}

impl ApiResponse {
    /// Deserialize the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| MonsteraError::decode(format!("Failed to decode response body: {}", e), e))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP client with connection pooling and an interceptor chain
#[derive(Debug)]
pub struct ApiClient {
    /// Underlying HTTP client with connection pooling
    http: Client,
    resolved: ResolvedConfig,
    interceptors: InterceptorChain,
}

impl ApiClient {
    /// Build a client for a resolved configuration
    pub fn new(resolved: ResolvedConfig, interceptors: InterceptorChain) -> ClientResult<Self> {
        let http = ClientBuilder::new()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(resolved.config.timeout)
            .gzip(resolved.options.compression)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MonsteraError::network(format!("Failed to create HTTP client: {}", e), e))?;

        debug!(
            preset = %resolved.preset,
            base_url = %resolved.config.base_url,
            interceptors = interceptors.len(),
            "Created API client"
        );

        Ok(Self {
            http,
            resolved,
            interceptors,
        })
    }

    pub fn preset(&self) -> Preset {
        self.resolved.preset
    }

    pub fn base_url(&self) -> &str {
        &self.resolved.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.resolved.config
    }

    pub fn options(&self) -> &ClientOptions {
        &self.resolved.options
    }

    pub fn resolved(&self) -> &ResolvedConfig {
        &self.resolved
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.request(ApiRequest::get(path)).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> ClientResult<ApiResponse> {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> ClientResult<ApiResponse> {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> ClientResult<ApiResponse> {
        self.request(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<ApiResponse> {
        self.request(ApiRequest::delete(path)).await
    }

    /// Send a request through the interceptor chain
    pub async fn request(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.execute(request, None).await
    }

    /// Like [`ApiClient::request`], failing with an `Abort` failure once `cancel` fires
    pub async fn send_with_cancel(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResponse> {
        self.execute(request, Some(cancel)).await
    }

    async fn execute(
        &self,
        request: ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> ClientResult<ApiResponse> {
        let mut request = self.prepare(request);
        self.interceptors.on_request(&mut request)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ApiFailure::aborted()
                        .with_request(request.method.as_str(), request.url.as_str())),
                    outcome = self.dispatch(&request) => outcome?,
                },
                None => self.dispatch(&request).await?,
            };

            let mut failure = match outcome {
                Ok(mut response) => {
                    self.interceptors.on_response(&request, &mut response);
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            if failure.kind != ErrorKind::Abort {
                if let Some(delay) = self.interceptors.retry_after(&request, &failure, attempt) {
                    debug!(
                        url = %request.url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying request"
                    );
                    let cancelled = match cancel {
                        Some(token) => tokio::select! {
                            _ = token.cancelled() => true,
                            _ = tokio::time::sleep(delay) => false,
                        },
                        None => {
                            tokio::time::sleep(delay).await;
                            false
                        }
                    };
                    if !cancelled {
                        continue;
                    }
                    failure = ApiFailure::aborted()
                        .with_request(request.method.as_str(), request.url.as_str());
                }
            }

            self.interceptors.on_error(&request, &mut failure);
            return Err(MonsteraError::Api(failure));
        }
    }

    /// Resolve the URL and fill in the client's default headers
    fn prepare(&self, mut request: ApiRequest) -> ApiRequest {
        request.url = self.resolved.config.url_for(&request.path);
        for (name, value) in &self.resolved.config.headers {
            if request.header_value(name).is_none() {
                request.headers.insert(name.clone(), value.clone());
            }
        }
        request
    }

    /// Perform one HTTP exchange. The outer error is for requests that cannot be
    /// built; the inner one for failures reported by the transport or server.
    async fn dispatch(&self, request: &ApiRequest) -> ClientResult<Result<ApiResponse, ApiFailure>> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(header_map(&request.headers)?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| MonsteraError::decode(format!("Failed to encode request body: {}", e), e))?;
            builder = builder.body(bytes);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Ok(Err(transport_failure(request, &e))),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(Err(transport_failure(request, &e))),
        };
        let body = parse_body(&text);

        if !(200..300).contains(&status) {
            let error_body = (!body.is_null()).then_some(&body);
            return Ok(Err(ApiFailure::from_status(status, error_body)
                .with_request(request.method.as_str(), request.url.as_str())));
        }

        Ok(Ok(ApiResponse {
            status,
            headers,
            body,
            elapsed: started.elapsed(),
        }))
    }
}

fn transport_failure(request: &ApiRequest, error: &reqwest::Error) -> ApiFailure {
    let failure = if error.is_timeout() {
        ApiFailure::timeout(format!("Request timed out: {}", error))
    } else {
        ApiFailure::network(format!("Request failed: {}", error))
    };
    failure.with_request(request.method.as_str(), request.url.as_str())
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn header_map(headers: &BTreeMap<String, String>) -> ClientResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| MonsteraError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| MonsteraError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
