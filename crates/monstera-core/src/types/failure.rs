//! Normalized API failure taxonomy.
//!
//! Every failed call, whether the server answered with an error status or the
//! request never completed, is reduced to an [`ApiFailure`] carrying an
//! [`ErrorKind`]. The backend's standard error envelope is modelled by
//! [`StandardErrorResponse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    ServerError,
    ServiceUnavailable,
    Timeout,
    NetworkError,
    Abort,
    Unknown,
}

/// How loudly a failure should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> ErrorKind {
        match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            408 | 504 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            503 => ErrorKind::ServiceUnavailable,
            500..=599 => ErrorKind::ServerError,
            _ => ErrorKind::Unknown,
        }
    }

    /// Machine-readable code, as used in the backend error envelope
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::RateLimited => "RATE_LIMIT_EXCEEDED",
            ErrorKind::ServerError => "INTERNAL_SERVER_ERROR",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::Abort => "CANCELLED",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Reverse of [`ErrorKind::code`]
    pub fn from_code(code: &str) -> Option<ErrorKind> {
        let kind = match code {
            "UNAUTHORIZED" => ErrorKind::Unauthorized,
            "FORBIDDEN" => ErrorKind::Forbidden,
            "NOT_FOUND" => ErrorKind::NotFound,
            "VALIDATION_ERROR" | "BAD_REQUEST" => ErrorKind::Validation,
            "CONFLICT" => ErrorKind::Conflict,
            "RATE_LIMIT_EXCEEDED" => ErrorKind::RateLimited,
            "INTERNAL_SERVER_ERROR" => ErrorKind::ServerError,
            "SERVICE_UNAVAILABLE" => ErrorKind::ServiceUnavailable,
            "TIMEOUT" => ErrorKind::Timeout,
            "NETWORK_ERROR" => ErrorKind::NetworkError,
            "CANCELLED" => ErrorKind::Abort,
            "UNKNOWN_ERROR" => ErrorKind::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    /// Message shown when the server did not supply one
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Authentication is required",
            ErrorKind::Forbidden => "You do not have permission to perform this action",
            ErrorKind::NotFound => "The requested resource was not found",
            ErrorKind::Validation => "The request contains invalid data",
            ErrorKind::Conflict => "The resource was modified by another request",
            ErrorKind::RateLimited => "Too many requests",
            ErrorKind::ServerError => "The server encountered an error",
            ErrorKind::ServiceUnavailable => "The service is temporarily unavailable",
            ErrorKind::Timeout => "The request timed out",
            ErrorKind::NetworkError => "A network error occurred; check your connection",
            ErrorKind::Abort => "The request was cancelled",
            ErrorKind::Unknown => "An unexpected error occurred",
        }
    }

    /// Severity of a failure known only by its category
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::ServerError | ErrorKind::ServiceUnavailable => ErrorSeverity::Critical,
            ErrorKind::Unauthorized | ErrorKind::Forbidden | ErrorKind::NetworkError => {
                ErrorSeverity::Error
            }
            ErrorKind::Validation
            | ErrorKind::NotFound
            | ErrorKind::Conflict
            | ErrorKind::RateLimited => ErrorSeverity::Warning,
            ErrorKind::Timeout | ErrorKind::Abort | ErrorKind::Unknown => ErrorSeverity::Info,
        }
    }

    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ServiceUnavailable
                | ErrorKind::Timeout
                | ErrorKind::NetworkError
                | ErrorKind::RateLimited
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Abort => "abort",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed API call, reduced to the taxonomy
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind} (status {status}): {message}")]
pub struct ApiFailure {
    pub kind: ErrorKind,
    /// HTTP status, or 0 when no response was received
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Set once an error handler has processed the failure
    #[serde(skip)]
    pub handled: bool,
}

impl ApiFailure {
    pub fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            code: kind.code().to_string(),
            message: message.into(),
            details: None,
            url: None,
            method: None,
            handled: false,
        }
    }

    /// Build a failure from an error response status and its (optional) JSON body.
    ///
    /// A body already shaped as the standard envelope is adopted as-is;
    /// otherwise the message is extracted from common error body layouts.
    pub fn from_status(status: u16, body: Option<&Value>) -> Self {
        if let Some(envelope) = body.and_then(StandardErrorResponse::from_value) {
            let kind = ErrorKind::from_code(&envelope.error.code)
                .unwrap_or_else(|| ErrorKind::from_status(status));
            return Self {
                kind,
                status,
                code: envelope.error.code,
                message: envelope.error.message,
                details: envelope.error.details,
                url: None,
                method: None,
                handled: false,
            };
        }

        let kind = ErrorKind::from_status(status);
        let message = body
            .and_then(extract_message)
            .unwrap_or_else(|| kind.default_message().to_string());

        let mut failure = Self::new(kind, status, message);
        failure.details = body.filter(|b| !b.is_null()).cloned();
        failure
    }

    /// The request never reached the server or the connection dropped
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, 0, message)
    }

    /// The client gave up waiting for a response
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, 0, message)
    }

    /// The request was cancelled by its caller
    pub fn aborted() -> Self {
        Self::new(ErrorKind::Abort, 0, ErrorKind::Abort.default_message())
    }

    /// Attach the request that produced this failure
    pub fn with_request(mut self, method: impl Into<String>, url: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.url = Some(url.into());
        self
    }

    /// Severity by status range: 5xx critical, 401/403 and transport failures
    /// errors, client mistakes warnings, anything else informational
    pub fn severity(&self) -> ErrorSeverity {
        match self.status {
            500..=599 => ErrorSeverity::Critical,
            401 | 403 => ErrorSeverity::Error,
            400 | 404 | 409 | 422 | 429 => ErrorSeverity::Warning,
            0 => match self.kind {
                ErrorKind::NetworkError | ErrorKind::Timeout => ErrorSeverity::Error,
                ErrorKind::Abort => ErrorSeverity::Info,
                kind => kind.severity(),
            },
            _ => ErrorSeverity::Info,
        }
    }

    /// Key used to group repeated failures
    pub fn frequency_key(&self) -> String {
        format!("{}:{}", self.code, self.status)
    }

    /// Render as the backend's standard error envelope
    pub fn to_envelope(&self) -> StandardErrorResponse {
        StandardErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.code.clone(),
                message: self.message.clone(),
                details: self.details.clone(),
            },
            status: self.status,
            timestamp: Utc::now(),
        }
    }
}

/// Backend error envelope: `{ success, error: { code, message, details }, status, timestamp }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl StandardErrorResponse {
    /// Interpret a JSON body as the standard envelope, if it is one
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("success")?.as_bool()? {
            return None;
        }
        let error = value.get("error")?;
        let code = error.get("code")?.as_str()?;
        let message = error.get("message")?.as_str()?;
        let status = value
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(0);
        let timestamp = value
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Some(Self {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                details: error.get("details").filter(|d| !d.is_null()).cloned(),
            },
            status,
            timestamp,
        })
    }
}

/// Pull a human-readable message out of an error body.
///
/// Priority: `message`, `error.message`, `error` (string), `errors[0].message`,
/// then the body itself when it is a plain string.
pub fn extract_message(body: &Value) -> Option<String> {
    if let Some(text) = body.as_str() {
        return (!text.is_empty()).then(|| text.to_string());
    }

    let candidates = [
        body.get("message"),
        body.get("error").and_then(|e| e.get("message")),
        body.get("error"),
        body.get("errors")
            .and_then(|e| e.get(0))
            .and_then(|e| e.get("message")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
