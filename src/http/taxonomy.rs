//! HTTP error taxonomy
//!
//! Maps an upstream status code (and, when available, the JSON error body)
//! to an [`ErrorKind`] and a human-readable message. Only status 200 counts
//! as success; every other code, other 2xx codes included, is an error.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Message used for status codes missing from the mapping table
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error";

/// Classified kind of an upstream HTTP failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    RateLimited,
    SubRequestFailed,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    Unknown,
}

impl ErrorKind {
    /// Resolve a status code to its kind
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            449 => Self::SubRequestFailed,
            500 => Self::InternalServerError,
            501 => Self::NotImplemented,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::Unknown,
        }
    }

    /// Default message used when the response body has no `errorMessages`
    pub fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "A validation exception has occurred.",
            Self::Unauthorized => "Invalid authorization credentials.",
            Self::Forbidden => "User does not have permission to access the resource.",
            Self::NotFound => "The resource you have specified cannot be found.",
            Self::Conflict => "The request does not match our state in some way.",
            Self::RateLimited => {
                "The API rate limit for your organisation/application pairing has been exceeded."
            }
            Self::SubRequestFailed => "The API was unable to process every part of the request.",
            Self::InternalServerError => {
                "The server encountered an unexpected condition which prevented it from fulfilling the request."
            }
            Self::NotImplemented => {
                "The server does not support the functionality required to fulfill the request."
            }
            Self::BadGateway => "Server received an invalid response.",
            Self::ServiceUnavailable => "API service is currently unavailable.",
            Self::GatewayTimeout => "API service time out, please check Datadog server.",
            Self::Unknown => UNKNOWN_ERROR_MESSAGE,
        }
    }

    /// Whether a request failing with this kind should be retried
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::ServiceUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Returns true for the only status code treated as success
pub fn is_success(status: u16) -> bool {
    status == 200
}

/// Pick the error message for a failed response
///
/// The first entry of an `errorMessages` array wins; otherwise the default
/// message for the status.
pub fn error_message(status: u16, body: Option<&Value>) -> String {
    let upstream = body
        .and_then(|b| b.get("errorMessages"))
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .map(|first| match first {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    upstream.unwrap_or_else(|| ErrorKind::from_status(status).default_message().to_string())
}

/// Failure of a single request through the executor
#[derive(Error, Debug)]
pub enum ApiError {
    /// Upstream answered with a status other than 200
    #[error("HTTP-error-code: {status}, Error: {message}")]
    Status {
        kind: ErrorKind,
        status: u16,
        message: String,
        /// Response body, when it was valid JSON
        body: Option<Value>,
    },

    #[error("Request timed out after {}s", timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to decode response body: {message}")]
    Decode { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    /// Classify a non-200 response
    pub fn from_status(status: u16, body: Option<Value>) -> Self {
        let message = error_message(status, body.as_ref());
        Self::Status {
            kind: ErrorKind::from_status(status),
            status,
            message,
            body,
        }
    }

    /// Classified kind, for status failures
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Status { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// HTTP status code, for status failures
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message without the status prefix
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Raw JSON body of the failed response
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Timeouts behave like a transient 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { kind, .. } => kind.is_retryable(),
            Self::Timeout { .. } => true,
            Self::Transport(_) | Self::Decode { .. } | Self::InvalidRequest { .. } => false,
        }
    }
}
