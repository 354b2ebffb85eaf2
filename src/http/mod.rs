//! HTTP client module
//!
//! Provides the classified request executor and the retry layer wrapped
//! around it.
//!
//! # Features
//!
//! - **Error Taxonomy**: status codes mapped to [`ErrorKind`] with default messages
//! - **Request Spacing**: minimum interval between requests using governor
//! - **Retries**: exponential backoff with jitter for transient failures only
//! - **Authentication**: Integration with auth module

mod client;
mod retry;
mod taxonomy;
mod throttle;

pub use client::{
    join_url, normalize_base_url, ApiRequest, ApiResponse, ClientConfig, ClientConfigBuilder,
    HttpClient, RequestExecutor, Scheme, DEFAULT_REQUEST_TIMEOUT,
};
pub use retry::{RetryPolicy, Retrying};
pub use taxonomy::{error_message, is_success, ApiError, ErrorKind, UNKNOWN_ERROR_MESSAGE};
pub use throttle::{Throttle, DEFAULT_MIN_INTERVAL};

#[cfg(test)]
mod tests;
