//! HTTP request executor
//!
//! Issues one request per call:
//! - Normalizes the base URL to `https://` and joins request paths
//! - Applies auth and the fixed JSON headers on top of caller headers
//! - Spaces consecutive requests through the throttle
//! - Applies the request timeout
//! - Classifies the response through the error taxonomy
//!
//! Retries live in [`super::retry`], wrapped around this executor.

use super::taxonomy::{is_success, ApiError};
use super::throttle::{Throttle, DEFAULT_MIN_INTERVAL};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::Result;
use crate::types::Method;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default request timeout (5 minutes)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

static SCHEME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("static regex is valid"));

/// Scheme forced onto the configured base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Https,
    /// Plain HTTP, only meant for local mock servers
    Http,
}

impl Scheme {
    fn prefix(self) -> &'static str {
        match self {
            Scheme::Https => "https://",
            Scheme::Http => "http://",
        }
    }
}

/// Strip any scheme from `base_url` and re-prefix it with `scheme`
pub fn normalize_base_url(base_url: &str, scheme: Scheme) -> String {
    let host = SCHEME_PREFIX.replace(base_url.trim(), "");
    format!("{}{host}", scheme.prefix())
}

/// Join a base URL and a path with exactly one `/` between them
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL as configured; normalized before use
    pub base_url: String,
    /// Credentials
    pub auth: AuthConfig,
    /// Per-request timeout
    pub timeout: Duration,
    /// Minimum spacing between consecutive requests
    pub min_interval: Duration,
    /// User agent string
    pub user_agent: String,
    /// Scheme forced onto the base URL
    pub scheme: Scheme,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                base_url: base_url.into(),
                auth: AuthConfig::None,
                timeout: DEFAULT_REQUEST_TIMEOUT,
                min_interval: DEFAULT_MIN_INTERVAL,
                user_agent: format!("singer-taps/{}", env!("CARGO_PKG_VERSION")),
                scheme: Scheme::Https,
            },
        }
    }

    /// Base URL after scheme normalization
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url, self.scheme)
    }
}

/// Builder for HTTP client config
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set credentials
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the minimum spacing between requests
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.config.min_interval = interval;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Talk plain HTTP to the base host (mock servers only)
    pub fn insecure_http(mut self) -> Self {
        self.config.scheme = Scheme::Http;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// A single request to issue through an executor
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Caller headers; fixed headers override these
    pub headers: BTreeMap<String, String>,
    /// JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a request
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful (status 200) response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl ApiResponse {
    /// Build a response from a body (status 200, no headers)
    pub fn from_body(body: Value) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Header value as a string, if present and valid
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Anything that can issue an [`ApiRequest`]
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Issue the request and classify the outcome
    async fn execute(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, ApiError>;
}

/// HTTP client issuing classified JSON requests
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    base_url: String,
    authenticator: Authenticator,
    throttle: Throttle,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.normalized_base_url();
        url::Url::parse(&base_url)?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            client,
            base_url,
            authenticator: Authenticator::new(config.auth.clone()),
            throttle: Throttle::new(config.min_interval),
            config,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Normalized base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a request path
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Merge caller headers with auth and the fixed JSON headers
    fn headers(&self, extra: &BTreeMap<String, String>) -> std::result::Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        for (key, value) in extra {
            let name =
                HeaderName::from_bytes(key.as_bytes()).map_err(|e| ApiError::InvalidRequest {
                    message: format!("invalid header name '{key}': {e}"),
                })?;
            let value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidRequest {
                message: format!("invalid value for header '{key}': {e}"),
            })?;
            headers.insert(name, value);
        }

        self.authenticator.apply(&mut headers)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                timeout: self.config.timeout,
            }
        } else {
            ApiError::Transport(e)
        }
    }
}

#[async_trait]
impl RequestExecutor for HttpClient {
    async fn execute(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        let headers = self.headers(&request.headers)?;

        self.throttle.wait().await;

        let mut req = self
            .client
            .request(request.method.into(), &url)
            .headers(headers)
            .timeout(self.config.timeout);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let started = Instant::now();
        let response = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        debug!(
            method = %request.method,
            url = %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !is_success(status) {
            return Err(ApiError::from_status(status, parsed));
        }

        match parsed {
            Some(body) => Ok(ApiResponse {
                status,
                headers: response_headers,
                body,
            }),
            None => Err(ApiError::Decode {
                message: format!("{} {url} returned a non-JSON body", request.method),
            }),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}
