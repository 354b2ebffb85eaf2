//! Authenticator implementation
//!
//! Turns an [`AuthConfig`] into request headers.

use super::types::AuthConfig;
use crate::http::ApiError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Insert credential headers, replacing any caller-supplied values
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), ApiError> {
        for (name, value) in self.config.header_pairs() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ApiError::InvalidRequest {
                    message: format!("invalid auth header name '{name}': {e}"),
                }
            })?;
            let mut value =
                HeaderValue::from_str(&value).map_err(|e| ApiError::InvalidRequest {
                    message: format!("invalid value for auth header '{name}': {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Ok(())
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
