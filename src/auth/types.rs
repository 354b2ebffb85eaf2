//! Auth configuration types

use std::collections::BTreeMap;

/// Datadog API key header
pub const DD_API_KEY_HEADER: &str = "DD-API-KEY";

/// Datadog application key header
pub const DD_APPLICATION_KEY_HEADER: &str = "DD-APPLICATION-KEY";

/// Authentication configuration for a tap
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Datadog key pair sent as `DD-API-KEY` / `DD-APPLICATION-KEY`
    DatadogKeys {
        /// API key
        api_key: String,
        /// Application key
        app_key: String,
    },

    /// `Authorization: XTM-Basic <token>`
    XtmBasic {
        /// Pre-encoded XTM token
        token: String,
    },

    /// `Authorization: Basic <token>`
    Basic {
        /// Pre-encoded basic token
        token: String,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: BTreeMap<String, String>,
    },
}

impl AuthConfig {
    /// Header name/value pairs this config contributes
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        match self {
            AuthConfig::None => Vec::new(),
            AuthConfig::DatadogKeys { api_key, app_key } => vec![
                (DD_API_KEY_HEADER.to_string(), api_key.clone()),
                (DD_APPLICATION_KEY_HEADER.to_string(), app_key.clone()),
            ],
            AuthConfig::XtmBasic { token } => {
                vec![("Authorization".to_string(), format!("XTM-Basic {token}"))]
            }
            AuthConfig::Basic { token } => {
                vec![("Authorization".to_string(), format!("Basic {token}"))]
            }
            AuthConfig::CustomHeaders { headers } => headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::DatadogKeys { .. } => "datadog_keys",
            AuthConfig::XtmBasic { .. } => "xtm_basic",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::CustomHeaders { .. } => "custom_headers",
        }
    }
}

// Credentials stay out of Debug output
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::CustomHeaders { headers } => f
                .debug_struct("CustomHeaders")
                .field("headers", &headers.keys().collect::<Vec<_>>())
                .finish(),
            other => write!(f, "{}(..)", other.kind()),
        }
    }
}
