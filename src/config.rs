//! Tap configuration
//!
//! The config file is a flat JSON object shared by both taps. Each tap
//! reads the keys it needs; unknown keys are ignored.

use crate::error::{Error, Result};
use crate::http::{ClientConfig, ClientConfigBuilder, DEFAULT_REQUEST_TIMEOUT};
use crate::types::OptionStringExt;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Largest page Datadog's log search accepts
pub const MAX_PAGE_SIZE: u32 = 5000;

/// Default page size for paged searches
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ============================================================================
// Tap Config
// ============================================================================

/// Configuration loaded from `--config`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TapConfig {
    /// API base URL, scheme optional
    #[serde(default)]
    pub base_url: Option<String>,

    /// Alternate key for the base URL
    #[serde(default)]
    pub api_url: Option<String>,

    /// Alternate key for the base URL
    #[serde(default)]
    pub url_base: Option<String>,

    /// Datadog API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Datadog application key
    #[serde(default)]
    pub app_key: Option<String>,

    /// XTM API token
    #[serde(default)]
    pub api_token: Option<String>,

    /// Earliest timestamp to sync from when no bookmark exists
    #[serde(default)]
    pub start_date: Option<String>,

    /// Request timeout in seconds, number or numeric string
    #[serde(default)]
    pub request_timeout: Option<Value>,

    /// Datadog log search query
    #[serde(default)]
    pub query: Option<String>,

    /// Records requested per page
    #[serde(default)]
    pub page_size: Option<u32>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl TapConfig {
    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Base URL, checking `base_url`, `api_url` then `url_base`
    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .none_if_empty()
            .or_else(|| self.api_url.clone().none_if_empty())
            .or_else(|| self.url_base.clone().none_if_empty())
    }

    /// A required string field, rejecting missing and empty values
    pub fn require(&self, field: &'static str) -> Result<String> {
        let value = match field {
            "api_key" => self.api_key.clone(),
            "app_key" => self.app_key.clone(),
            "api_token" => self.api_token.clone(),
            "start_date" => self.start_date.clone(),
            "query" => self.query.clone(),
            "user_agent" => self.user_agent.clone(),
            "base_url" => self.base_url(),
            _ => None,
        };
        value.none_if_empty().ok_or_else(|| Error::missing_field(field))
    }

    /// Request timeout; unset, zero and empty values fall back to the default
    pub fn request_timeout(&self) -> Result<Duration> {
        resolve_request_timeout(self.request_timeout.as_ref())
    }

    /// Page size, validated against the API limit
    pub fn page_size(&self) -> Result<u32> {
        match self.page_size {
            None => Ok(DEFAULT_PAGE_SIZE),
            Some(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
            Some(size) => Err(Error::invalid_value(
                "page_size",
                format!("{size} is outside 1..={MAX_PAGE_SIZE}"),
            )),
        }
    }

    /// Parsed `start_date`, if configured
    pub fn start_date(&self) -> Result<Option<DateTime<Utc>>> {
        match self.start_date.clone().none_if_empty() {
            None => Ok(None),
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| Error::invalid_value("start_date", format!("'{raw}' is not a date"))),
        }
    }

    /// Client config builder carrying the timeout and user agent
    pub fn client_builder(&self, base_url: impl Into<String>) -> Result<ClientConfigBuilder> {
        let mut builder = ClientConfig::builder(base_url).timeout(self.request_timeout()?);
        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }
        Ok(builder)
    }
}

/// Resolve a `request_timeout` config value into a duration
///
/// Numbers and numeric strings are seconds. `0`, `"0"`, `""` and a missing
/// value fall back to [`DEFAULT_REQUEST_TIMEOUT`].
pub fn resolve_request_timeout(value: Option<&Value>) -> Result<Duration> {
    let seconds = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match seconds {
        Some(s) if s == 0.0 => Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(s) if s.is_finite() && s > 0.0 => Duration::try_from_secs_f64(s)
            .map_err(|e| Error::invalid_value("request_timeout", e.to_string())),
        _ => Err(Error::invalid_value(
            "request_timeout",
            format!("expected a positive number of seconds, got {}", display_value(value)),
        )),
    }
}

fn display_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "nothing".to_string(), Value::to_string)
}

/// Parse RFC 3339 timestamps, naive datetimes (as UTC) and plain dates
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
