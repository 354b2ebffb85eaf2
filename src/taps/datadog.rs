//! Datadog logs tap
//!
//! One incremental stream, `eventlogs`, read through the Logs search API:
//! `POST /api/v2/logs/events/search` with a cursor taken from
//! `meta.page.after`.

use super::{StreamContext, Tap, TapKind, TapStream};
use crate::auth::AuthConfig;
use crate::config::{parse_datetime, TapConfig};
use crate::error::{Error, Result};
use crate::http::{ApiRequest, ApiResponse};
use crate::schema::{JsonSchema, JsonType, SchemaProperty};
use crate::types::OptionStringExt;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

/// API host used when the config has none
pub const DEFAULT_BASE_URL: &str = "api.datadoghq.com";

/// Log search endpoint
pub const SEARCH_PATH: &str = "/api/v2/logs/events/search";

/// Key validation endpoint used by `check`
pub const VALIDATE_PATH: &str = "/api/v1/validate";

const DEFAULT_QUERY: &str = "*";

pub(super) fn build(config: &TapConfig) -> Result<Tap> {
    let auth = AuthConfig::DatadogKeys {
        api_key: config.require("api_key")?,
        app_key: config.require("app_key")?,
    };
    let start_date = config
        .start_date()?
        .ok_or_else(|| Error::missing_field("start_date"))?;
    let base_url = config
        .base_url()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let client_config = config.client_builder(base_url)?.auth(auth).build();
    let stream = EventLogs {
        query: config
            .query
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_QUERY.to_string()),
        page_size: config.page_size()?,
        start_date,
    };

    Ok(Tap::from_parts(
        TapKind::Datadog,
        client_config,
        ApiRequest::get(VALIDATE_PATH),
        vec![Box::new(stream)],
    ))
}

/// `eventlogs` stream
#[derive(Debug, Clone)]
pub struct EventLogs {
    query: String,
    page_size: u32,
    start_date: DateTime<Utc>,
}

impl EventLogs {
    /// Create the stream
    pub fn new(query: impl Into<String>, page_size: u32, start_date: DateTime<Utc>) -> Self {
        Self {
            query: query.into(),
            page_size,
            start_date,
        }
    }

    /// Lower bound of the search: the bookmark, else `start_date`
    fn search_from(&self, ctx: &StreamContext<'_>) -> DateTime<Utc> {
        ctx.state
            .get_bookmark_str(&self.bookmark_path())
            .and_then(parse_datetime)
            .unwrap_or(self.start_date)
    }
}

impl TapStream for EventLogs {
    fn name(&self) -> &'static str {
        "eventlogs"
    }

    fn schema(&self) -> JsonSchema {
        JsonSchema::new()
            .required_property("id", JsonType::String)
            .property("type", SchemaProperty::string())
            .property(
                "attributes",
                SchemaProperty::object([
                    ("status", SchemaProperty::string()),
                    ("service", SchemaProperty::string()),
                    ("host", SchemaProperty::string()),
                    ("message", SchemaProperty::string()),
                    ("tags", SchemaProperty::array(SchemaProperty::string())),
                    ("timestamp", SchemaProperty::date_time()),
                    ("attributes", SchemaProperty::free_object()),
                ]),
            )
    }

    fn key_properties(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn records_path(&self) -> &'static str {
        "$.data[*]"
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some("attributes.timestamp")
    }

    fn bookmark_path(&self) -> Vec<&'static str> {
        vec!["eventlogs", "updated"]
    }

    fn first_request(&self, ctx: &StreamContext<'_>) -> Result<ApiRequest> {
        let from = self
            .search_from(ctx)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);

        Ok(ApiRequest::post(SEARCH_PATH).json(json!({
            "filter": {
                "query": self.query,
                "from": from,
                "to": "now"
            },
            "page": {
                "limit": self.page_size
            },
            "sort": "timestamp"
        })))
    }

    fn next_request(&self, previous: &ApiRequest, response: &ApiResponse) -> Option<ApiRequest> {
        let cursor = response
            .body
            .pointer("/meta/page/after")
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty())?;

        let mut next = previous.clone();
        if let Some(body) = next.body.as_mut() {
            body["page"]["cursor"] = json!(cursor);
        }
        Some(next)
    }
}
