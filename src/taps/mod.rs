//! Tap definitions
//!
//! A tap is a fixed set of [`TapStream`]s plus the client settings needed
//! to reach its API. Streams describe their requests, page rule, record
//! path and parent; the sync engine drives them.
//!
//! # Taps
//!
//! - `datadog` - `eventlogs` from the Logs search API
//! - `xtm` - `projects` and its children `projectdetails`, `projectstats`,
//!   `projectmetrics`

mod datadog;
mod xtm;

pub use datadog::EventLogs;
pub use xtm::{ProjectDetails, ProjectMetrics, ProjectStats, Projects};

use crate::catalog::{Catalog, CatalogEntry, MetadataEntry};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::{ApiError, ApiRequest, ApiResponse, ClientConfig, HttpClient, Scheme};
use crate::schema::JsonSchema;
use crate::state::State;
use crate::types::{JsonObject, ReplicationMethod};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Values a child stream inherits from one parent record
pub type Partition = JsonObject;

/// What a stream may consult when building its first request
#[derive(Debug, Clone, Copy)]
pub struct StreamContext<'a> {
    /// Current state, for bookmarks
    pub state: &'a State,
    /// Parent record values for child streams
    pub partition: Option<&'a Partition>,
}

impl<'a> StreamContext<'a> {
    /// Context for a top-level stream
    pub fn new(state: &'a State) -> Self {
        Self {
            state,
            partition: None,
        }
    }

    /// Context for one partition of a child stream
    #[must_use]
    pub fn with_partition(mut self, partition: &'a Partition) -> Self {
        self.partition = Some(partition);
        self
    }
}

// ============================================================================
// TapStream
// ============================================================================

/// One stream of a tap
pub trait TapStream: Send + Sync {
    /// Stream name, also its `tap_stream_id`
    fn name(&self) -> &'static str;

    /// Declared record schema
    fn schema(&self) -> JsonSchema;

    /// Primary key fields
    fn key_properties(&self) -> &'static [&'static str];

    /// Where records sit in a response body
    fn records_path(&self) -> &'static str {
        "$[*]"
    }

    /// Dotted path of the field bookmarks are taken from
    fn replication_key(&self) -> Option<&'static str> {
        None
    }

    /// Where the bookmark lives in state
    fn bookmark_path(&self) -> Vec<&'static str> {
        match self.replication_key() {
            Some(key) => vec![self.name(), key],
            None => Vec::new(),
        }
    }

    /// Parent stream, for streams synced once per parent record
    fn parent(&self) -> Option<&'static str> {
        None
    }

    /// Request for the first page
    fn first_request(&self, ctx: &StreamContext<'_>) -> Result<ApiRequest>;

    /// Request for the page after `response`, if there is one
    fn next_request(&self, _previous: &ApiRequest, _response: &ApiResponse) -> Option<ApiRequest> {
        None
    }

    /// Adjust a record before it is transformed
    fn post_process(&self, record: Value, _partition: Option<&Partition>) -> Value {
        record
    }

    /// Values handed to child streams for this record
    fn child_partition(&self, _record: &Value) -> Option<Partition> {
        None
    }

    /// Whether `error` ends this stream's partition quietly instead of the run
    fn is_skippable(&self, _error: &ApiError) -> bool {
        false
    }

    /// Catalog entry with everything selected
    fn catalog_entry(&self) -> CatalogEntry {
        let schema = self.schema();
        let keys: Vec<String> = self.key_properties().iter().map(|k| (*k).to_string()).collect();
        let replication_root = self
            .replication_key()
            .and_then(|k| k.split('.').next())
            .map(str::to_string);
        let method = if self.replication_key().is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        };

        let mut stream_meta = Map::new();
        stream_meta.insert("inclusion".into(), json!("available"));
        stream_meta.insert("selected".into(), json!(true));
        stream_meta.insert("table-key-properties".into(), json!(keys));
        stream_meta.insert("forced-replication-method".into(), json!(method));
        if let Some(key) = self.replication_key() {
            stream_meta.insert("valid-replication-keys".into(), json!([key]));
        }
        if let Some(parent) = self.parent() {
            stream_meta.insert("parent-tap-stream-id".into(), json!(parent));
        }

        let mut metadata = vec![MetadataEntry {
            breadcrumb: Vec::new(),
            metadata: stream_meta,
        }];
        for field in schema.properties.keys() {
            let automatic = keys.contains(field) || replication_root.as_ref() == Some(field);
            let mut field_meta = Map::new();
            field_meta.insert(
                "inclusion".into(),
                json!(if automatic { "automatic" } else { "available" }),
            );
            metadata.push(MetadataEntry {
                breadcrumb: vec!["properties".to_string(), field.clone()],
                metadata: field_meta,
            });
        }

        CatalogEntry {
            tap_stream_id: self.name().to_string(),
            stream: self.name().to_string(),
            schema: schema.to_json(),
            key_properties: keys,
            replication_key: self.replication_key().map(str::to_string),
            replication_method: Some(method),
            metadata,
        }
    }
}

/// Read a partition value as a path segment
pub(crate) fn partition_segment(
    stream: &str,
    partition: Option<&Partition>,
    key: &str,
) -> Result<String> {
    let missing = || Error::MissingPartitionKey {
        stream: stream.to_string(),
        key: key.to_string(),
    };
    match partition.and_then(|p| p.get(key)).ok_or_else(missing)? {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(missing()),
    }
}

// ============================================================================
// Tap
// ============================================================================

/// Which tap to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TapKind {
    /// Datadog logs
    Datadog,
    /// XTM project metadata
    Xtm,
}

impl TapKind {
    /// Tap name as used on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            TapKind::Datadog => "datadog",
            TapKind::Xtm => "xtm",
        }
    }
}

impl fmt::Display for TapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TapKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().trim_start_matches("tap-") {
            "datadog" => Ok(TapKind::Datadog),
            "xtm" => Ok(TapKind::Xtm),
            _ => Err(Error::UnknownTap { name: s.to_string() }),
        }
    }
}

/// A configured tap
pub struct Tap {
    kind: TapKind,
    client_config: ClientConfig,
    check: ApiRequest,
    streams: Vec<Box<dyn TapStream>>,
}

impl Tap {
    /// Build a tap from its config, validating required fields
    pub fn new(kind: TapKind, config: &TapConfig) -> Result<Self> {
        match kind {
            TapKind::Datadog => datadog::build(config),
            TapKind::Xtm => xtm::build(config),
        }
    }

    fn from_parts(
        kind: TapKind,
        client_config: ClientConfig,
        check: ApiRequest,
        streams: Vec<Box<dyn TapStream>>,
    ) -> Self {
        Self {
            kind,
            client_config,
            check,
            streams,
        }
    }

    /// Talk plain HTTP to the API host (mock servers only)
    #[must_use]
    pub fn insecure_http(mut self) -> Self {
        self.client_config.scheme = Scheme::Http;
        self
    }

    /// Which tap this is
    pub fn kind(&self) -> TapKind {
        self.kind
    }

    /// Client settings for this tap
    pub fn client_config(&self) -> &ClientConfig {
        &self.client_config
    }

    /// Build the HTTP client for this tap
    pub fn http_client(&self) -> Result<HttpClient> {
        HttpClient::new(self.client_config.clone())
    }

    /// Request used by `check`
    pub fn check_request(&self) -> &ApiRequest {
        &self.check
    }

    /// All streams, parents before children
    pub fn streams(&self) -> impl Iterator<Item = &(dyn TapStream + 'static)> {
        self.streams.iter().map(|s| s.as_ref())
    }

    /// Stream names, in sync order
    pub fn stream_names(&self) -> Vec<&'static str> {
        self.streams().map(TapStream::name).collect()
    }

    /// Find a stream by name
    pub fn stream(&self, name: &str) -> Option<&dyn TapStream> {
        self.streams().find(|s| s.name() == name)
    }

    /// Streams whose parent is `name`
    pub fn children_of<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a (dyn TapStream + 'static)> + 'a {
        self.streams().filter(move |s| s.parent() == Some(name))
    }

    /// Catalog of every stream, all selected
    pub fn discover(&self) -> Catalog {
        Catalog {
            streams: self.streams().map(TapStream::catalog_entry).collect(),
        }
    }
}

impl fmt::Debug for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tap")
            .field("kind", &self.kind)
            .field("client_config", &self.client_config)
            .field("streams", &self.stream_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
