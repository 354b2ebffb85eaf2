//! Singer message types

use crate::schema::JsonSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message written to stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Describes the records that follow for a stream
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema of the records
        schema: Value,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Fields the bookmark is derived from
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One record
    Record {
        /// Stream name
        stream: String,
        /// The record, already transformed against the schema
        record: Value,
        /// When the page holding the record was fetched
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },
    /// Checkpoint to hand back through `--state`
    State {
        /// Full state object
        value: Value,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: Value, key_properties: Vec<String>) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties: Vec::new(),
        }
    }

    /// Create a schema message from a typed schema
    pub fn typed_schema(
        stream: impl Into<String>,
        schema: &JsonSchema,
        key_properties: Vec<String>,
    ) -> Self {
        Self::schema(stream, schema.to_json(), key_properties)
    }

    /// Set bookmark properties on a schema message
    #[must_use]
    pub fn with_bookmark_properties(mut self, properties: Vec<String>) -> Self {
        if let Self::Schema {
            bookmark_properties,
            ..
        } = &mut self
        {
            *bookmark_properties = properties;
        }
        self
    }

    /// Create a record message
    pub fn record(
        stream: impl Into<String>,
        record: Value,
        time_extracted: Option<DateTime<Utc>>,
    ) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Stream the message belongs to; state messages have none
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }
}
