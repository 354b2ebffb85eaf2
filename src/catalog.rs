//! Singer catalog
//!
//! `discover` prints a catalog with every stream selected; `sync` reads
//! one back through `--catalog` to decide which streams and fields to emit.
//! Selection lives in the `metadata` list: the entry with an empty
//! breadcrumb describes the stream, entries with breadcrumb
//! `["properties", <field>]` describe fields.

use crate::error::{Error, Result};
use crate::types::ReplicationMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ============================================================================
// Catalog Types
// ============================================================================

/// Discovered or user-edited catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams, in sync order
    pub streams: Vec<CatalogEntry>,
}

/// Stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,

    /// Stream name
    pub stream: String,

    /// JSON schema for the stream's records
    #[serde(default)]
    pub schema: Value,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Field used for incremental bookmarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Replication method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<ReplicationMethod>,

    /// Selection and inclusion metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// One metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream, `["properties", <field>]` for a field
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// Metadata values
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Field inclusion as reported by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Always emitted (keys and replication keys)
    Automatic,
    /// Emitted unless deselected
    Available,
    /// Never emitted
    Unsupported,
}

// ============================================================================
// Catalog
// ============================================================================

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::catalog(format!("Failed to read catalog file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog(format!("Invalid catalog JSON: {e}")))
    }

    /// Find a stream by `tap_stream_id`
    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Selected streams, in catalog order
    pub fn selected(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|s| s.is_selected())
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Catalog Entry
// ============================================================================

impl CatalogEntry {
    /// Metadata with the empty breadcrumb
    pub fn stream_metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Metadata for a top-level field
    pub fn field_metadata(&self, field: &str) -> Option<&Map<String, Value>> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.len() == 2 && m.breadcrumb[0] == "properties" && m.breadcrumb[1] == field)
            .map(|m| &m.metadata)
    }

    /// `selected`, falling back to `selected-by-default`
    pub fn is_selected(&self) -> bool {
        self.stream_metadata().is_some_and(is_selected)
    }

    /// Top-level fields that must not be emitted
    ///
    /// A field is dropped when its inclusion is `unsupported`, or when it is
    /// explicitly deselected and its inclusion is not `automatic`.
    pub fn deselected_fields(&self) -> Vec<String> {
        self.metadata
            .iter()
            .filter(|m| m.breadcrumb.len() == 2 && m.breadcrumb[0] == "properties")
            .filter(|m| {
                let inclusion = inclusion(&m.metadata);
                let deselected = m.metadata.get("selected").and_then(Value::as_bool) == Some(false);
                inclusion == Some(Inclusion::Unsupported)
                    || (deselected && inclusion != Some(Inclusion::Automatic))
            })
            .map(|m| m.breadcrumb[1].clone())
            .collect()
    }

    /// Set `selected` on the stream metadata entry, adding one if missing
    pub fn set_selected(&mut self, selected: bool) {
        if let Some(entry) = self.metadata.iter_mut().find(|m| m.breadcrumb.is_empty()) {
            entry.metadata.insert("selected".to_string(), Value::Bool(selected));
        } else {
            let mut metadata = Map::new();
            metadata.insert("selected".to_string(), Value::Bool(selected));
            self.metadata.insert(
                0,
                MetadataEntry {
                    breadcrumb: Vec::new(),
                    metadata,
                },
            );
        }
    }
}

fn is_selected(metadata: &Map<String, Value>) -> bool {
    metadata
        .get("selected")
        .and_then(Value::as_bool)
        .or_else(|| metadata.get("selected-by-default").and_then(Value::as_bool))
        .unwrap_or(false)
}

fn inclusion(metadata: &Map<String, Value>) -> Option<Inclusion> {
    metadata
        .get("inclusion")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}
