//! State types for tracking sync progress
//!
//! The layout follows the Singer convention:
//!
//! ```json
//! {"bookmarks": {"eventlogs": {"updated": "2024-01-01T00:00:00Z"}}, "currently_syncing": null}
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Complete state for a tap run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Bookmark tree keyed by stream, then by bookmark name
    #[serde(default)]
    pub bookmarks: Map<String, Value>,

    /// Stream being synced when the state was emitted
    #[serde(default)]
    pub currently_syncing: Option<String>,

    /// Keys written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state from a file; a missing file yields an empty state
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| Error::State {
            message: format!("Failed to read state file: {e}"),
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::from_json(&contents)
    }

    /// Parse state from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::State {
            message: format!("Failed to parse state JSON: {e}"),
        })
    }

    /// Value stored under a bookmark path such as `["eventlogs", "updated"]`
    pub fn get_bookmark(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.bookmarks.get(*first)?;
        for key in rest {
            current = current.get(*key)?;
        }
        Some(current)
    }

    /// String bookmark, if present
    pub fn get_bookmark_str(&self, path: &[&str]) -> Option<&str> {
        self.get_bookmark(path).and_then(Value::as_str)
    }

    /// Store `value` under `path`, creating intermediate objects
    ///
    /// Intermediate nodes that are not objects are replaced.
    pub fn set_bookmark(&mut self, path: &[&str], value: impl Into<Value>) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(Error::state("bookmark path is empty"));
        };

        let mut node = &mut self.bookmarks;
        for key in parents {
            let entry = node
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = entry
                .as_object_mut()
                .ok_or_else(|| Error::state(format!("bookmark node '{key}' is not an object")))?;
        }
        node.insert((*last).to_string(), value.into());
        Ok(())
    }

    /// Mark the stream currently being synced
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(str::to_string);
    }

    /// Serialize for a STATE message
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}
