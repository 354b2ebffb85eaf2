//! Record path parsing and evaluation

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Wildcard,
}

/// Parsed record path such as `$.data[*]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPath {
    raw: String,
    segments: Vec<Segment>,
}

impl RecordPath {
    /// Parse a record path
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::config(format!("Invalid record path '{raw}': {reason}"));

        let mut rest = raw
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| invalid("must start with '$'"))?;
        let mut segments = Vec::new();

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("[*]") {
                segments.push(Segment::Wildcard);
                rest = after;
            } else if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(|c: char| c == '.' || c == '[').unwrap_or(after.len());
                let key = &after[..end];
                if key.is_empty() {
                    return Err(invalid("empty field name"));
                }
                segments.push(Segment::Key(key.to_string()));
                rest = &after[end..];
            } else {
                return Err(invalid("expected '.name' or '[*]'"));
            }
        }

        Ok(Self {
            raw: raw.trim().to_string(),
            segments,
        })
    }

    /// Records matched by this path, in document order
    pub fn extract(&self, body: &Value) -> Vec<Value> {
        let mut current: Vec<&Value> = vec![body];

        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.into_iter().filter_map(|v| v.get(key)).collect(),
                Segment::Wildcard => current.into_iter().flat_map(expand).collect(),
            };
        }

        current.into_iter().cloned().collect()
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Children of a node under `[*]`
fn expand(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        other => vec![other],
    }
}

impl FromStr for RecordPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Follow a dot-separated field path such as `attributes.timestamp`
pub fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |current, key| current.get(key))
}
