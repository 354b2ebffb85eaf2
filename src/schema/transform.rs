//! Record transformation against a stream schema
//!
//! Records are coerced into the declared types before they are emitted:
//! numeric strings become numbers, numbers become strings where a string
//! is declared, `date-time` strings are normalized to RFC 3339 UTC, and
//! fields the schema does not declare are dropped. A value that fits none
//! of the declared types is a [`Mismatch`].

use crate::config::parse_datetime;
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;

/// A value that does not fit its schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field '{path}' expected {expected}, got {found}")]
pub struct Mismatch {
    /// Dotted path to the offending value (`$` for the root)
    pub path: String,
    /// Declared types
    pub expected: String,
    /// JSON type of the value found
    pub found: String,
}

/// Transforms records of one stream
#[derive(Debug, Clone)]
pub struct Transformer<'a> {
    schema: &'a Value,
    deselected: BTreeSet<String>,
}

impl<'a> Transformer<'a> {
    /// Create a transformer for `schema`
    pub fn new(schema: &'a Value) -> Self {
        Self {
            schema,
            deselected: BTreeSet::new(),
        }
    }

    /// Drop these top-level fields before transforming
    #[must_use]
    pub fn without_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deselected.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Transform one record
    pub fn transform(&self, record: &Value) -> Result<Value, Mismatch> {
        let filtered;
        let record = match record {
            Value::Object(map) if !self.deselected.is_empty() => {
                filtered = Value::Object(
                    map.iter()
                        .filter(|(k, _)| !self.deselected.contains(*k))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                );
                &filtered
            }
            other => other,
        };
        transform_value(record, self.schema, "$")
    }
}

fn transform_value(value: &Value, schema: &Value, path: &str) -> Result<Value, Mismatch> {
    if let Some(options) = schema.get("anyOf").and_then(Value::as_array) {
        return options
            .iter()
            .find_map(|option| transform_value(value, option, path).ok())
            .ok_or_else(|| mismatch(path, "anyOf", value));
    }

    let types = declared_types(schema);
    if types.is_empty() {
        return Ok(value.clone());
    }

    if value.is_null() {
        return if types.contains(&"null") {
            Ok(Value::Null)
        } else {
            Err(mismatch(path, &types.join("|"), value))
        };
    }

    types
        .iter()
        .filter(|t| **t != "null")
        .find_map(|t| convert(value, t, schema, path).transpose())
        .unwrap_or_else(|| Err(mismatch(path, &types.join("|"), value)))
}

/// Convert `value` to `json_type`; `Ok(None)` means "does not fit"
fn convert(
    value: &Value,
    json_type: &str,
    schema: &Value,
    path: &str,
) -> Result<Option<Value>, Mismatch> {
    let converted = match json_type {
        "object" => match value {
            Value::Object(map) => Some(transform_object(map, schema, path)?),
            _ => None,
        },
        "array" => match value {
            Value::Array(items) => Some(transform_array(items, schema, path)?),
            _ => None,
        },
        "string" => to_string(value, schema.get("format").and_then(Value::as_str)),
        "integer" => to_integer(value),
        "number" => to_number(value),
        "boolean" => to_boolean(value),
        // Unknown keyword, leave the value alone
        _ => Some(value.clone()),
    };
    Ok(converted)
}

fn transform_object(map: &Map<String, Value>, schema: &Value, path: &str) -> Result<Value, Mismatch> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(Value::Object(map.clone()));
    };

    let mut out = Map::new();
    for (key, value) in map {
        if let Some(prop_schema) = properties.get(key) {
            let child = child_path(path, key);
            out.insert(key.clone(), transform_value(value, prop_schema, &child)?);
        }
    }
    Ok(Value::Object(out))
}

fn transform_array(items: &[Value], schema: &Value, path: &str) -> Result<Value, Mismatch> {
    let Some(item_schema) = schema.get("items") else {
        return Ok(Value::Array(items.to_vec()));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| transform_value(item, item_schema, &format!("{path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn to_string(value: &Value, format: Option<&str>) -> Option<Value> {
    match (value, format) {
        (Value::String(s), Some("date-time")) => parse_datetime(s).map(|dt| {
            Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
        }),
        (Value::String(s), _) => Some(Value::String(s.clone())),
        (Value::Number(n), None) => Some(Value::String(n.to_string())),
        (Value::Bool(b), None) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(Value::from(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
        _ => None,
    }
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent == "$" {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn mismatch(path: &str, expected: &str, value: &Value) -> Mismatch {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Mismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
