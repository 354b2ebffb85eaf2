//! Schema module
//!
//! Stream schema declarations and record transformation.
//!
//! # Features
//!
//! - **Typed Builders**: nullable-by-default properties, nested objects and arrays
//! - **Type Coercion**: numeric strings, stringified numbers, booleans
//! - **Timestamp Normalization**: `date-time` strings rewritten as RFC 3339 UTC
//! - **Field Filtering**: undeclared and deselected fields are dropped

mod transform;
mod types;

pub use transform::{Mismatch, Transformer};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};

#[cfg(test)]
mod tests;
