//! Response decoder module
//!
//! Pulls records out of a parsed JSON response body.
//!
//! # Overview
//!
//! Record paths use a small JSONPath subset: `$`, `.name` segments and
//! `[*]` wildcards, e.g. `$[*]` or `$.data[*]`. A wildcard applied to an
//! object yields the object itself; null and empty values yield nothing.

mod path;

pub use path::{lookup, RecordPath};
