//! State management module
//!
//! Bookmarks are persisted between runs by whoever reads our STATE
//! messages and handed back through `--state`.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - bookmark tree plus `currently_syncing`
//! - Loading from a file or inline JSON

mod types;

pub use types::State;
