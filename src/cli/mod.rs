//! CLI module
//!
//! Command-line interface for running taps.
//!
//! # Commands
//!
//! - `discover` - Print the catalog
//! - `sync` - Emit SCHEMA, RECORD and STATE messages for selected streams
//! - `check` - Test the credentials against the API
//! - `streams` - List stream names

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
