//! Output module
//!
//! Singer messages and the stdout writer.
//!
//! # Overview
//!
//! - `Message` - SCHEMA, RECORD and STATE messages
//! - `MessageWriter` - newline-delimited JSON, flushed per message
//!
//! Only messages go to stdout; logs are written to stderr by the binary.

mod message;
mod writer;

pub use message::Message;
pub use writer::{read_messages, MessageWriter};
