//! Newline-delimited JSON message writer

use super::message::Message;
use crate::error::{Error, Result};
use std::io::{self, Stdout, Write};

/// Writes one JSON message per line and flushes after each
#[derive(Debug)]
pub struct MessageWriter<W: Write> {
    inner: W,
    written: usize,
}

impl MessageWriter<Stdout> {
    /// Writer over the process stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> MessageWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Write one message
    pub fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.inner, message)?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Messages written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Parse NDJSON output back into messages, skipping blank lines
pub fn read_messages(output: &str) -> Result<Vec<Message>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<Message>(line).map_err(Error::from))
        .collect()
}
