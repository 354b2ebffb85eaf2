//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - drives the streams of a [`Tap`] selected in a catalog
//! - `SyncConfig` - per-run options (stream filter, record limit)
//! - `SyncStats` - counters for the run
//!
//! Streams are synced one at a time in catalog order, parents before their
//! children. Every page is awaited before the next request is built. Any
//! error that the stream does not declare skippable aborts the run.

mod types;

pub use types::{SyncConfig, SyncStats};

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::parse_datetime;
use crate::decode::{lookup, RecordPath};
use crate::error::{Error, Result};
use crate::http::RequestExecutor;
use crate::output::{Message, MessageWriter};
use crate::schema::Transformer;
use crate::state::State;
use crate::taps::{Partition, StreamContext, Tap, TapStream};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, warn};

type Selection<'c> = HashMap<&'c str, &'c CatalogEntry>;

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<E> {
    /// Request executor, usually a retrying HTTP client
    executor: E,
    /// Bookmarks, updated as records are written
    state: State,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl<E: RequestExecutor> SyncEngine<E> {
    /// Create a new sync engine
    pub fn new(executor: E, state: State) -> Self {
        Self {
            executor,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Take the final state
    pub fn into_state(self) -> State {
        self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every selected stream of `tap`, writing messages to `writer`
    ///
    /// A final STATE message with `currently_syncing` cleared is written
    /// after the last stream.
    pub async fn run<W: Write>(
        &mut self,
        tap: &Tap,
        catalog: &Catalog,
        writer: &mut MessageWriter<W>,
    ) -> Result<()> {
        let start = Instant::now();
        let selection = self.selection(tap, catalog)?;
        let mut visited: Vec<&str> = Vec::new();

        for entry in &catalog.streams {
            let Some(stream) = tap.stream(&entry.tap_stream_id) else {
                continue;
            };
            let root = stream.parent().and_then(|p| tap.stream(p)).unwrap_or(stream);
            if visited.contains(&root.name()) {
                continue;
            }
            visited.push(root.name());
            self.sync_family(tap, root, &selection, writer).await?;
        }

        self.state.set_currently_syncing(None);
        self.write_state(writer)?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            tap = %tap.kind(),
            streams = self.stats.streams_synced,
            records = self.stats.records_synced,
            pages = self.stats.pages_fetched,
            duration_ms = self.stats.duration_ms,
            "sync completed"
        );
        Ok(())
    }

    /// Selected catalog entries this tap can serve, narrowed by the stream filter
    fn selection<'c>(&self, tap: &Tap, catalog: &'c Catalog) -> Result<Selection<'c>> {
        if let Some(names) = &self.config.streams {
            if let Some(missing) = names.iter().find(|n| catalog.get(n).is_none()) {
                return Err(Error::StreamNotFound {
                    stream: missing.clone(),
                });
            }
        }

        let mut selection = HashMap::new();
        for entry in catalog.selected() {
            if tap.stream(&entry.tap_stream_id).is_none() {
                warn!(
                    stream = %entry.tap_stream_id,
                    tap = %tap.kind(),
                    "catalog stream is not provided by this tap, ignoring"
                );
                continue;
            }
            if self.config.allows(&entry.tap_stream_id) {
                selection.insert(entry.tap_stream_id.as_str(), entry);
            }
        }
        Ok(selection)
    }

    /// Sync a top-level stream and then each of its selected children
    async fn sync_family<W: Write>(
        &mut self,
        tap: &Tap,
        stream: &dyn TapStream,
        selection: &Selection<'_>,
        writer: &mut MessageWriter<W>,
    ) -> Result<()> {
        let entry = selection.get(stream.name()).copied();
        let children: Vec<(&dyn TapStream, &CatalogEntry)> = tap
            .children_of(stream.name())
            .filter_map(|child| {
                selection
                    .get(child.name())
                    .map(|e| (child as &dyn TapStream, *e))
            })
            .collect();

        if entry.is_none() && children.is_empty() {
            debug!(stream = stream.name(), "not selected");
            return Ok(());
        }

        if let Some(entry) = entry {
            self.write_schema(entry, writer)?;
        } else {
            info!(
                stream = stream.name(),
                "fetching unselected parent for its child streams"
            );
        }

        self.state.set_currently_syncing(Some(stream.name()));
        let mut emitted = 0;
        let partitions = self
            .sync_partition(
                stream,
                entry,
                None,
                !children.is_empty(),
                writer,
                &mut emitted,
            )
            .await?;

        if entry.is_some() {
            self.finish_stream(stream.name(), emitted, writer)?;
        }

        for (child, child_entry) in children {
            self.write_schema(child_entry, writer)?;
            self.state.set_currently_syncing(Some(child.name()));

            let mut emitted = 0;
            for partition in &partitions {
                if self.config.limit_reached(emitted) {
                    break;
                }
                self.sync_partition(
                    child,
                    Some(child_entry),
                    Some(partition),
                    false,
                    writer,
                    &mut emitted,
                )
                .await?;
                self.stats.add_partition();
            }

            self.finish_stream(child.name(), emitted, writer)?;
        }

        Ok(())
    }

    /// Page through one stream (or one partition of a child stream)
    ///
    /// Records are written only when `entry` is given. Returns the child
    /// partitions of every record read when `collect_children` is set.
    async fn sync_partition<W: Write>(
        &mut self,
        stream: &dyn TapStream,
        entry: Option<&CatalogEntry>,
        partition: Option<&Partition>,
        collect_children: bool,
        writer: &mut MessageWriter<W>,
        emitted: &mut usize,
    ) -> Result<Vec<Partition>> {
        let records_path = RecordPath::parse(stream.records_path())?;
        let transformer = entry.map(|e| Transformer::new(&e.schema).without_fields(e.deselected_fields()));
        let mut children = Vec::new();

        let mut ctx = StreamContext::new(&self.state);
        if let Some(partition) = partition {
            ctx = ctx.with_partition(partition);
        }
        let mut request = Some(stream.first_request(&ctx)?);

        while let Some(current) = request.take() {
            let response = match self.executor.execute(&current).await {
                Ok(response) => response,
                Err(e) if stream.is_skippable(&e) => {
                    warn!(
                        stream = stream.name(),
                        path = %current.path,
                        error = %e,
                        "skipping partition"
                    );
                    self.stats.add_skipped();
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            self.stats.add_page();
            let time_extracted = Utc::now();

            let records = records_path.extract(&response.body);
            debug!(
                stream = stream.name(),
                path = %current.path,
                records = records.len(),
                "page fetched"
            );
            if records.is_empty() {
                break;
            }

            let mut limited = false;
            for record in records {
                let record = stream.post_process(record, partition);

                if let Some(transformer) = &transformer {
                    if self.config.limit_reached(*emitted) {
                        limited = true;
                        break;
                    }
                    let record = transformer
                        .transform(&record)
                        .map_err(|m| Error::transform(stream.name(), m.to_string()))?;
                    self.advance_bookmark(stream, &record)?;
                    writer.write(&Message::record(stream.name(), record, Some(time_extracted)))?;
                    *emitted += 1;
                    self.stats.add_records(1);
                }

                if collect_children {
                    children.extend(stream.child_partition(&record));
                }
            }

            if limited || (transformer.is_some() && self.config.limit_reached(*emitted)) {
                info!(
                    stream = stream.name(),
                    max_records = self.config.max_records,
                    "record limit reached"
                );
                break;
            }

            request = stream.next_request(&current, &response);
        }

        Ok(children)
    }

    /// Move the stream bookmark forward to the record's replication value
    fn advance_bookmark(&mut self, stream: &dyn TapStream, record: &Value) -> Result<()> {
        let Some(key) = stream.replication_key() else {
            return Ok(());
        };
        let Some(value) = lookup(record, key).filter(|v| !v.is_null()) else {
            return Ok(());
        };

        let path = stream.bookmark_path();
        let newer = self
            .state
            .get_bookmark(&path)
            .map_or(true, |current| is_after(value, current));
        if newer {
            self.state.set_bookmark(&path, value.clone())?;
        }
        Ok(())
    }

    fn write_schema<W: Write>(
        &self,
        entry: &CatalogEntry,
        writer: &mut MessageWriter<W>,
    ) -> Result<()> {
        let message = Message::schema(
            entry.tap_stream_id.clone(),
            entry.schema.clone(),
            entry.key_properties.clone(),
        )
        .with_bookmark_properties(entry.replication_key.iter().cloned().collect());
        writer.write(&message)
    }

    fn write_state<W: Write>(&self, writer: &mut MessageWriter<W>) -> Result<()> {
        writer.write(&Message::state(self.state.to_value()))
    }

    fn finish_stream<W: Write>(
        &mut self,
        stream: &str,
        emitted: usize,
        writer: &mut MessageWriter<W>,
    ) -> Result<()> {
        self.stats.add_stream();
        info!(stream, records = emitted, "stream completed");
        self.write_state(writer)
    }
}

/// Order replication values: timestamps by time, numbers numerically,
/// anything else by its JSON text
fn is_after(candidate: &Value, current: &Value) -> bool {
    let as_time = |v: &Value| v.as_str().and_then(parse_datetime);
    if let (Some(a), Some(b)) = (as_time(candidate), as_time(current)) {
        return a > b;
    }
    if let (Some(a), Some(b)) = (candidate.as_f64(), current.as_f64()) {
        return a > b;
    }
    match (candidate, current) {
        (Value::String(a), Value::String(b)) => a > b,
        (a, b) => a.to_string() > b.to_string(),
    }
}
