//! Engine types
//!
//! Configuration and statistics for the sync engine.

/// Configuration for sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Maximum records emitted per stream (0 = unlimited)
    pub max_records: usize,
    /// Only sync these streams; each must be in the catalog
    pub streams: Option<Vec<String>>,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Restrict the run to the named streams
    #[must_use]
    pub fn with_streams<I, S>(mut self, streams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.streams = Some(streams.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `emitted` records exhaust the per-stream limit
    pub fn limit_reached(&self, emitted: usize) -> bool {
        self.max_records > 0 && emitted >= self.max_records
    }

    /// Whether the stream filter lets `stream` through
    pub fn allows(&self, stream: &str) -> bool {
        self.streams
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == stream))
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Records written
    pub records_synced: usize,
    /// Pages fetched
    pub pages_fetched: usize,
    /// Streams whose records were written
    pub streams_synced: usize,
    /// Child partitions synced
    pub partitions_synced: usize,
    /// Partitions ended by a skippable error
    pub partitions_skipped: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Add a skipped partition
    pub fn add_skipped(&mut self) {
        self.partitions_skipped += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
