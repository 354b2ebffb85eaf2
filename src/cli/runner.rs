//! CLI runner - executes commands

use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{SyncConfig, SyncEngine};
use crate::error::{Error, Result, ResultExt};
use crate::http::{RequestExecutor, RetryPolicy, Retrying};
use crate::output::MessageWriter;
use crate::state::State;
use crate::taps::Tap;
use serde_json::{json, Value};
use std::io::{self, Write};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    retry: RetryPolicy,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Build the tap from `--tap` and `--config`
    pub fn load_tap(&self) -> Result<Tap> {
        let config = TapConfig::from_file(&self.cli.config)?;
        Tap::new(self.cli.tap, &config)
    }

    /// Run the CLI command against stdout
    pub async fn run(&self) -> Result<()> {
        let tap = self.load_tap()?;
        self.execute(&tap, io::stdout()).await
    }

    /// Run the CLI command, writing its output to `out`
    pub async fn execute<W: Write>(&self, tap: &Tap, out: W) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.discover(tap, out),
            Commands::Sync {
                streams,
                max_records,
            } => self.sync(tap, streams, *max_records, out).await,
            Commands::Check => self.check(tap, out).await,
            Commands::Streams => self.streams(tap, out),
        }
    }

    fn load_state(&self) -> Result<State> {
        match &self.cli.state {
            Some(path) => State::from_file(path)
                .with_context(|| format!("Failed to load state {}", path.display())),
            None => Ok(State::new()),
        }
    }

    fn load_catalog(&self, tap: &Tap) -> Result<Catalog> {
        match &self.cli.catalog {
            Some(path) => Catalog::from_file(path)
                .with_context(|| format!("Failed to load catalog {}", path.display())),
            None => Ok(tap.discover()),
        }
    }

    fn executor(&self, tap: &Tap) -> Result<impl RequestExecutor> {
        Ok(Retrying::new(tap.http_client()?, self.retry.clone()))
    }

    /// Print the discovered catalog
    fn discover<W: Write>(&self, tap: &Tap, mut out: W) -> Result<()> {
        let catalog = tap.discover();
        writeln!(out, "{}", catalog.to_json_pretty()?)?;
        Ok(())
    }

    /// Sync selected streams as Singer messages
    async fn sync<W: Write>(
        &self,
        tap: &Tap,
        streams: &[String],
        max_records: Option<usize>,
        out: W,
    ) -> Result<()> {
        let state = self.load_state()?;
        let catalog = self.load_catalog(tap)?;

        let mut config = SyncConfig::new().with_max_records(max_records.unwrap_or(0));
        let names: Vec<&str> = streams
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !names.is_empty() {
            config = config.with_streams(names);
        }

        info!(tap = %tap.kind(), "starting sync");
        let mut engine = SyncEngine::new(self.executor(tap)?, state).with_config(config);
        let mut writer = MessageWriter::new(out);
        engine.run(tap, &catalog, &mut writer).await
    }

    /// Issue the tap's check request
    async fn check<W: Write>(&self, tap: &Tap, mut out: W) -> Result<()> {
        let executor = self.executor(tap)?;
        info!(tap = %tap.kind(), path = %tap.check_request().path, "checking connection");

        match executor.execute(tap.check_request()).await {
            Ok(_) => {
                write_json(
                    &mut out,
                    &json!({
                        "type": "CONNECTION_STATUS",
                        "connectionStatus": {
                            "status": "SUCCEEDED",
                            "message": "Connection successful"
                        }
                    }),
                )?;
                Ok(())
            }
            Err(e) => {
                write_json(
                    &mut out,
                    &json!({
                        "type": "CONNECTION_STATUS",
                        "connectionStatus": {
                            "status": "FAILED",
                            "message": e.to_string()
                        }
                    }),
                )?;
                Err(Error::Api(e))
            }
        }
    }

    /// List stream names
    fn streams<W: Write>(&self, tap: &Tap, mut out: W) -> Result<()> {
        write_json(
            &mut out,
            &json!({
                "type": "STREAMS",
                "tap": tap.kind().as_str(),
                "streams": tap.stream_names()
            }),
        )
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
