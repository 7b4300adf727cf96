use anyhow::{Result, anyhow};
use std::io::IsTerminal;
use tracing::Level;

/// Sink for the human-readable run transcript. Passed into every component
/// that reports decisions so tests can capture output without a global
/// subscriber.
pub trait Log {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to the process-wide `tracing` subscriber installed by [`init`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

fn max_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

/// Install the stdout subscriber. Lines carry no timestamp so a dry run and a
/// real run over the same tree print identical transcripts.
pub fn init(verbose: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_max_level(max_level(verbose))
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))
}

#[cfg(test)]
pub use memory::{LogLine, MemoryLog};
