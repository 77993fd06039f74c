use crate::strategy::ReplayConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay ledger operations from a CSV file
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(about = "Replay ledger operations and print the final account statement", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation rows
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Replay strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for sequential or 'async' for concurrent batches"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent workers (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of workers applying a batch (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available replay strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a ReplayConfig from CLI arguments
    ///
    /// Uses the provided values where present and falls back to defaults
    /// otherwise; zero values are rejected by `ReplayConfig::new`.
    pub fn to_replay_config(&self) -> ReplayConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = ReplayConfig::default();
            ReplayConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            ReplayConfig::default()
        }
    }
}
