//! Ledger Engine CLI
//!
//! Command-line interface for replaying ledger operations from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > statement.csv
//! cargo run -- --strategy sync operations.csv > statement.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 operations.csv > statement.csv
//! ```
//!
//! The program reads operation rows (open, deposit, withdrawal, transfer)
//! from the input CSV file, replays them through the ledger core with the
//! selected strategy, verifies that every account reconciles against its
//! transaction history, and writes the final account statement to stdout.
//!
//! Log verbosity is controlled through `RUST_LOG` (rejected operations
//! are logged at warn level).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing input, unreadable file, failed audit, ...)

use ledger_engine::cli;
use ledger_engine::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_replay_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    // The statement goes to stdout; logs go to stderr.
    let mut output = std::io::stdout();
    if let Err(e) = strategy.replay(&args.input_file, &mut output) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
