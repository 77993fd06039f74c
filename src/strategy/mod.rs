//! Replay strategy module
//!
//! Defines the Strategy pattern for complete replay pipelines: read an
//! operation CSV, drive the ledger core, audit the result, and write the
//! final account statement. Two implementations can be selected at
//! runtime: a single-threaded streaming replay and a concurrent batched
//! replay.

use crate::cli::StrategyType;
use crate::core::{Ledger, TransferCoordinator};
use crate::types::{LedgerError, Operation, ReplayError};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncReplayStrategy, ReplayConfig};
pub use sync::SyncReplayStrategy;

/// A complete replay pipeline over a fresh ledger
///
/// Implementations read operations from `input_path`, apply them through
/// the ledger core (logging and skipping rejected operations), verify
/// that every account reconciles against its transaction history, and
/// write the final statement to `output`.
///
/// # Errors
///
/// Fatal conditions only: unreadable input, runtime construction
/// failure, a failed audit, or an unwritable output. Individual rejected
/// operations and malformed rows are logged and do not fail the replay.
pub trait ReplayStrategy: Send + Sync {
    /// Replay operations from the input file and write the statement
    fn replay(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), ReplayError>;
}

/// Apply one parsed operation to the core
///
/// Shared by both strategies; routes each operation kind to the ledger
/// or the transfer coordinator.
pub fn apply_operation(
    ledger: &Ledger,
    transfers: &TransferCoordinator,
    operation: &Operation,
) -> Result<(), LedgerError> {
    match operation {
        Operation::Open {
            account,
            owner,
            account_type,
            opening_deposit,
        } => ledger
            .open_account(*account, *owner, *account_type, *opening_deposit)
            .map(|_| ()),
        Operation::Deposit {
            account,
            amount,
            description,
        } => ledger
            .deposit(*account, *amount, description.as_deref())
            .map(|_| ()),
        Operation::Withdrawal {
            account,
            amount,
            description,
        } => ledger
            .withdraw(*account, *amount, description.as_deref())
            .map(|_| ()),
        Operation::Transfer {
            source,
            dest,
            amount,
            description,
        } => transfers
            .transfer(*source, *dest, *amount, description.as_deref(), None)
            .map(|_| ()),
    }
}

/// Create a replay strategy for the given strategy type
///
/// The config only applies to the async strategy and defaults when
/// absent.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<ReplayConfig>,
) -> Box<dyn ReplayStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncReplayStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncReplayStrategy::new(config))
        }
    }
}
