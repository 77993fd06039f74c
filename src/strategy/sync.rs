//! Synchronous replay strategy
//!
//! Single-threaded streaming replay: operations are read one at a time
//! and applied in file order against the shared core. This is the
//! reference execution — the async strategy must produce the same
//! statement for any input whose operations on each account are
//! order-independent across accounts.

use crate::core::{AccountStore, Auditor, Ledger, TransactionLog, TransferCoordinator};
use crate::io::csv_format::write_statement_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{apply_operation, ReplayStrategy};
use crate::types::ReplayError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous replay strategy
///
/// Stateless; each `replay` call builds a fresh ledger.
#[derive(Debug, Clone, Copy)]
pub struct SyncReplayStrategy;

impl ReplayStrategy for SyncReplayStrategy {
    /// Replay the file sequentially, audit, and write the statement
    ///
    /// Rejected operations (insufficient funds, unknown accounts, ...)
    /// and malformed rows are logged at warn level and skipped; the
    /// replay only fails on fatal I/O problems or a failed audit.
    fn replay(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), ReplayError> {
        let accounts = Arc::new(AccountStore::new());
        let log = Arc::new(TransactionLog::new());
        let ledger = Ledger::new(Arc::clone(&accounts), Arc::clone(&log));
        let transfers = TransferCoordinator::new(ledger.clone());

        let reader = SyncReader::new(input_path)?;
        for result in reader {
            match result {
                Ok(operation) => {
                    if let Err(error) = apply_operation(&ledger, &transfers, &operation) {
                        warn!(%error, ?operation, "operation rejected");
                    }
                }
                Err(error) => warn!(%error, "skipping malformed row"),
            }
        }

        let report = Auditor::new(Arc::clone(&accounts), log).reconcile_all()?;
        info!(
            accounts = report.accounts_checked,
            records = report.records_checked,
            "replay reconciled"
        );

        write_statement_csv(&accounts.all_accounts(), output)
    }
}
