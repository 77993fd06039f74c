//! Asynchronous batched replay strategy
//!
//! Concurrent replay of an operation file against the shared,
//! thread-safe ledger core.
//!
//! # Architecture
//!
//! ```text
//! AsyncReplayStrategy
//!     ├── ReplayConfig   (batch_size, max_concurrent_batches)
//!     ├── AsyncReader    (batched CSV reading)
//!     └── BatchReplayer  (account partitioning + tokio tasks)
//!         ├── Ledger               (shared AccountStore + TransactionLog)
//!         └── Arc<TransferCoordinator>
//! ```
//!
//! # Ordering
//!
//! Batches are processed sequentially so that per-account submission
//! order holds across the whole file. Within a batch, `open` operations
//! are applied first in file order (an account must exist before any
//! operation can reference it), then the remaining operations are
//! partitioned by primary account — the debited source for transfers —
//! and the partitions run concurrently as tokio tasks. Cross-account
//! effects (transfer credits) synchronize through the Account Store's
//! compare-and-apply; no partitioning is needed for them to be safe.

use crate::core::{AccountStore, Auditor, Ledger, TransactionLog, TransferCoordinator};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_statement_csv;
use crate::strategy::{apply_operation, ReplayStrategy};
use crate::types::{AccountId, LedgerError, Operation, ReplayError};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batched replay
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Maximum number of worker threads applying a batch
    pub max_concurrent_batches: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a config, falling back to defaults on zero values
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches 0, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Result of applying a single replayed operation
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// The operation that was applied
    pub operation: Operation,

    /// How the core answered
    pub result: Result<(), LedgerError>,
}

/// Applies batches of operations with per-account partitioning
///
/// Cloneable; all clones share the same underlying ledger.
#[derive(Debug, Clone)]
pub struct BatchReplayer {
    ledger: Ledger,
    transfers: Arc<TransferCoordinator>,
}

impl BatchReplayer {
    /// Create a replayer over the given ledger and coordinator
    pub fn new(ledger: Ledger, transfers: Arc<TransferCoordinator>) -> Self {
        Self { ledger, transfers }
    }

    /// Partition operations by their primary account
    ///
    /// Each operation lands in exactly one partition; operations within a
    /// partition keep their original order, which preserves per-account
    /// submission order once partitions are applied sequentially.
    pub fn partition_by_account(
        &self,
        batch: Vec<Operation>,
    ) -> HashMap<AccountId, Vec<Operation>> {
        let mut partitions: HashMap<AccountId, Vec<Operation>> = HashMap::new();

        for operation in batch {
            partitions
                .entry(operation.primary_account())
                .or_default()
                .push(operation);
        }

        partitions
    }

    /// Apply one partition's operations in order
    async fn apply_partition(&self, operations: Vec<Operation>) -> Vec<ReplayOutcome> {
        let mut outcomes = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = apply_operation(&self.ledger, &self.transfers, &operation);
            outcomes.push(ReplayOutcome { operation, result });
        }

        outcomes
    }

    /// Apply a whole batch
    ///
    /// Opens run first, sequentially in file order; the rest fans out as
    /// one tokio task per primary account. All outcomes are returned,
    /// rejected operations included.
    pub async fn replay_batch(&self, batch: Vec<Operation>) -> Vec<ReplayOutcome> {
        let (opens, rest): (Vec<Operation>, Vec<Operation>) = batch
            .into_iter()
            .partition(|operation| matches!(operation, Operation::Open { .. }));

        let mut outcomes = Vec::new();
        for operation in opens {
            let result = apply_operation(&self.ledger, &self.transfers, &operation);
            outcomes.push(ReplayOutcome { operation, result });
        }

        let mut tasks = Vec::new();
        for (_account, operations) in self.partition_by_account(rest) {
            let replayer = self.clone();
            tasks.push(tokio::spawn(async move {
                replayer.apply_partition(operations).await
            }));
        }

        for task in tasks {
            match task.await {
                Ok(partition_outcomes) => outcomes.extend(partition_outcomes),
                Err(e) => warn!(error = %e, "replay task panicked"),
            }
        }

        outcomes
    }
}

/// Asynchronous batched replay strategy
///
/// Reads the input in batches and applies each batch concurrently,
/// partitioned by primary account, before reading the next. The same
/// audit runs at the end as in the sync strategy.
#[derive(Debug, Clone)]
pub struct AsyncReplayStrategy {
    config: ReplayConfig,
}

impl AsyncReplayStrategy {
    /// Create a strategy with the given batch configuration
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }
}

impl ReplayStrategy for AsyncReplayStrategy {
    fn replay(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), ReplayError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| ReplayError::Runtime {
                message: format!("failed to create tokio runtime: {e}"),
            })?;

        runtime.block_on(async {
            let accounts = Arc::new(AccountStore::new());
            let log = Arc::new(TransactionLog::new());
            let ledger = Ledger::new(Arc::clone(&accounts), Arc::clone(&log));
            let transfers = Arc::new(TransferCoordinator::new(ledger.clone()));
            let replayer = BatchReplayer::new(ledger, transfers);

            let file = tokio::fs::File::open(input_path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReplayError::FileNotFound {
                        path: input_path.display().to_string(),
                    }
                } else {
                    ReplayError::Io {
                        message: format!("failed to open '{}': {e}", input_path.display()),
                    }
                }
            })?;

            // csv-async speaks futures' AsyncRead, tokio files don't.
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            // Batches run back to back so per-account order holds across
            // the whole file even when an account spans batches.
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for outcome in replayer.replay_batch(batch).await {
                    if let Err(error) = outcome.result {
                        warn!(%error, operation = ?outcome.operation, "operation rejected");
                    }
                }
            }

            let report = Auditor::new(Arc::clone(&accounts), log).reconcile_all()?;
            info!(
                accounts = report.accounts_checked,
                records = report.records_checked,
                "replay reconciled"
            );

            write_statement_csv(&accounts.all_accounts(), output)
        })
    }
}
