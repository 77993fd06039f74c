//! Error types for the ledger engine
//!
//! Two error enums cover the two layers of the crate:
//!
//! - [`LedgerError`] is the core taxonomy. Every variant is a named,
//!   structured error the presentation layer can map deterministically;
//!   no failure path in the core produces a bare string or is silently
//!   swallowed.
//! - [`ReplayError`] covers the replay driver boundary: file and CSV
//!   problems, runtime construction, and core errors that abort a replay.
//!
//! # Retryability
//!
//! - `NonPositiveAmount` / `SelfTransfer`: caller must fix the input.
//! - `AccountNotFound` / `AccountExists` / `InsufficientFunds`: terminal
//!   for the operation; business outcomes, not system faults.
//! - `VersionConflict`: transient; retried internally by the Ledger
//!   Service and invisible to callers up to the retry bound.
//! - `ConcurrencyExhausted`: the retry bound was hit; the whole operation
//!   is safe for the caller to resubmit.
//! - `CompensationFailed`: a partially-committed transfer could not be
//!   reversed. Fatal; escalate for manual reconciliation.

use super::account::AccountId;
use super::transaction::TransactionId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Core ledger error taxonomy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Operation amounts must be strictly positive
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// A transfer's source and destination must differ
    #[error("cannot transfer from account {account} to itself")]
    SelfTransfer {
        /// The account named on both sides
        account: AccountId,
    },

    /// The referenced account does not exist
    #[error("account {account} not found")]
    AccountNotFound {
        /// The missing account id
        account: AccountId,
    },

    /// An account with this id has already been opened
    #[error("account {account} already exists")]
    AccountExists {
        /// The conflicting account id
        account: AccountId,
    },

    /// A debit would take the balance below zero
    ///
    /// Only reachable for withdrawals and transfer debits; the default
    /// no-overdraft policy has no exceptions in this engine.
    #[error("insufficient funds on account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The account that would have gone negative
        account: AccountId,
        /// Balance at the time of the attempt
        balance: Decimal,
        /// Magnitude of the attempted debit
        requested: Decimal,
    },

    /// The stored version did not match the expected version
    ///
    /// Raised by compare-and-apply when another operation committed
    /// between the caller's read and its write. The Ledger Service
    /// retries these internally.
    #[error("version conflict on account {account}: expected {expected}, found {found}")]
    VersionConflict {
        /// The contended account
        account: AccountId,
        /// Version the caller read
        expected: u64,
        /// Version actually stored
        found: u64,
    },

    /// Internal retries were exhausted without a successful commit
    ///
    /// Surfaced instead of being silently dropped so the caller can
    /// resubmit the whole operation.
    #[error("gave up after {attempts} conflicting commit attempts on account {account}")]
    ConcurrencyExhausted {
        /// The contended account
        account: AccountId,
        /// Number of attempts made
        attempts: u32,
    },

    /// Balance arithmetic would overflow the decimal range
    #[error("arithmetic overflow in {operation} on account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Affected account
        account: AccountId,
    },

    /// A committed transfer debit could not be reversed
    ///
    /// The rare case where the compensation credit itself fails after the
    /// credit leg failed. Breaks the transfer-atomicity invariant until an
    /// operator intervenes, so it is surfaced loudly.
    #[error("compensation for transfer debit {debit_tx} on account {account} failed")]
    CompensationFailed {
        /// The debited source account
        account: AccountId,
        /// The committed debit leg awaiting reversal
        debit_tx: TransactionId,
        /// Why the compensation credit failed
        #[source]
        cause: Box<LedgerError>,
    },

    /// The stored balance does not equal the sum of the account's history
    #[error("account {account} does not reconcile: stored {stored}, recomputed {recomputed}")]
    ReconciliationMismatch {
        /// The account that failed the audit
        account: AccountId,
        /// Balance held by the Account Store
        stored: Decimal,
        /// Balance recomputed from the Transaction Log
        recomputed: Decimal,
    },

    /// A record's captured resulting balance breaks the running-balance chain
    #[error("transaction {tx} on account {account} recorded balance {recorded}, history gives {recomputed}")]
    ResultingBalanceMismatch {
        /// The account that failed the audit
        account: AccountId,
        /// The inconsistent record
        tx: TransactionId,
        /// `resulting_balance` captured on the record
        recorded: Decimal,
        /// Running balance recomputed from prior history
        recomputed: Decimal,
    },
}

// Helper constructors keep call sites terse.

impl LedgerError {
    /// Create a NonPositiveAmount error
    pub fn non_positive_amount(amount: Decimal) -> Self {
        LedgerError::NonPositiveAmount { amount }
    }

    /// Create a SelfTransfer error
    pub fn self_transfer(account: AccountId) -> Self {
        LedgerError::SelfTransfer { account }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        LedgerError::AccountNotFound { account }
    }

    /// Create an AccountExists error
    pub fn account_exists(account: AccountId) -> Self {
        LedgerError::AccountExists { account }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a VersionConflict error
    pub fn version_conflict(account: AccountId, expected: u64, found: u64) -> Self {
        LedgerError::VersionConflict {
            account,
            expected,
            found,
        }
    }

    /// Create a ConcurrencyExhausted error
    pub fn concurrency_exhausted(account: AccountId, attempts: u32) -> Self {
        LedgerError::ConcurrencyExhausted { account, attempts }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a CompensationFailed error
    pub fn compensation_failed(
        account: AccountId,
        debit_tx: TransactionId,
        cause: LedgerError,
    ) -> Self {
        LedgerError::CompensationFailed {
            account,
            debit_tx,
            cause: Box::new(cause),
        }
    }
}

/// Errors at the replay driver boundary
///
/// Fatal conditions abort a replay run; individual malformed rows are
/// reported as `Parse` values by the readers and logged by the
/// strategies, which then continue with the next row.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Input file not found at the specified path
    #[error("file not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while reading input or writing the statement
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// A CSV row could not be parsed or converted into an operation
    #[error("parse error{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Parse {
        /// Input line number, if known
        line: Option<u64>,
        /// Description of the problem
        message: String,
    },

    /// The async runtime could not be constructed
    #[error("runtime error: {message}")]
    Runtime {
        /// Description of the runtime failure
        message: String,
    },

    /// A core ledger error that aborts the replay (e.g. a failed audit)
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<std::io::Error> for ReplayError {
    fn from(error: std::io::Error) -> Self {
        ReplayError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ReplayError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());
        ReplayError::Parse {
            line,
            message: error.to_string(),
        }
    }
}
