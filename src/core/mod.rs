//! Core ledger components
//!
//! This module contains the concurrency-safe ledger core:
//! - `account_store` - authoritative balance/version state and the
//!   compare-and-apply primitive
//! - `transaction_log` - append-only transaction history
//! - `ledger` - deposit/withdrawal state machine with bounded retry
//! - `transfer` - two-leg transfer orchestration with compensation
//! - `audit` - reconciliation of stored balances against history

pub mod account_store;
pub mod audit;
pub mod ledger;
pub mod transaction_log;
pub mod transfer;

pub use account_store::{AccountStore, AppliedMutation};
pub use audit::{AuditReport, Auditor};
pub use ledger::{Ledger, MAX_COMMIT_ATTEMPTS};
pub use transaction_log::TransactionLog;
pub use transfer::{Transfer, TransferCoordinator};
