//! Ledger Engine Library
//! # Overview
//!
//! This library provides a concurrency-safe ledger core — per-account
//! balances plus an append-only transaction history that the balances are
//! always exactly reconcilable from — together with a CSV replay driver
//! offering both a sync and an async strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, Operation, errors)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Ledger components:
//!   - [`core::account_store`] - Balance/version state with a
//!     compare-and-apply mutation primitive
//!   - [`core::transaction_log`] - Append-only history, source of truth
//!     for reconciliation
//!   - [`core::ledger`] - Deposit/withdrawal state machine with bounded
//!     optimistic retry
//!   - [`core::transfer`] - Two-leg transfers with compensation and
//!     idempotent resubmission
//!   - [`core::audit`] - Balance reconciliation against history
//! - [`io`] - Operation CSV parsing (sync and async) and statement output
//! - [`strategy`] - Pluggable replay strategies over the shared core
//!
//! # Operations
//!
//! A replay input row is one of four operations:
//!
//! - **open**: create an account, optionally funding it with an opening
//!   deposit recorded as its first transaction
//! - **deposit**: credit funds to an account
//! - **withdrawal**: debit funds (requires sufficient balance)
//! - **transfer**: move funds between two accounts as one indivisible
//!   operation; a failed credit leg is compensated, never half-applied
//!
//! # Concurrency
//!
//! Each account carries a version incremented on every committed
//! mutation; all writes go through a compare-and-apply that rejects stale
//! versions, and the transaction record is appended under the same
//! per-account lock as the balance update. There is no global lock.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::core::{
    AccountStore, AuditReport, Auditor, Ledger, TransactionLog, Transfer, TransferCoordinator,
};
pub use crate::io::write_statement_csv;
pub use crate::types::{
    Account, AccountId, AccountType, ActorId, LedgerError, Operation, ReplayError, Transaction,
    TransactionId, TransactionKind,
};
