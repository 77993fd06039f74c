//! Types module
//!
//! Contains core data structures used throughout the crate.
//! This module organizes types into logical submodules:
//! - `account`: account state and identifiers
//! - `transaction`: committed records, drafts, and requested operations
//! - `error`: core and driver error taxonomies

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, AccountType, ActorId};
pub use error::{LedgerError, ReplayError};
pub use transaction::{Operation, Transaction, TransactionDraft, TransactionId, TransactionKind};
