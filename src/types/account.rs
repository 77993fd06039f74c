//! Account-related types for the ledger engine
//!
//! This module defines the Account structure and related identifiers
//! for tracking per-account balance state.

use rust_decimal::Decimal;
use std::fmt;

/// Account identifier
///
/// Unique within a ledger instance, fixed at creation, immutable.
pub type AccountId = u64;

/// Actor (account owner) identifier
///
/// Supplied by the authentication collaborator; the ledger never
/// interprets it beyond storing it on the account record.
pub type ActorId = u64;

/// Closed set of account types
///
/// Informational only: the kind of an account never changes which ledger
/// rules apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    /// Day-to-day account
    Checking,

    /// Savings account
    Savings,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Checking => write!(f, "checking"),
            AccountType::Savings => write!(f, "savings"),
        }
    }
}

/// Authoritative balance state for one account
///
/// An account is created once via the Account Store and mutated only
/// through the store's compare-and-apply primitive. The `version` field
/// drives optimistic concurrency control: every committed balance
/// mutation increments it by exactly one, so two concurrent operations
/// can never both succeed against the same version.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account id, fixed at creation
    pub id: AccountId,

    /// The owning actor, fixed at creation
    pub owner: ActorId,

    /// Informational account kind
    pub account_type: AccountType,

    /// Current balance
    ///
    /// Fixed-point decimal; never negative (the default no-overdraft
    /// policy is the only policy this engine implements).
    pub balance: Decimal,

    /// Optimistic concurrency version
    ///
    /// Starts at 1 when the account is opened and increments on every
    /// committed mutation, so `version - 1` always equals the number of
    /// committed transactions for this account.
    pub version: u64,
}

impl Account {
    /// Create a new account with a zero balance at version 1
    ///
    /// Opening deposits are not part of account creation: they are folded
    /// into the account's first transaction by the Ledger Service, which
    /// keeps the balance fully reconcilable from the transaction history.
    pub fn new(id: AccountId, owner: ActorId, account_type: AccountType) -> Self {
        Account {
            id,
            owner,
            account_type,
            balance: Decimal::ZERO,
            version: 1,
        }
    }
}
