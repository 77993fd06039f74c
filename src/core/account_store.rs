//! Account Store: authoritative balance/version state
//!
//! This module provides the `AccountStore`, the single mutable shared
//! resource in the engine. It owns every account record and exposes one
//! conditional mutation primitive: compare-and-apply, which updates a
//! balance only if the caller's expected version matches the stored one
//! and the resulting balance stays non-negative.
//!
//! # Design
//!
//! Accounts live in a `DashMap`, giving fine-grained per-entry locking:
//! operations on different accounts never contend, while conflicting
//! commits against the same account are serialized by the entry lock and
//! ordered by the version check.
//!
//! # Atomic commit contract
//!
//! The store never writes transaction records itself; composing the
//! record append with the balance mutation is the caller's job. For that
//! purpose [`AccountStore::commit_with`] runs a caller-supplied closure
//! while the account's entry lock is still held, after the mutation has
//! been applied. A reader can therefore never observe a balance change
//! whose transaction record is not already durably appended, nor the
//! reverse.

use crate::types::{Account, AccountId, AccountType, ActorId, LedgerError};
use dashmap::{DashMap, Entry};
use rust_decimal::Decimal;

/// Result of a successful compare-and-apply
///
/// A snapshot of the balance and version immediately after the mutation,
/// taken while the entry lock was held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedMutation {
    /// Balance after the delta was applied
    pub balance: Decimal,

    /// Version after the increment
    pub version: u64,
}

/// Authoritative store of account balance state
///
/// All methods take `&self`; the store is shared across threads behind an
/// `Arc` and synchronizes internally.
#[derive(Debug, Default)]
pub struct AccountStore {
    /// Account records keyed by id
    ///
    /// DashMap shards the key space, so only commits against the same
    /// account ever contend on a lock.
    accounts: DashMap<AccountId, Account>,
}

impl AccountStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account record
    ///
    /// The new account starts with a zero balance at version 1. Opening
    /// deposits are handled by the Ledger Service so that they appear in
    /// the transaction history.
    ///
    /// # Errors
    ///
    /// Returns `AccountExists` if the id is already taken; the existing
    /// account is left untouched.
    pub fn open(
        &self,
        id: AccountId,
        owner: ActorId,
        account_type: AccountType,
    ) -> Result<Account, LedgerError> {
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(LedgerError::account_exists(id)),
            Entry::Vacant(entry) => {
                let account = Account::new(id, owner, account_type);
                entry.insert(account.clone());
                Ok(account)
            }
        }
    }

    /// Get a snapshot of an account
    ///
    /// The returned value is a copy taken under the entry lock; it may be
    /// stale by the time the caller acts on it, which is exactly what the
    /// version field exists to detect.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account has this id.
    pub fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Get all accounts sorted by id
    ///
    /// Snapshot copies, sorted for deterministic statement output.
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Conditionally apply a signed balance delta
    ///
    /// Applies `delta` to the account's balance only if the stored version
    /// equals `expected_version` and the resulting balance would not go
    /// below zero. On success the balance and version update as a single
    /// atomic step visible to all subsequent readers; on any failure
    /// nothing mutates.
    ///
    /// # Errors
    ///
    /// * `AccountNotFound` - no account has this id
    /// * `VersionConflict` - another commit won the race; reload and retry
    /// * `InsufficientFunds` - the delta would take the balance negative
    /// * `ArithmeticOverflow` - the delta would overflow the decimal range
    pub fn compare_and_apply(
        &self,
        id: AccountId,
        expected_version: u64,
        delta: Decimal,
    ) -> Result<AppliedMutation, LedgerError> {
        self.commit_with(id, expected_version, delta, |account| AppliedMutation {
            balance: account.balance,
            version: account.version,
        })
    }

    /// Compare-and-apply composed with an atomic commit action
    ///
    /// Performs the same conditional mutation as
    /// [`compare_and_apply`](Self::compare_and_apply), then invokes
    /// `commit` with the post-mutation account while the entry lock is
    /// still held. The Ledger Service passes a closure that appends the
    /// transaction record, which makes the balance update and the record
    /// one logical commit: no interleaving operation on the same account
    /// can run between them.
    ///
    /// The closure must not touch this store again (the entry lock is not
    /// reentrant) and must not fail; everything fallible belongs before
    /// the mutation.
    pub fn commit_with<T>(
        &self,
        id: AccountId,
        expected_version: u64,
        delta: Decimal,
        commit: impl FnOnce(&Account) -> T,
    ) -> Result<T, LedgerError> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        let account = entry.value_mut();

        if account.version != expected_version {
            return Err(LedgerError::version_conflict(
                id,
                expected_version,
                account.version,
            ));
        }

        let operation = if delta.is_sign_negative() {
            "debit"
        } else {
            "credit"
        };
        let new_balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::arithmetic_overflow(operation, id))?;

        if new_balance < Decimal::ZERO {
            return Err(LedgerError::insufficient_funds(id, account.balance, -delta));
        }

        account.balance = new_balance;
        account.version += 1;

        Ok(commit(account))
    }
}
