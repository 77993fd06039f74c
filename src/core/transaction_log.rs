//! Transaction Log: append-only history of committed transactions
//!
//! This module provides the `TransactionLog`, the source of truth for
//! reconciliation. Records are appended exactly once, with the log
//! assigning the id and commit timestamp, and are never updated or
//! deleted; corrections exist only as new compensating records.
//!
//! # Ordering
//!
//! Ids come from a single ledger-wide monotone counter and are gapless:
//! an id is only drawn inside a commit that cannot fail afterwards, so
//! every drawn id corresponds to a retained record. Per-account order is
//! inherited from the Account Store's atomic commit: `append` runs while
//! the account's entry lock is held, so the per-account index lists
//! records in exactly the order their balance mutations committed.

use crate::types::{AccountId, Transaction, TransactionDraft, TransactionId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only store of committed transaction records
///
/// Shared across threads behind an `Arc`; all methods take `&self`.
#[derive(Debug, Default)]
pub struct TransactionLog {
    /// Committed records keyed by id
    records: DashMap<TransactionId, Transaction>,

    /// Per-account record ids in commit order (oldest first)
    account_index: DashMap<AccountId, Vec<TransactionId>>,

    /// Last assigned transaction id; 0 means none assigned yet
    next_id: AtomicU64,
}

impl TransactionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed transaction
    ///
    /// Assigns the next transaction id and the commit timestamp, stores
    /// the record, and indexes it under its account. This is the log's
    /// only write operation.
    ///
    /// Callers reach this through `AccountStore::commit_with`, which keeps
    /// the account's entry lock held across the append; that is what makes
    /// the balance mutation and this record a single logical commit.
    pub fn append(&self, draft: TransactionDraft) -> Transaction {
        // Relaxed is enough: cross-thread visibility of the record comes
        // from the DashMap inserts, and per-account id order from the
        // account entry lock held by the caller.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let record = Transaction {
            id,
            account: draft.account,
            kind: draft.kind,
            amount: draft.amount,
            resulting_balance: draft.resulting_balance,
            counterparty_account: draft.counterparty_account,
            counterparty_tx: draft.counterparty_tx,
            description: draft.description,
            created_at: Utc::now(),
        };

        self.account_index
            .entry(draft.account)
            .or_insert_with(Vec::new)
            .push(id);
        self.records.insert(id, record.clone());

        record
    }

    /// Look up a record by id
    pub fn by_id(&self, id: TransactionId) -> Option<Transaction> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    /// An account's history, newest first
    ///
    /// The returned iterator is lazy (records are resolved as it is
    /// consumed), restartable (call again for a fresh pass), and finite.
    /// It iterates the ids captured at call time; records appended
    /// afterwards are not included.
    pub fn by_account(&self, account: AccountId) -> impl Iterator<Item = Transaction> + '_ {
        let ids: Vec<TransactionId> = self
            .account_index
            .get(&account)
            .map(|entry| entry.value().iter().rev().copied().collect())
            .unwrap_or_default();

        ids.into_iter()
            .filter_map(move |id| self.records.get(&id).map(|entry| entry.value().clone()))
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
