//! Transaction-related types for the ledger engine
//!
//! This module defines the immutable transaction record, the draft form
//! handed to the Transaction Log for id/timestamp assignment, and the
//! driver-facing `Operation` request enum.

use super::account::{AccountId, AccountType, ActorId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Transaction identifier
///
/// Assigned by the Transaction Log from a ledger-wide monotone sequence.
pub type TransactionId = u64;

/// Kinds of committed transactions
///
/// `amount` is always stored as a positive magnitude; the kind determines
/// whether it credits or debits the account it is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account; requires sufficient balance
    Withdrawal,

    /// The debit leg of a transfer, recorded against the source account
    TransferOut,

    /// The credit leg of a transfer, recorded against the destination
    /// account (also used for the compensation record that credits a
    /// debited source back when the credit leg cannot commit)
    TransferIn,
}

impl TransactionKind {
    /// Whether this kind credits the account it is recorded against
    pub fn is_credit(self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::TransferIn)
    }

    /// The signed balance effect of a record of this kind
    pub fn signed(self, amount: Decimal) -> Decimal {
        if self.is_credit() {
            amount
        } else {
            -amount
        }
    }
}

/// One committed, immutable ledger record
///
/// Created exactly once per committed operation and never updated or
/// deleted; corrections are modeled as new compensating transactions.
/// `resulting_balance` is captured atomically with the balance mutation
/// and is never recomputed later.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Ledger-wide unique id, assigned at append
    pub id: TransactionId,

    /// The account debited or credited by this record
    pub account: AccountId,

    /// What kind of mutation this record represents
    pub kind: TransactionKind,

    /// Positive magnitude; sign is determined by `kind`
    pub amount: Decimal,

    /// The account's balance immediately after this record was applied
    pub resulting_balance: Decimal,

    /// The other account of a transfer; `None` for deposits/withdrawals
    pub counterparty_account: Option<AccountId>,

    /// For a credit leg or a compensation record, the id of the debit leg
    /// it pairs with. The debit leg itself carries `None` here: it commits
    /// before the credit leg's id exists and records are never edited.
    pub counterparty_tx: Option<TransactionId>,

    /// Free-text note, optional
    pub description: Option<String>,

    /// Commit timestamp, assigned at append
    pub created_at: DateTime<Utc>,
}

/// A transaction minus the fields the Transaction Log assigns
///
/// Built by the Ledger Service inside the atomic commit; `append` turns it
/// into a [`Transaction`] by stamping the id and timestamp.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub account: AccountId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub resulting_balance: Decimal,
    pub counterparty_account: Option<AccountId>,
    pub counterparty_tx: Option<TransactionId>,
    pub description: Option<String>,
}

/// A requested ledger operation, as parsed from a replay input row
///
/// This is the already-validated request shape the core consumes; the
/// presentation/validation collaborators (here, the CSV driver) produce it.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create an account; a non-zero `opening_deposit` is folded into the
    /// account's first transaction
    Open {
        account: AccountId,
        owner: ActorId,
        account_type: AccountType,
        opening_deposit: Decimal,
    },

    /// Credit `amount` to `account`
    Deposit {
        account: AccountId,
        amount: Decimal,
        description: Option<String>,
    },

    /// Debit `amount` from `account`
    Withdrawal {
        account: AccountId,
        amount: Decimal,
        description: Option<String>,
    },

    /// Move `amount` from `source` to `dest` as one indivisible operation
    Transfer {
        source: AccountId,
        dest: AccountId,
        amount: Decimal,
        description: Option<String>,
    },
}

impl Operation {
    /// The primary account of this operation
    ///
    /// Used by the concurrent replay driver to partition work: operations
    /// sharing a primary account are applied in submission order. For a
    /// transfer the primary account is the debited source; the credit side
    /// synchronizes through the Account Store instead.
    pub fn primary_account(&self) -> AccountId {
        match self {
            Operation::Open { account, .. } => *account,
            Operation::Deposit { account, .. } => *account,
            Operation::Withdrawal { account, .. } => *account,
            Operation::Transfer { source, .. } => *source,
        }
    }
}
