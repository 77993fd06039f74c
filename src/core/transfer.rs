//! Transfer Coordinator: two-account atomic debit/credit
//!
//! This module provides the `TransferCoordinator`, which moves funds
//! between two accounts as one indivisible operation built from two
//! single-account legs, both committed through the Ledger Service's
//! compare-and-apply discipline.
//!
//! # State machine
//!
//! A transfer is `PENDING` only as the in-flight call; nothing is
//! persisted for that state. The debit commits first, then the credit:
//!
//! ```text
//! PENDING → SOURCE_DEBITED → DEST_CREDITED   (success)
//!           SOURCE_DEBITED → COMPENSATED     (credit failed)
//! ```
//!
//! If the credit fails after the debit committed, the coordinator credits
//! the source back with a new compensating record referencing the debit
//! leg, then surfaces the credit's failure. A "failed" transfer therefore
//! leaves two records (debit + compensation) in the log on purpose: the
//! attempt stays auditable instead of being hidden.
//!
//! # Deadlock freedom
//!
//! Legs commit one at a time; no account lock is ever held while another
//! is acquired, so two concurrent opposing transfers (X→Y and Y→X) cannot
//! block each other. The deterministic smaller-id-first acquisition order
//! the pessimistic alternative would need is discharged trivially here.

use crate::core::ledger::Ledger;
use crate::types::{AccountId, LedgerError, Transaction, TransactionKind};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, warn};

/// Both committed legs of a successful transfer
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// The TRANSFER_OUT record on the source account
    pub debit: Transaction,

    /// The TRANSFER_IN record on the destination account
    pub credit: Transaction,
}

/// Dedupe key for idempotent transfer submission
///
/// A resubmission only counts as a duplicate when the caller's key AND
/// the operation parameters match; the same key with different
/// parameters is a different operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransferKey {
    source: AccountId,
    dest: AccountId,
    amount: Decimal,
    key: String,
}

/// Orchestrates two-leg transfers over a [`Ledger`]
#[derive(Debug)]
pub struct TransferCoordinator {
    ledger: Ledger,

    /// Successful transfers by idempotency key
    ///
    /// Only successes are cached: a failed transfer must stay retryable,
    /// and its compensation already keeps the ledger consistent.
    completed: DashMap<TransferKey, Transfer>,
}

impl TransferCoordinator {
    /// Create a coordinator over the given ledger
    pub fn new(ledger: Ledger) -> Self {
        TransferCoordinator {
            ledger,
            completed: DashMap::new(),
        }
    }

    /// The ledger the coordinator commits through
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Move `amount` from `source` to `dest`
    ///
    /// With an `idempotency_key`, a resubmission of an already-successful
    /// transfer returns the original legs without moving funds again.
    ///
    /// # Errors
    ///
    /// * `SelfTransfer` / `NonPositiveAmount` - invalid request, nothing
    ///   committed
    /// * `AccountNotFound` / `InsufficientFunds` on the debit leg -
    ///   aborted with no state change
    /// * any credit-leg failure - surfaced after the source has been
    ///   compensated; the log then holds the debit and its reversal
    /// * `CompensationFailed` - the reversal itself failed; manual
    ///   reconciliation required
    pub fn transfer(
        &self,
        source: AccountId,
        dest: AccountId,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> Result<Transfer, LedgerError> {
        if source == dest {
            return Err(LedgerError::self_transfer(source));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(amount));
        }

        let dedupe_key = idempotency_key.map(|key| TransferKey {
            source,
            dest,
            amount,
            key: key.to_string(),
        });
        if let Some(key) = &dedupe_key {
            if let Some(existing) = self.completed.get(key) {
                return Ok(existing.value().clone());
            }
        }

        // Debit leg first: it is the only leg that can fail on funds, and
        // failing before any commit leaves nothing to unwind.
        let debit = self.ledger.execute(
            source,
            TransactionKind::TransferOut,
            amount,
            Some(dest),
            None,
            description,
        )?;

        let credit = match self.ledger.execute(
            dest,
            TransactionKind::TransferIn,
            amount,
            Some(source),
            Some(debit.id),
            description,
        ) {
            Ok(credit) => credit,
            Err(credit_failure) => {
                self.compensate(&debit, dest)?;
                return Err(credit_failure);
            }
        };

        let transfer = Transfer { debit, credit };
        if let Some(key) = dedupe_key {
            self.completed.insert(key, transfer.clone());
        }
        Ok(transfer)
    }

    /// Reverse a committed debit after its credit leg failed
    ///
    /// Records a fresh TRANSFER_IN back to the source referencing the
    /// debit leg; the original debit record stays untouched.
    fn compensate(&self, debit: &Transaction, dest: AccountId) -> Result<(), LedgerError> {
        warn!(
            source = debit.account,
            dest,
            debit_tx = debit.id,
            "credit leg failed, compensating source"
        );

        let description = format!("reversal of transfer {}", debit.id);
        match self.ledger.execute(
            debit.account,
            TransactionKind::TransferIn,
            debit.amount,
            Some(dest),
            Some(debit.id),
            Some(&description),
        ) {
            Ok(_) => Ok(()),
            Err(cause) => {
                // The ledger now holds an unreversed debit. Nothing more
                // can be done in-process; escalate.
                error!(
                    source = debit.account,
                    debit_tx = debit.id,
                    %cause,
                    "compensation failed, manual reconciliation required"
                );
                Err(LedgerError::compensation_failed(
                    debit.account,
                    debit.id,
                    cause,
                ))
            }
        }
    }
}
