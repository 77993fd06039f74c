//! Ledger Service: the single-account operation state machine
//!
//! This module provides the `Ledger`, which validates deposits and
//! withdrawals, drives the Account Store's compare-and-apply primitive
//! with a bounded retry loop, and appends the transaction record inside
//! the same atomic commit as the balance mutation.
//!
//! # Architecture
//!
//! ```text
//! Ledger
//!     ├── Arc<AccountStore>   (balance/version state, CAS primitive)
//!     └── Arc<TransactionLog> (append-only history)
//! ```
//!
//! # Concurrency
//!
//! Operations are optimistic: the account is loaded, the signed delta
//! computed, and the commit attempted against the loaded version. A
//! `VersionConflict` means another operation committed in between; the
//! account is reloaded and the commit retried immediately (conflicts are
//! rare and cheap, so there is no backoff). After
//! [`MAX_COMMIT_ATTEMPTS`] failed attempts the operation surfaces
//! `ConcurrencyExhausted` rather than dropping the request silently.

use crate::core::account_store::AccountStore;
use crate::core::transaction_log::TransactionLog;
use crate::types::{
    Account, AccountId, AccountType, ActorId, LedgerError, Transaction, TransactionDraft,
    TransactionId, TransactionKind,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on commit attempts per operation
///
/// Conflicts only occur when another operation on the same account
/// commits between our load and our commit, so consecutive failures
/// imply heavy single-account contention; at that point the caller is
/// told instead of looping forever.
pub const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Validates and commits single-account operations
///
/// Cloning a `Ledger` is cheap and yields a handle to the same shared
/// store and log, so one instance can serve many concurrent tasks.
#[derive(Debug, Clone)]
pub struct Ledger {
    accounts: Arc<AccountStore>,
    log: Arc<TransactionLog>,
}

impl Ledger {
    /// Create a ledger over the given store and log
    ///
    /// The pair is injected rather than constructed internally so tests
    /// and embedders can share or substitute them.
    pub fn new(accounts: Arc<AccountStore>, log: Arc<TransactionLog>) -> Self {
        Ledger { accounts, log }
    }

    /// The underlying account store
    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    /// The underlying transaction log
    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Open an account, optionally funding it
    ///
    /// A non-zero `opening_deposit` is folded into the account's first
    /// transaction rather than baked into the created record, so the
    /// balance stays fully reconcilable from history alone.
    ///
    /// # Errors
    ///
    /// * `AccountExists` - the id is already taken
    /// * `NonPositiveAmount` - the opening deposit is negative
    pub fn open_account(
        &self,
        id: AccountId,
        owner: ActorId,
        account_type: AccountType,
        opening_deposit: Decimal,
    ) -> Result<Account, LedgerError> {
        if opening_deposit < Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(opening_deposit));
        }

        let account = self.accounts.open(id, owner, account_type)?;
        if opening_deposit.is_zero() {
            return Ok(account);
        }

        self.deposit(id, opening_deposit, Some("opening deposit"))?;
        self.accounts.get(id)
    }

    /// Credit `amount` to an account
    ///
    /// # Errors
    ///
    /// * `NonPositiveAmount` - amount is zero or negative
    /// * `AccountNotFound` - no such account
    /// * `ConcurrencyExhausted` - retry bound hit under contention
    pub fn deposit(
        &self,
        account: AccountId,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        self.execute(account, TransactionKind::Deposit, amount, None, None, description)
    }

    /// Debit `amount` from an account
    ///
    /// # Errors
    ///
    /// * `NonPositiveAmount` - amount is zero or negative
    /// * `AccountNotFound` - no such account
    /// * `InsufficientFunds` - the debit would overdraw the account
    /// * `ConcurrencyExhausted` - retry bound hit under contention
    pub fn withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        self.execute(
            account,
            TransactionKind::Withdrawal,
            amount,
            None,
            None,
            description,
        )
    }

    /// Validate, commit, and record one balance mutation
    ///
    /// The shared state machine behind deposits, withdrawals, and the
    /// Transfer Coordinator's legs:
    ///
    /// 1. Reject non-positive amounts.
    /// 2. Load the account (fails with `AccountNotFound`).
    /// 3. Compute the signed delta from `kind`.
    /// 4. Commit via compare-and-apply against the loaded version, with
    ///    the record appended under the same entry lock; the record's
    ///    `resulting_balance` is the post-mutation balance.
    /// 5. On `VersionConflict`, reload and retry from step 2, bounded by
    ///    [`MAX_COMMIT_ATTEMPTS`].
    pub(crate) fn execute(
        &self,
        account: AccountId,
        kind: TransactionKind,
        amount: Decimal,
        counterparty_account: Option<AccountId>,
        counterparty_tx: Option<TransactionId>,
        description: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(amount));
        }

        let delta = kind.signed(amount);
        let mut attempts = 0;

        loop {
            let current = self.accounts.get(account)?;

            let result = self
                .accounts
                .commit_with(account, current.version, delta, |updated| {
                    self.log.append(TransactionDraft {
                        account,
                        kind,
                        amount,
                        resulting_balance: updated.balance,
                        counterparty_account,
                        counterparty_tx,
                        description: description.map(str::to_string),
                    })
                });

            match result {
                Ok(record) => return Ok(record),
                Err(LedgerError::VersionConflict { expected, found, .. }) => {
                    attempts += 1;
                    if attempts >= MAX_COMMIT_ATTEMPTS {
                        warn!(
                            account,
                            attempts, "commit retries exhausted, surfacing to caller"
                        );
                        return Err(LedgerError::concurrency_exhausted(account, attempts));
                    }
                    debug!(account, expected, found, attempts, "commit conflict, retrying");
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ledger() -> Ledger {
        Ledger::new(
            Arc::new(AccountStore::new()),
            Arc::new(TransactionLog::new()),
        )
    }

    fn funded_ledger(balance: i64) -> Ledger {
        let ledger = ledger();
        ledger
            .open_account(1, 10, AccountType::Checking, Decimal::new(balance, 0))
            .unwrap();
        ledger
    }

    #[test]
    fn test_open_account_folds_opening_deposit_into_first_transaction() {
        let ledger = ledger();
        let account = ledger
            .open_account(1, 10, AccountType::Savings, Decimal::new(100, 0))
            .unwrap();

        assert_eq!(account.balance, Decimal::new(100, 0));
        assert_eq!(account.version, 2);

        let history: Vec<_> = ledger.log().by_account(1).collect();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Deposit);
        assert_eq!(history[0].amount, Decimal::new(100, 0));
        assert_eq!(history[0].description.as_deref(), Some("opening deposit"));
    }

    #[test]
    fn test_open_account_without_deposit_writes_no_records() {
        let ledger = ledger();
        let account = ledger
            .open_account(1, 10, AccountType::Checking, Decimal::ZERO)
            .unwrap();

        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.version, 1);
        assert!(ledger.log().is_empty());
    }

    #[test]
    fn test_open_account_rejects_negative_opening_deposit() {
        let ledger = ledger();
        let result = ledger.open_account(1, 10, AccountType::Checking, Decimal::new(-1, 0));
        assert!(matches!(
            result,
            Err(LedgerError::NonPositiveAmount { .. })
        ));
        assert!(ledger.accounts().get(1).is_err());
    }

    #[test]
    fn test_deposit_captures_resulting_balance() {
        let ledger = funded_ledger(100);

        let record = ledger
            .deposit(1, Decimal::new(2550, 2), Some("salary"))
            .unwrap();
        assert_eq!(record.kind, TransactionKind::Deposit);
        assert_eq!(record.amount, Decimal::new(2550, 2));
        assert_eq!(record.resulting_balance, Decimal::new(12550, 2));
        assert_eq!(record.counterparty_account, None);
        assert_eq!(record.description.as_deref(), Some("salary"));

        let account = ledger.accounts().get(1).unwrap();
        assert_eq!(account.balance, Decimal::new(12550, 2));
        assert_eq!(account.version, 3);
    }

    #[test]
    fn test_withdraw_happy_path() {
        let ledger = funded_ledger(100);

        let record = ledger.withdraw(1, Decimal::new(40, 0), None).unwrap();
        assert_eq!(record.kind, TransactionKind::Withdrawal);
        assert_eq!(record.resulting_balance, Decimal::new(60, 0));

        assert_eq!(
            ledger.accounts().get(1).unwrap().balance,
            Decimal::new(60, 0)
        );
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let ledger = funded_ledger(100);
        let record = ledger.withdraw(1, Decimal::new(100, 0), None).unwrap();
        assert_eq!(record.resulting_balance, Decimal::ZERO);
    }

    #[test]
    fn test_overdraw_leaves_no_trace() {
        let ledger = funded_ledger(100);
        let before = ledger.accounts().get(1).unwrap();
        let records_before = ledger.log().len();

        let result = ledger.withdraw(1, Decimal::new(101, 0), None);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                account: 1,
                balance: Decimal::new(100, 0),
                requested: Decimal::new(101, 0),
            })
        );

        // No new record, no balance change, no version bump.
        assert_eq!(ledger.log().len(), records_before);
        assert_eq!(ledger.accounts().get(1).unwrap(), before);
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-5, 0))]
    fn test_non_positive_amounts_rejected(#[case] amount: Decimal) {
        let ledger = funded_ledger(100);

        assert!(matches!(
            ledger.deposit(1, amount, None),
            Err(LedgerError::NonPositiveAmount { .. })
        ));
        assert!(matches!(
            ledger.withdraw(1, amount, None),
            Err(LedgerError::NonPositiveAmount { .. })
        ));
        assert_eq!(ledger.log().len(), 1); // just the opening deposit
    }

    #[test]
    fn test_operations_on_missing_account() {
        let ledger = ledger();
        assert_eq!(
            ledger.deposit(404, Decimal::ONE, None),
            Err(LedgerError::AccountNotFound { account: 404 })
        );
        assert!(ledger.log().is_empty());
    }

    #[test]
    fn test_version_counts_committed_records() {
        let ledger = funded_ledger(50);
        ledger.deposit(1, Decimal::ONE, None).unwrap();
        ledger.deposit(1, Decimal::ONE, None).unwrap();
        ledger.withdraw(1, Decimal::ONE, None).unwrap();

        let account = ledger.accounts().get(1).unwrap();
        let history = ledger.log().by_account(1).count() as u64;
        assert_eq!(account.version, history + 1);
    }
}
