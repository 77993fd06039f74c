//! Reconciliation audit over the Account Store and Transaction Log
//!
//! The Transaction Log is the source of truth: for every account the
//! stored balance must equal the signed sum of its history, and every
//! record's captured `resulting_balance` must sit on the running-balance
//! chain. The `Auditor` recomputes both from the log alone, on demand,
//! for one account or for the whole ledger.
//!
//! An audit is meaningful when the audited accounts are quiescent; a
//! reconciliation run concurrent with in-flight commits can observe a
//! balance snapshot from between two of the records it reads.

use crate::core::account_store::AccountStore;
use crate::core::transaction_log::TransactionLog;
use crate::types::{AccountId, LedgerError, Transaction};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Summary of a successful full-ledger audit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditReport {
    /// Number of accounts verified
    pub accounts_checked: usize,

    /// Number of transaction records verified across all accounts
    pub records_checked: usize,
}

/// Recomputes balances from history and verifies them against the store
#[derive(Debug)]
pub struct Auditor {
    accounts: Arc<AccountStore>,
    log: Arc<TransactionLog>,
}

impl Auditor {
    /// Create an auditor over the given store and log
    pub fn new(accounts: Arc<AccountStore>, log: Arc<TransactionLog>) -> Self {
        Auditor { accounts, log }
    }

    /// Verify one account against its transaction history
    ///
    /// Walks the history oldest first, accumulating the signed running
    /// balance and checking each record's `resulting_balance` against it,
    /// then compares the final running balance with the stored balance.
    /// Opening deposits are ordinary first transactions, so the running
    /// balance always starts from zero.
    ///
    /// # Returns
    ///
    /// The number of records verified.
    ///
    /// # Errors
    ///
    /// * `AccountNotFound` - no such account
    /// * `ResultingBalanceMismatch` - a record breaks the running chain
    /// * `ReconciliationMismatch` - the stored balance disagrees with the
    ///   recomputed sum
    pub fn reconcile(&self, account: AccountId) -> Result<usize, LedgerError> {
        let stored = self.accounts.get(account)?;

        let mut history: Vec<Transaction> = self.log.by_account(account).collect();
        history.reverse(); // oldest first

        let mut running = Decimal::ZERO;
        for record in &history {
            running += record.kind.signed(record.amount);
            if record.resulting_balance != running {
                return Err(LedgerError::ResultingBalanceMismatch {
                    account,
                    tx: record.id,
                    recorded: record.resulting_balance,
                    recomputed: running,
                });
            }
        }

        if running != stored.balance {
            return Err(LedgerError::ReconciliationMismatch {
                account,
                stored: stored.balance,
                recomputed: running,
            });
        }

        Ok(history.len())
    }

    /// Verify every account in the ledger
    ///
    /// Fails on the first account that does not reconcile.
    pub fn reconcile_all(&self) -> Result<AuditReport, LedgerError> {
        let accounts = self.accounts.all_accounts();
        let mut records_checked = 0;

        for account in &accounts {
            records_checked += self.reconcile(account.id)?;
        }

        Ok(AuditReport {
            accounts_checked: accounts.len(),
            records_checked,
        })
    }
}
