//! Concurrency and invariant tests over the ledger core
//!
//! These tests exercise the core's guarantees under real thread-level
//! interleaving: per-account totals under concurrent deposits, the
//! no-overdraft rule under racing withdrawals, deadlock freedom of
//! opposing transfers, and reconciliation of every balance from the
//! transaction history afterwards.
//!
//! Operations are retried when the core reports `ConcurrencyExhausted`;
//! that error means "resubmit the whole operation", which is exactly what
//! a real caller would do, and these workloads contend far harder on
//! single accounts than the low-contention traffic the retry bound is
//! tuned for.

use ledger_engine::core::{AccountStore, Auditor, Ledger, TransactionLog, TransferCoordinator};
use ledger_engine::types::{AccountType, LedgerError, Transaction};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn core() -> (Ledger, Arc<TransferCoordinator>, Auditor) {
    let accounts = Arc::new(AccountStore::new());
    let log = Arc::new(TransactionLog::new());
    let ledger = Ledger::new(Arc::clone(&accounts), Arc::clone(&log));
    let transfers = Arc::new(TransferCoordinator::new(ledger.clone()));
    let auditor = Auditor::new(accounts, log);
    (ledger, transfers, auditor)
}

/// Deposit, resubmitting if internal retries are exhausted
fn deposit_settled(ledger: &Ledger, account: u64, amount: Decimal) -> Transaction {
    loop {
        match ledger.deposit(account, amount, None) {
            Ok(record) => return record,
            Err(LedgerError::ConcurrencyExhausted { .. }) => continue,
            Err(e) => panic!("unexpected deposit failure: {e}"),
        }
    }
}

/// Withdraw, resubmitting if internal retries are exhausted
///
/// Terminal outcomes (success or insufficient funds) are returned.
fn withdraw_settled(
    ledger: &Ledger,
    account: u64,
    amount: Decimal,
) -> Result<Transaction, LedgerError> {
    loop {
        match ledger.withdraw(account, amount, None) {
            Err(LedgerError::ConcurrencyExhausted { .. }) => continue,
            outcome => return outcome,
        }
    }
}

#[test]
fn concurrent_deposits_accumulate_exactly() {
    let (ledger, _transfers, auditor) = core();
    ledger
        .open_account(1, 10, AccountType::Checking, Decimal::ZERO)
        .unwrap();

    const THREADS: usize = 8;
    const DEPOSITS_PER_THREAD: usize = 25;
    let amount = Decimal::new(125, 2); // 1.25

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..DEPOSITS_PER_THREAD {
                    deposit_settled(&ledger, 1, amount);
                }
            });
        }
    });

    let account = ledger.accounts().get(1).unwrap();
    let total = THREADS * DEPOSITS_PER_THREAD;
    assert_eq!(account.balance, amount * Decimal::from(total as u64));
    assert_eq!(account.version, total as u64 + 1);
    assert_eq!(ledger.log().len(), total);
    assert_eq!(auditor.reconcile(1), Ok(total));
}

#[test]
fn racing_withdrawals_never_overdraw() {
    let (ledger, _transfers, auditor) = core();
    ledger
        .open_account(1, 10, AccountType::Checking, Decimal::new(1000, 2)) // 10.00
        .unwrap();

    const ATTEMPTS: usize = 20;
    let amount = Decimal::new(100, 2); // 1.00
    let succeeded = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..ATTEMPTS {
            scope.spawn(|| match withdraw_settled(&ledger, 1, amount) {
                Ok(_) => {
                    succeeded.fetch_add(1, Ordering::Relaxed);
                }
                Err(LedgerError::InsufficientFunds { .. }) => {
                    rejected.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => panic!("unexpected withdrawal failure: {e}"),
            });
        }
    });

    // Exactly the covered withdrawals commit; the rest bounce.
    assert_eq!(succeeded.load(Ordering::Relaxed), 10);
    assert_eq!(rejected.load(Ordering::Relaxed), 10);

    let account = ledger.accounts().get(1).unwrap();
    assert_eq!(account.balance, Decimal::ZERO);
    // Opening deposit plus the ten committed withdrawals.
    assert_eq!(ledger.log().len(), 11);
    assert_eq!(auditor.reconcile(1), Ok(11));
}

#[test]
fn transfer_moves_funds_atomically() {
    let (ledger, transfers, auditor) = core();
    ledger
        .open_account(1, 10, AccountType::Checking, Decimal::new(100, 0))
        .unwrap();
    ledger
        .open_account(2, 20, AccountType::Checking, Decimal::new(50, 0))
        .unwrap();

    let transfer = transfers
        .transfer(1, 2, Decimal::new(30, 0), None, None)
        .unwrap();

    assert_eq!(
        ledger.accounts().get(1).unwrap().balance,
        Decimal::new(70, 0)
    );
    assert_eq!(
        ledger.accounts().get(2).unwrap().balance,
        Decimal::new(80, 0)
    );
    assert_eq!(transfer.credit.counterparty_tx, Some(transfer.debit.id));
    assert_eq!(transfer.debit.counterparty_account, Some(2));
    assert_eq!(transfer.credit.counterparty_account, Some(1));
    assert_eq!(ledger.log().len(), 4); // two openings, two legs
    assert!(auditor.reconcile_all().is_ok());
}

#[test]
fn opposing_concurrent_transfers_complete() {
    let (ledger, transfers, auditor) = core();
    let opening = Decimal::new(100000, 2); // 1000.00
    ledger
        .open_account(1, 10, AccountType::Checking, opening)
        .unwrap();
    ledger
        .open_account(2, 20, AccountType::Checking, opening)
        .unwrap();

    const ROUNDS: usize = 50;
    let amount = Decimal::new(100, 2); // 1.00

    thread::scope(|scope| {
        for (source, dest) in [(1, 2), (2, 1)] {
            let transfers = Arc::clone(&transfers);
            scope.spawn(move || {
                for _ in 0..ROUNDS {
                    loop {
                        match transfers.transfer(source, dest, amount, None, None) {
                            Ok(_) => break,
                            Err(LedgerError::ConcurrencyExhausted { .. }) => continue,
                            Err(e) => panic!("unexpected transfer failure: {e}"),
                        }
                    }
                }
            });
        }
    });

    // Both directions completed; equal counts cancel out and nothing was
    // created or destroyed along the way.
    let first = ledger.accounts().get(1).unwrap().balance;
    let second = ledger.accounts().get(2).unwrap().balance;
    assert_eq!(first, opening);
    assert_eq!(second, opening);
    assert!(auditor.reconcile_all().is_ok());
}

#[test]
fn mixed_concurrent_workload_conserves_funds() {
    let (ledger, transfers, auditor) = core();
    let opening = Decimal::new(100, 0);
    for account in 1..=4u64 {
        ledger
            .open_account(account, account * 10, AccountType::Checking, opening)
            .unwrap();
    }

    const DEPOSITS: usize = 10;
    const TRANSFERS: usize = 10;
    let deposit_amount = Decimal::new(100, 2); // 1.00
    let transfer_amount = Decimal::new(500, 2); // 5.00

    thread::scope(|scope| {
        for worker in 0..4u64 {
            let ledger = ledger.clone();
            let transfers = Arc::clone(&transfers);
            scope.spawn(move || {
                let account = worker + 1;
                let next = (worker + 1) % 4 + 1;
                for _ in 0..DEPOSITS {
                    deposit_settled(&ledger, account, deposit_amount);
                }
                for _ in 0..TRANSFERS {
                    loop {
                        match transfers.transfer(account, next, transfer_amount, None, None) {
                            Ok(_) => break,
                            Err(LedgerError::ConcurrencyExhausted { .. }) => continue,
                            // A transient shortfall is a legitimate
                            // outcome of this interleaving; move on.
                            Err(LedgerError::InsufficientFunds { .. }) => break,
                            Err(e) => panic!("unexpected transfer failure: {e}"),
                        }
                    }
                }
            });
        }
    });

    let accounts = ledger.accounts().all_accounts();
    let total: Decimal = accounts.iter().map(|a| a.balance).sum();
    let deposited = deposit_amount * Decimal::from((4 * DEPOSITS) as u64);
    assert_eq!(total, opening * Decimal::from(4u64) + deposited);
    assert!(accounts.iter().all(|a| a.balance >= Decimal::ZERO));

    let report = auditor.reconcile_all().unwrap();
    assert_eq!(report.accounts_checked, 4);
    assert_eq!(report.records_checked, ledger.log().len());
}
