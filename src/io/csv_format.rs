//! CSV format handling for operation input and statement output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to [`Operation`] values
//! - Final account statement serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input format
//!
//! ```text
//! op,account,owner,account_type,counterparty,amount,description
//! open,1,10,checking,,100.00,opening balance
//! deposit,1,,,,25.00,salary
//! withdrawal,1,,,,10.00,
//! transfer,1,,,2,5.00,rent
//! ```
//!
//! `owner` and `account_type` are only read for `open` rows (the type
//! defaults to `checking`); `counterparty` is the transfer destination.
//! Amount positivity is validated by the ledger core, not here.

use crate::types::{Account, AccountId, AccountType, ActorId, Operation, ReplayError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format; most fields are optional because each
/// operation kind uses a different subset of columns.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub account: AccountId,
    pub owner: Option<ActorId>,
    pub account_type: Option<String>,
    pub counterparty: Option<AccountId>,
    pub amount: Option<String>,
    pub description: Option<String>,
}

fn parse_amount(raw: &Option<String>) -> Result<Option<Decimal>, String> {
    match raw {
        Some(text) if !text.trim().is_empty() => {
            let trimmed = text.trim();
            Decimal::from_str(trimmed)
                .map(Some)
                .map_err(|_| format!("invalid amount '{trimmed}'"))
        }
        _ => Ok(None),
    }
}

/// Convert a CsvRecord to an Operation
///
/// This function:
/// - Parses the operation kind string
/// - Parses the amount string into a Decimal (when present)
/// - Validates that the columns each operation kind requires are present
///
/// Positivity of amounts and existence of accounts are deliberately left
/// to the core, which re-validates them on every operation.
pub fn convert_csv_record(record: CsvRecord) -> Result<Operation, String> {
    let amount = parse_amount(&record.amount)
        .map_err(|e| format!("{e} for account {}", record.account))?;

    match record.op.to_lowercase().as_str() {
        "open" => {
            let owner = record
                .owner
                .ok_or_else(|| format!("open of account {} requires an owner", record.account))?;
            let account_type = match record.account_type.as_deref().map(str::trim) {
                None | Some("") => AccountType::Checking,
                Some(raw) => match raw.to_lowercase().as_str() {
                    "checking" => AccountType::Checking,
                    "savings" => AccountType::Savings,
                    other => return Err(format!("invalid account type '{other}'")),
                },
            };
            Ok(Operation::Open {
                account: record.account,
                owner,
                account_type,
                opening_deposit: amount.unwrap_or(Decimal::ZERO),
            })
        }
        "deposit" => Ok(Operation::Deposit {
            account: record.account,
            amount: amount.ok_or_else(|| {
                format!("deposit to account {} requires an amount", record.account)
            })?,
            description: record.description,
        }),
        "withdrawal" => Ok(Operation::Withdrawal {
            account: record.account,
            amount: amount.ok_or_else(|| {
                format!(
                    "withdrawal from account {} requires an amount",
                    record.account
                )
            })?,
            description: record.description,
        }),
        "transfer" => Ok(Operation::Transfer {
            source: record.account,
            dest: record.counterparty.ok_or_else(|| {
                format!(
                    "transfer from account {} requires a counterparty",
                    record.account
                )
            })?,
            amount: amount.ok_or_else(|| {
                format!(
                    "transfer from account {} requires an amount",
                    record.account
                )
            })?,
            description: record.description,
        }),
        other => Err(format!("invalid operation '{other}'")),
    }
}

/// Write the final account statement in CSV format
///
/// Columns: account, owner, account_type, balance, version. Accounts are
/// written sorted by id for deterministic output; balances are printed
/// with four decimal places.
pub fn write_statement_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), ReplayError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "owner", "account_type", "balance", "version"])
        .map_err(|e| ReplayError::Io {
            message: format!("failed to write statement header: {e}"),
        })?;

    let mut sorted = accounts.to_vec();
    sorted.sort_by_key(|account| account.id);

    for account in sorted {
        writer
            .write_record(&[
                account.id.to_string(),
                account.owner.to_string(),
                account.account_type.to_string(),
                format!("{:.4}", account.balance),
                account.version.to_string(),
            ])
            .map_err(|e| ReplayError::Io {
                message: format!("failed to write statement record: {e}"),
            })?;
    }

    writer.flush().map_err(|e| ReplayError::Io {
        message: format!("failed to flush statement: {e}"),
    })?;

    Ok(())
}
