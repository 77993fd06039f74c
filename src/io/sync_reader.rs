//! Synchronous operation reader with iterator interface
//!
//! Provides a streaming iterator over ledger operations from a CSV file,
//! delegating format concerns to the `csv_format` module.
//!
//! # Design
//!
//! The SyncReader deserializes rows one at a time with `csv::Reader`, so
//! memory usage is constant in the file size. Fatal errors (file not
//! found) are returned from `new()`; individual malformed rows are
//! yielded as `Err` items carrying their line number, and iteration
//! continues with the next row.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{Operation, ReplayError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous streaming reader of operation rows
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a CSV file for streaming iteration
    ///
    /// The reader trims whitespace from all fields and allows short rows
    /// (operation kinds use different column subsets).
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the path does not exist
    /// * `Io` for any other open failure
    pub fn new(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReplayError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ReplayError::Io {
                    message: format!("failed to open '{}': {e}", path.display()),
                }
            }
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = self.reader.deserialize::<CsvRecord>();

        match rows.next()? {
            Ok(record) => {
                self.line_num += 1;
                // +1 accounts for the header row.
                let line = self.line_num + 1;
                Some(convert_csv_record(record).map_err(|message| ReplayError::Parse {
                    line: Some(line),
                    message,
                }))
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(ReplayError::Parse {
                    line: Some(self.line_num + 1),
                    message: e.to_string(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,account,owner,account_type,counterparty,amount,description\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(ReplayError::FileNotFound { .. })));
    }

    #[test]
    fn test_reader_yields_all_operation_kinds() {
        let content = format!(
            "{HEADER}\
             open,1,10,savings,,100.00,start\n\
             deposit,1,,,,25.00,salary\n\
             withdrawal,1,,,,10.00,\n\
             transfer,1,,,2,5.00,rent\n"
        );
        let file = create_temp_csv(&content);

        let ops: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(ops.len(), 4);
        assert_eq!(
            ops[0],
            Operation::Open {
                account: 1,
                owner: 10,
                account_type: AccountType::Savings,
                opening_deposit: Decimal::new(10000, 2),
            }
        );
        assert_eq!(
            ops[3],
            Operation::Transfer {
                source: 1,
                dest: 2,
                amount: Decimal::new(500, 2),
                description: Some("rent".to_string()),
            }
        );
    }

    #[test]
    fn test_reader_reports_line_numbers_and_continues() {
        let content = format!(
            "{HEADER}\
             deposit,1,,,,10.00,\n\
             deposit,2,,,,ten,\n\
             deposit,3,,,,5.00,\n"
        );
        let file = create_temp_csv(&content);

        let results: Vec<_> = SyncReader::new(file.path()).unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());

        match &results[1] {
            Err(ReplayError::Parse { line, message }) => {
                assert_eq!(*line, Some(3));
                assert!(message.contains("invalid amount"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_reader_handles_whitespace() {
        let content = format!("{HEADER}  deposit , 1 ,,,, 10.00 ,\n");
        let file = create_temp_csv(&content);

        let ops: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0],
            Operation::Deposit {
                account: 1,
                amount: Decimal::new(1000, 2),
                description: None,
            }
        );
    }

    #[test]
    fn test_reader_empty_file_after_header() {
        let file = create_temp_csv(HEADER);
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
