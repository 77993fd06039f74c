//! I/O module
//!
//! Handles operation CSV parsing and statement output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, statement output)
//! - `sync_reader` - Synchronous reader with iterator interface
//! - `async_reader` - Asynchronous reader with batch interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_csv_record, write_statement_csv, CsvRecord};
pub use sync_reader::SyncReader;
