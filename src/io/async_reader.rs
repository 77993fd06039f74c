//! Asynchronous operation reader with batch interface
//!
//! Provides batched reading of ledger operations from a CSV source for
//! the concurrent replay strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures' `AsyncRead` so any async byte source works (the strategy
//!   feeds it a tokio file through a compat wrapper)
//!
//! Malformed rows are logged and skipped so one bad row never aborts a
//! replay batch.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous batched reader of operation rows
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader over an async byte source
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` operations
    ///
    /// Malformed rows are logged at warn level and skipped. An empty
    /// vector signals end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match rows.next().await {
                Some(Ok(record)) => match convert_csv_record(record) {
                    Ok(operation) => batch.push(operation),
                    Err(message) => warn!(%message, "skipping malformed operation row"),
                },
                Some(Err(e)) => warn!(error = %e, "skipping unparsable CSV row"),
                None => break,
            }
        }

        batch
    }
}
