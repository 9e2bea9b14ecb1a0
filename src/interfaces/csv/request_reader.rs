use crate::domain::draft::DraftInput;
use crate::error::{Result, TriageError};
use std::io::Read;

/// Reads raw payment requests from a CSV source.
///
/// Expects a `recipient,amount,remarks` header. Rows are yielded unvalidated:
/// validation belongs to the workflow, which reports it per row.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Creates a new `RequestReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes requests, one per row.
    pub fn requests(self) -> impl Iterator<Item = Result<DraftInput>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(TriageError::from))
    }
}
