use crate::domain::record::TransactionRecord;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RecordRow<'a> {
    id: String,
    recipient: &'a str,
    amount: String,
    remarks: &'a str,
    status: String,
    score: u8,
    level: String,
    action: String,
}

impl<'a> From<&'a TransactionRecord> for RecordRow<'a> {
    fn from(record: &'a TransactionRecord) -> Self {
        let risk = record.risk_result();
        Self {
            id: record.id().to_string(),
            recipient: record.recipient().as_str(),
            amount: record.amount().to_string(),
            remarks: record.remarks().unwrap_or_default(),
            status: record.status().to_string(),
            score: risk.score,
            level: risk.level.to_string(),
            action: risk.recommended_action.to_string(),
        }
    }
}

const HEADER: [&str; 8] = [
    "id", "recipient", "amount", "remarks", "status", "score", "level", "action",
];

/// Writes finished transaction records as CSV, one row per record.
///
/// The header is always emitted, even when no record is written before `flush`.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self {
            writer,
            header_written: false,
        }
    }

    pub fn write_record(&mut self, record: &TransactionRecord) -> Result<()> {
        self.ensure_header()?;
        self.writer.serialize(RecordRow::from(record))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.ensure_header()?;
        self.writer.flush()?;
        Ok(())
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }
}
