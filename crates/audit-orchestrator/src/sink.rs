use audit_core::{AuditError, AuditRecord, AuditResponse};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination for completed audit records. Only the batch coordinator
/// appends, so implementations need no internal locking.
pub trait RecordSink {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError>;
}

impl RecordSink for Vec<AuditRecord> {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes success envelopes as one JSON array, flushing after every element
/// so an interrupted run leaves every finished record on disk.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    written: usize,
}

impl JsonArrayWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let file = File::create(path.as_ref()).map_err(|e| {
            AuditError::Output(format!("Cannot create {}: {}", path.as_ref().display(), e))
        })?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(mut writer: W) -> Result<Self, AuditError> {
        writer.write_all(b"[\n")?;
        writer.flush()?;
        Ok(Self { writer, written: 0 })
    }

    /// Close the array and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, AuditError> {
        if self.written > 0 {
            self.writer.write_all(b"\n")?;
        }
        self.writer.write_all(b"]\n")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for JsonArrayWriter<W> {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        let payload = serde_json::to_string(&AuditResponse::Success(record.clone()))?;
        if self.written > 0 {
            self.writer.write_all(b",\n")?;
        }
        self.writer.write_all(payload.as_bytes())?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}
