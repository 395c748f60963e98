use std::fmt;
use std::io::BufRead;
use tracing::{debug, info, instrument};

use crate::classification::Classify;
use crate::error::{Error, Result};
use crate::reader::OperationReader;

/// How a scanned log ends.
#[derive(Debug, PartialEq, Eq)]
pub enum Status {
    /// Every byte belongs to a complete record.
    Clean,
    /// The last record was cut short, typically by an interrupted write. The log can be repaired
    /// by truncating it at `Report::valid_len`.
    TruncatedTail,
    /// A record in the log is malformed. Everything after `Report::valid_len` is suspect.
    Corrupt(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Report {
    /// Number of complete records read.
    pub operations: usize,
    /// Byte offset right after the last complete record.
    pub valid_len: u64,
    pub status: Status,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Status::Clean => write!(f, "{} operations, log is valid", self.operations),
            Status::TruncatedTail => write!(
                f,
                "{} operations, truncated record after byte {}",
                self.operations, self.valid_len
            ),
            Status::Corrupt(detail) => write!(
                f,
                "{} operations, corrupt record after byte {}: {}",
                self.operations, self.valid_len, detail
            ),
        }
    }
}

/// Reads every record of a log to find where its valid prefix ends.
///
/// Only I/O failures are returned as errors, including those hit in the middle of a record;
/// malformed or truncated records are reported in the returned `Report`.
#[instrument(skip_all)]
pub fn scan<R: BufRead, C: Classify>(mut reader: OperationReader<R, C>) -> Result<Report> {
    let mut operations = 0;

    let (valid_len, status) = loop {
        let start = reader.position();

        match reader.read_operation() {
            Ok(_) => operations += 1,
            // A clean end leaves no partial header line behind.
            Err(Error::EndOfStream) if reader.position() == start => break (start, Status::Clean),
            // A failing device says nothing about the log itself.
            Err(err) if err.is_io() => return Err(err),
            Err(err) if err.is_truncation() => {
                debug!("truncated record at byte {}: {}", start, err.chain());
                break (start, Status::TruncatedTail);
            }
            Err(err @ Error::CorruptRecord { .. }) => {
                debug!("corrupt record at byte {}: {}", start, err.chain());
                break (start, Status::Corrupt(err.chain()));
            }
            Err(err) => return Err(err),
        }
    };

    let report = Report {
        operations,
        valid_len,
        status,
    };
    info!("{}", report);

    Ok(report)
}
