use std::io;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// The underlying stream had no more bytes. Only meaningful as a record boundary when it is
    /// returned before the first byte of a record header was consumed.
    #[error("end of stream")]
    EndOfStream,
    /// A structural violation: bad marker, non-numeric length or count, length mismatch, or a
    /// failure while reading a nested parameter.
    #[error("corrupt record: {detail}")]
    CorruptRecord {
        detail: String,
        #[source]
        source: Option<Box<Error>>,
    },
    #[error("short write: expected to write {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Error::CorruptRecord {
            detail: detail.into(),
            source: None,
        }
    }

    pub fn wrap(detail: impl Into<String>, cause: Error) -> Self {
        Error::CorruptRecord {
            detail: detail.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }

    /// Returns true when the stream ran out of bytes somewhere inside this error chain, that is,
    /// the record was cut short rather than malformed.
    pub fn is_truncation(&self) -> bool {
        match self {
            Error::EndOfStream => true,
            Error::CorruptRecord {
                source: Some(cause),
                ..
            } => cause.is_truncation(),
            _ => false,
        }
    }

    /// Returns true when an I/O failure of the underlying stream is somewhere inside this error
    /// chain. Such a record may be perfectly fine on disk.
    pub fn is_io(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::CorruptRecord {
                source: Some(cause),
                ..
            } => cause.is_io(),
            _ => false,
        }
    }

    /// The detail of a `CorruptRecord` followed by the details of every wrapped cause.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            current = cause.source();
        }
        message
    }
}
