// Append only file format: https://redis.io/docs/latest/operate/oss_and_stack/management/persistence

use bytes::Bytes;
use std::io::BufRead;
use std::str;

use crate::classification::{Classify, RedisCommands};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::line::LineReader;
use crate::operation::Operation;

/// Decodes operations, one record at a time, out of an append only file stream.
pub struct OperationReader<R, C = RedisCommands> {
    lines: LineReader<R>,
    classifier: C,
    config: Config,
}

impl<R: BufRead> OperationReader<R> {
    pub fn new(inner: R) -> OperationReader<R> {
        OperationReader::with_classifier(inner, RedisCommands)
    }
}

impl<R: BufRead, C: Classify> OperationReader<R, C> {
    pub fn with_classifier(inner: R, classifier: C) -> OperationReader<R, C> {
        OperationReader {
            lines: LineReader::new(inner),
            classifier,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> OperationReader<R, C> {
        self.config = config;
        self
    }

    /// Reads one `$<length>\r\n<value>\r\n` parameter.
    pub fn read_parameter(&mut self) -> Result<Bytes> {
        let line = self.lines.read_line()?;
        let length = marked(&line, b'$')
            .ok_or_else(|| Error::corrupt("invalid parameter length marker"))?;

        let length = parse::<usize>(length).ok_or_else(|| {
            Error::corrupt(format!(
                "invalid parameter length value {:?}",
                String::from_utf8_lossy(length)
            ))
        })?;

        if length > self.config.max_parameter_size {
            return Err(Error::corrupt(format!(
                "declared length {} exceeds the limit of {} bytes",
                length, self.config.max_parameter_size
            )));
        }

        let value = self.lines.read_line()?;
        if value.len() != length {
            return Err(Error::corrupt(format!(
                "declared length {}, actual length {}, value {:?}",
                length,
                value.len(),
                String::from_utf8_lossy(&value)
            )));
        }

        Ok(value)
    }

    /// Reads one whole record.
    ///
    /// `Error::EndOfStream` is returned unchanged when the stream ends before the record header,
    /// which is how a log normally ends. Any failure after the header is a `CorruptRecord`
    /// wrapping its cause.
    pub fn read_operation(&mut self) -> Result<Operation> {
        let line = self.lines.read_line()?;
        let count =
            marked(&line, b'*').ok_or_else(|| Error::corrupt("invalid operation header"))?;

        let count = parse::<i64>(count).ok_or_else(|| {
            Error::corrupt(format!(
                "invalid parameter count {:?}",
                String::from_utf8_lossy(count)
            ))
        })?;

        let command = self
            .read_parameter()
            .map_err(|e| Error::wrap("command unreadable", e))?;

        let capabilities = self.classifier.classify_bytes(&command);
        let required = 1 + i64::from(capabilities.has_sub_op) + i64::from(capabilities.has_key);
        // Declared counts too small for the command are rejected before reading any further, so
        // the remaining argument count can never go negative.
        if count < required {
            return Err(Error::corrupt(format!(
                "declared {} parameters, {} requires at least {}",
                count,
                String::from_utf8_lossy(&command),
                required
            )));
        }

        let sub_op = if capabilities.has_sub_op {
            let sub_op = self
                .read_parameter()
                .map_err(|e| Error::wrap("sub-operation unreadable", e))?;
            Some(sub_op)
        } else {
            None
        };

        let key = if capabilities.has_key {
            let key = self
                .read_parameter()
                .map_err(|e| Error::wrap("key unreadable", e))?;
            Some(key)
        } else {
            None
        };

        let remaining = (count - required) as usize;
        let mut arguments = Vec::with_capacity(remaining.min(1024));
        for position in 1..=remaining {
            let argument = self.read_parameter().map_err(|e| {
                Error::wrap(format!("argument at position {} unreadable", position), e)
            })?;
            arguments.push(argument);
        }

        Ok(Operation {
            command,
            sub_op,
            key,
            arguments,
        })
    }

    /// Number of bytes consumed from the underlying stream.
    pub fn position(&self) -> u64 {
        self.lines.position()
    }

    pub fn get_ref(&self) -> &R {
        self.lines.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.lines.into_inner()
    }
}

// The rest of a line after its type marker, e.g. `2` out of `*2`.
fn marked(line: &[u8], marker: u8) -> Option<&[u8]> {
    match line.split_first() {
        Some((&first, rest)) if first == marker && !rest.is_empty() => Some(rest),
        _ => None,
    }
}

fn parse<T: str::FromStr>(digits: &[u8]) -> Option<T> {
    str::from_utf8(digits).ok()?.parse().ok()
}

/// Yields operations until the stream ends cleanly. A corrupt or truncated record is yielded as
/// an error, after which the iterator is not meant to be polled again.
impl<R: BufRead, C: Classify> Iterator for OperationReader<R, C> {
    type Item = Result<Operation>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_operation() {
            Ok(op) => Some(Ok(op)),
            Err(Error::EndOfStream) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
