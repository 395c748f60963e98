use std::io::Write;

use crate::classification::{Classify, RedisCommands};
use crate::error::{Error, Result};
use crate::operation::Operation;

static CRLF: &[u8; 2] = b"\r\n";

/// Encodes operations into the append only file framing.
pub struct OperationWriter<W, C = RedisCommands> {
    inner: W,
    classifier: C,
}

impl<W: Write> OperationWriter<W> {
    pub fn new(inner: W) -> OperationWriter<W> {
        OperationWriter::with_classifier(inner, RedisCommands)
    }
}

impl<W: Write, C: Classify> OperationWriter<W, C> {
    pub fn with_classifier(inner: W, classifier: C) -> OperationWriter<W, C> {
        OperationWriter { inner, classifier }
    }

    /// Writes `*<count>\r\n` followed by the command, the sub-operation and the key when the
    /// command takes them, and every argument. An unset sub-operation or key is written as an
    /// empty parameter; a key set on a keyless command is not written at all.
    pub fn write_operation(&mut self, op: &Operation) -> Result<()> {
        let capabilities = self.classifier.classify_bytes(&op.command);
        let count = op.parameter_count(&self.classifier);

        self.write_checked(format!("*{}\r\n", count).as_bytes())?;
        self.write_parameter(&op.command)?;

        if capabilities.has_sub_op {
            self.write_parameter(op.sub_op.as_deref().unwrap_or_default())?;
        }

        if capabilities.has_key {
            self.write_parameter(op.key.as_deref().unwrap_or_default())?;
        }

        for argument in &op.arguments {
            self.write_parameter(argument)?;
        }

        Ok(())
    }

    /// Writes `$<length>\r\n<value>\r\n`. The value may hold any byte but `\n`, which no reader
    /// could tell apart from the end of the value line.
    pub fn write_parameter(&mut self, value: &[u8]) -> Result<()> {
        self.write_checked(format!("${}\r\n", value.len()).as_bytes())?;

        let mut bytes = Vec::with_capacity(value.len() + CRLF.len());
        bytes.extend_from_slice(value);
        bytes.extend_from_slice(CRLF);
        self.write_checked(&bytes)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    // A single `write` call; accepting fewer bytes than given is an error, not a retry.
    fn write_checked(&mut self, bytes: &[u8]) -> Result<()> {
        let written = self.inner.write(bytes)?;
        if written != bytes.len() {
            return Err(Error::ShortWrite {
                expected: bytes.len(),
                actual: written,
            });
        }
        Ok(())
    }
}
