use bytes::Bytes;
use std::io::BufRead;

use crate::error::{Error, Result};

/// Reads `\n` terminated lines out of a buffered byte stream.
pub struct LineReader<R> {
    inner: R,
    // Total number of bytes consumed from `inner`, partial lines included.
    position: u64,
    buffer: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> LineReader<R> {
        LineReader {
            inner,
            position: 0,
            buffer: Vec::with_capacity(64),
        }
    }

    /// Reads the next line, without its trailing `\n` and, if present, the `\r` before it. The
    /// content is returned as is, it does not need to be UTF-8.
    ///
    /// Returns `Error::EndOfStream` both when the stream is exhausted at a line boundary and when
    /// it is exhausted in the middle of a line. Callers tell the two apart by comparing
    /// `position` before and after the call.
    pub fn read_line(&mut self) -> Result<Bytes> {
        self.buffer.clear();
        let read = self.inner.read_until(b'\n', &mut self.buffer)?;
        self.position += read as u64;

        if read == 0 || self.buffer.last() != Some(&b'\n') {
            return Err(Error::EndOfStream);
        }

        self.buffer.pop();
        if self.buffer.last() == Some(&b'\r') {
            self.buffer.pop();
        }

        Ok(Bytes::from(std::mem::take(&mut self.buffer)))
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
