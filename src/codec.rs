use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;
use std::str;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::classification::{Classify, RedisCommands};
use crate::config::Config;
use crate::error::Error;
use crate::operation::Operation;
use crate::reader::OperationReader;
use crate::writer::OperationWriter;

/// Frames append only file records over async byte streams.
#[derive(Clone, Debug)]
pub struct AofCodec<C = RedisCommands> {
    classifier: C,
    config: Config,
    pending: Pending,
}

// How far the search for the end of the record at the front of the buffer went, kept between
// calls so that a record arriving in many chunks is looked at once, not once per chunk.
#[derive(Clone, Debug, Default)]
struct Pending {
    // Bytes already searched for line ends.
    scanned: usize,
    // Lines of the record still missing, known once its header line is complete.
    lines: Option<u64>,
}

impl Pending {
    /// Whether `src` holds every line of the record at its front. A header line that cannot be
    /// parsed counts as complete, so the decoder gets to reject it right away.
    fn complete(&mut self, src: &[u8]) -> bool {
        if self.scanned > src.len() {
            *self = Pending::default();
        }

        while let Some(offset) = src[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            self.scanned = end + 1;

            let lines = match self.lines {
                None => match header_lines(&src[..end]) {
                    Some(lines) => lines,
                    None => return true,
                },
                Some(lines) => lines - 1,
            };
            if lines == 0 {
                return true;
            }
            self.lines = Some(lines);
        }

        self.scanned = src.len();
        false
    }
}

// Lines following a `*<count>` header: two per parameter. Even a record declaring no parameters
// is only rejected once its command is read.
fn header_lines(line: &[u8]) -> Option<u64> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let count = str::from_utf8(line.strip_prefix(b"*")?)
        .ok()?
        .parse::<i64>()
        .ok()?;

    Some(count.max(1).unsigned_abs().saturating_mul(2))
}

impl AofCodec {
    pub fn new() -> AofCodec {
        AofCodec::with_classifier(RedisCommands)
    }
}

impl Default for AofCodec {
    fn default() -> Self {
        AofCodec::new()
    }
}

impl<C: Classify + Clone> AofCodec<C> {
    pub fn with_classifier(classifier: C) -> AofCodec<C> {
        AofCodec {
            classifier,
            config: Config::from_env(),
            pending: Pending::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> AofCodec<C> {
        self.config = config;
        self
    }

    // The record is not complete yet. Fails once more than a record's worth is buffered.
    fn wait_for_more(&mut self, buffered: usize) -> Result<Option<Operation>, Error> {
        if buffered > self.config.max_record_size {
            self.pending = Pending::default();
            return Err(Error::corrupt(format!(
                "record exceeds {} bytes",
                self.config.max_record_size
            )));
        }
        Ok(None)
    }
}

impl<C: Classify + Clone> Decoder for AofCodec<C> {
    type Item = Operation;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        if !self.pending.complete(&src[..]) {
            return self.wait_for_more(src.len());
        }
        self.pending = Pending::default();

        let mut reader =
            OperationReader::with_classifier(Cursor::new(&src[..]), self.classifier.clone())
                .with_config(self.config);

        let op = match reader.read_operation() {
            Ok(op) => op,
            Err(err) if err.is_truncation() => return self.wait_for_more(src.len()),
            Err(err) => return Err(err),
        };

        let position: usize = reader
            .position()
            .try_into()
            .map_err(|_| Error::corrupt("record position is too large"))?;

        // Remove the decoded record from the buffer.
        src.advance(position);

        Ok(Some(op))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(op) => Ok(Some(op)),
            None if buf.is_empty() => Ok(None),
            None => {
                debug!("{} trailing bytes at end of stream", buf.len());
                Err(Error::wrap(
                    "truncated record at end of stream",
                    Error::EndOfStream,
                ))
            }
        }
    }
}

impl<C: Classify + Clone> Encoder<&Operation> for AofCodec<C> {
    type Error = Error;

    fn encode(&mut self, item: &Operation, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut writer = OperationWriter::with_classifier(dst.writer(), &self.classifier);
        writer.write_operation(item)
    }
}

impl<C: Classify + Clone> Encoder<Operation> for AofCodec<C> {
    type Error = Error;

    fn encode(&mut self, item: Operation, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&Operation>::encode(self, &item, dst)
    }
}
