use futures::StreamExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tokio_util::codec::FramedRead;
use tracing::{info, instrument, warn};

use crate::check::{self, Report, Status};
use crate::codec::AofCodec;
use crate::config::Config;
use crate::error::Result;
use crate::reader::OperationReader;
use crate::writer::OperationWriter;

/// Prints one line per operation of the log whose key matches `pattern`. Returns the number of
/// printed operations.
#[instrument(skip(pattern, out))]
pub async fn dump<W: Write>(path: &Path, pattern: Option<&str>, out: &mut W) -> Result<usize> {
    let file = tokio::fs::File::open(path).await?;
    let mut frames = FramedRead::new(file, AofCodec::new());
    let mut printed = 0;

    while let Some(op) = frames.next().await {
        let op = op?;
        if pattern.map_or(true, |pattern| op.matches(pattern)) {
            writeln!(out, "{}", op)?;
            printed += 1;
        }
    }

    Ok(printed)
}

/// Scans the log and, when `fix` is set and the log ends with a truncated record, cuts the
/// truncated record off. Corrupt logs are never modified.
#[instrument]
pub fn check(path: &Path, fix: bool) -> Result<Report> {
    let file = File::open(path)?;
    let reader = OperationReader::new(BufReader::new(file)).with_config(Config::from_env());
    let report = check::scan(reader)?;

    match report.status {
        Status::TruncatedTail if fix => {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(report.valid_len)?;
            file.sync_all()?;
            warn!("truncated {:?} to {} bytes", path, report.valid_len);
        }
        Status::Corrupt(_) if fix => {
            warn!("{:?} is corrupt before its last record, not fixing it", path);
        }
        _ => {}
    }

    Ok(report)
}

/// Re-encodes every operation of `input` into `output`, keeping keyless operations and those
/// whose key matches `pattern`. Returns the number of written operations.
#[instrument(skip(pattern))]
pub fn rewrite(input: &Path, output: &Path, pattern: Option<&str>) -> Result<usize> {
    let reader =
        OperationReader::new(BufReader::new(File::open(input)?)).with_config(Config::from_env());
    let mut writer = OperationWriter::new(BufWriter::new(File::create(output)?));
    let mut written = 0;
    let mut skipped = 0;

    for op in reader {
        let op = op?;
        if pattern.map_or(true, |pattern| op.matches(pattern)) {
            writer.write_operation(&op)?;
            written += 1;
        } else {
            skipped += 1;
        }
    }

    writer.flush()?;
    info!("wrote {} operations, skipped {}", written, skipped);

    Ok(written)
}
