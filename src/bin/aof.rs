use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

use rustaof::check::Status;
use rustaof::{tools, Error};

#[derive(Parser, Debug)]
#[command(about = "Inspect and repair Redis append only files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every operation, one per line
    Dump {
        path: PathBuf,
        /// Only print operations whose key matches this glob pattern
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Verify that every record of the file is complete and well formed
    Check {
        path: PathBuf,
        /// Truncate the file at the last complete record when its tail is truncated
        #[arg(long)]
        fix: bool,
    },
    /// Re-encode the file, optionally keeping only the keys matching a glob pattern
    Rewrite {
        input: PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        pattern: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();

    match run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e.chain());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<ExitCode, Error> {
    match command {
        Command::Dump { path, pattern } => {
            let mut stdout = io::stdout().lock();
            tools::dump(&path, pattern.as_deref(), &mut stdout).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { path, fix } => {
            let report = tools::check(&path, fix)?;
            println!("{}", report);
            match report.status {
                Status::Clean => Ok(ExitCode::SUCCESS),
                Status::TruncatedTail if fix => Ok(ExitCode::SUCCESS),
                _ => Ok(ExitCode::FAILURE),
            }
        }
        Command::Rewrite {
            input,
            output,
            pattern,
        } => {
            let written = tools::rewrite(&input, &output, pattern.as_deref())?;
            println!("{} operations written to {}", written, output.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
