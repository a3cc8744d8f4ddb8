//! `uptime logs` subcommands.

use std::io::{self, Write};

use clap::Subcommand;

use uptime_core::logs::LogArchive;
use uptime_core::RotationReport;

#[derive(Subcommand, Debug)]
pub enum LogsAction {
    /// List log ids
    List {
        /// Include archived (compressed) logs
        #[arg(long)]
        all: bool,
    },
    /// Print a log; archived logs are decompressed
    Show {
        id: String,
        /// Read the archived form instead of the active log
        #[arg(long)]
        archived: bool,
    },
    /// Append one line to an active log
    Append { id: String, line: String },
    /// Compress an active log into a new archive id
    Compress { source: String, dest: String },
    /// Empty an active log without removing it
    Truncate { id: String },
}

pub async fn run(archive: &LogArchive, action: LogsAction) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        LogsAction::List { all } => {
            for id in archive.list(all).await? {
                writeln!(out, "{id}")?;
            }
        }
        LogsAction::Show { id, archived } => {
            let text = if archived {
                archive.decompress(&id).await?
            } else {
                archive.read_active(&id).await?
            };
            write!(out, "{text}")?;
        }
        LogsAction::Append { id, line } => {
            archive.append(&id, &line).await?;
        }
        LogsAction::Compress { source, dest } => {
            archive.compress(&source, &dest).await?;
            writeln!(out, "{source} -> {dest}")?;
        }
        LogsAction::Truncate { id } => {
            archive.truncate(&id).await?;
        }
    }
    Ok(())
}

pub fn print_report(report: &RotationReport) -> io::Result<()> {
    let mut out = io::stdout();
    for rotated in &report.rotated {
        writeln!(out, "rotated  {} -> {}", rotated.source, rotated.archive)?;
    }
    for id in &report.skipped_empty {
        writeln!(out, "skipped  {id} (empty)")?;
    }
    for failure in &report.failed {
        writeln!(out, "FAILED   {}: {}", failure.id, failure.reason)?;
    }
    Ok(())
}
