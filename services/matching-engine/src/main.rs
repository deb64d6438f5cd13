//! Engine binary: recover, then serve the line protocol over stdio.
//!
//! Diagnostics go to stderr; stdout carries exactly one JSON response per
//! request line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use matching_engine::engine::{MatchingEngine, DEFAULT_SNAPSHOT_INTERVAL};
use matching_engine::protocol;

#[derive(Parser)]
#[command(name = "matching-engine", about = "Limit order book matching engine")]
struct Args {
    /// Append-only event log file; omit to run without durability
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Directory for periodic snapshots; omit to disable snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Number of events between periodic snapshots
    #[arg(long, default_value_t = DEFAULT_SNAPSHOT_INTERVAL)]
    snapshot_interval: u64,
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut engine = MatchingEngine::new(args.event_log, args.snapshot_dir, args.snapshot_interval);

    if engine.recover() {
        tracing::info!("recovered from existing state");
    } else {
        tracing::info!("starting fresh");
    }
    tracing::info!("ready, reading commands from stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let outcome = protocol::handle_line(&mut engine, &line);
        writeln!(out, "{}", outcome.response)?;
        out.flush()?;

        if outcome.shutdown {
            tracing::info!("shutdown requested");
            break;
        }
    }

    engine.flush();
    tracing::info!("exiting");
    Ok(())
}
