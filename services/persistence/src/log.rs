//! Append-only event log
//!
//! One JSON object per line, newline-terminated, flushed after every append
//! so a reader that opens the file afresh sees every record. Records are
//! self-describing (each carries its own sequence), and the file is strictly
//! append-only; truncating or reordering it is undefined behavior.
//!
//! The writer is guarded by a mutex so concurrent appends cannot interleave
//! partial lines, though in this system only the engine writes.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use types::event::Event;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Append-only durable sequence of events with monotonic sequence numbers
///
/// When constructed without a path the log is a no-op sink and all reads
/// return empty. The in-memory sequence counter tracks the largest sequence
/// the log has minted; [`EventLog::next_sequence`] pre-increments it.
pub struct EventLog {
    path: Option<PathBuf>,
    writer: Option<Mutex<BufWriter<File>>>,
    sequence: u64,
}

impl EventLog {
    /// Open the log for appending, creating the file if needed.
    ///
    /// An open failure downgrades the log to a no-op sink; durability is
    /// best-effort at this boundary.
    pub fn new(path: Option<PathBuf>) -> Self {
        let writer = path.as_ref().and_then(|p| {
            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(Mutex::new(BufWriter::new(file))),
                Err(err) => {
                    warn!(path = %p.display(), %err, "event log unavailable, running without durability");
                    None
                }
            }
        });

        Self {
            path,
            writer,
            sequence: 0,
        }
    }

    /// Largest sequence number minted so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Mint the next sequence number (pre-increment)
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Reset the sequence counter (used after recovery so post-recovery
    /// events continue the strictly-increasing sequence of the file)
    pub fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Append one event as a JSON line and flush it to the OS
    pub fn append(&self, event: &Event) -> Result<(), LogError> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };

        let line = serde_json::to_string(event)
            .map_err(|e| LogError::Serialization(e.to_string()))?;

        let mut guard = writer.lock().expect("event log writer lock poisoned");
        guard.write_all(line.as_bytes())?;
        guard.write_all(b"\n")?;
        guard.flush()?;
        Ok(())
    }

    /// Read every record in the log
    pub fn read_all(&self) -> Vec<Event> {
        self.read_from(0)
    }

    /// Read records with `sequence >= start_sequence`
    ///
    /// Empty lines are skipped; malformed lines are skipped silently apart
    /// from a debug-level diagnostic.
    pub fn read_from(&self, start_sequence: u64) -> Vec<Event> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(_) => return Vec::new(),
        };

        let mut events = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(path = %path.display(), %err, "stopped reading event log");
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => {
                    if event.sequence >= start_sequence {
                        events.push(event);
                    }
                }
                Err(err) => {
                    debug!(line = line_no + 1, %err, "skipping malformed event log line");
                }
            }
        }
        events
    }

    /// Flush buffered data and fsync the file (used on teardown)
    pub fn sync(&self) -> Result<(), LogError> {
        if let Some(writer) = &self.writer {
            let mut guard = writer.lock().expect("event log writer lock poisoned");
            guard.flush()?;
            guard.get_ref().sync_all()?;
        }
        Ok(())
    }
}
