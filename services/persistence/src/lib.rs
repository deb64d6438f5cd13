//! Durable persistence for the exchange engine
//!
//! Provides the append-only event log that fully determines recoverable
//! state, and the snapshot store used to shorten replay. Both are
//! best-effort: when configured without a path they become no-op sinks, and
//! I/O failures are reported to the caller, who may absorb them.

pub mod log;
pub mod snapshot;

pub use log::{EventLog, LogError};
pub use snapshot::{Snapshot, SnapshotError, SnapshotStore};
