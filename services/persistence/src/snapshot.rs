//! Snapshot store
//!
//! Periodic full-state dumps keyed by event sequence. Each snapshot is one
//! pretty-printed JSON file named `snapshot_<sequence>.json` in a flat
//! directory; recovery loads the file with the greatest sequence in its
//! name. Old snapshots are never garbage-collected here.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use types::order::Order;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Point-in-time dump of the engine's active state
///
/// `sequence` is the last event sequence whose effect is included. Only
/// active orders (NEW or PARTIAL) are stored; trade history is not
/// snapshotted, so trades older than the snapshot do not survive a
/// snapshot-based recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: u64,
    pub timestamp_ns: u64,
    pub next_order_id: u64,
    pub next_trade_id: u64,
    pub orders: Vec<Order>,
}

/// Stores snapshots in a directory and decides when the next one is due
///
/// Without a directory the store is inert: `should_snapshot` is always false
/// and `load_latest` returns `None`.
pub struct SnapshotStore {
    dir: Option<PathBuf>,
    interval: u64,
    last_snapshot_sequence: u64,
}

impl SnapshotStore {
    /// Create a store over `dir`, snapshotting every `interval` events.
    pub fn new(dir: Option<PathBuf>, interval: u64) -> Self {
        if let Some(dir) = &dir {
            if let Err(err) = fs::create_dir_all(dir) {
                warn!(dir = %dir.display(), %err, "could not create snapshot directory");
            }
        }
        Self {
            dir,
            interval,
            last_snapshot_sequence: 0,
        }
    }

    /// True when a directory is configured and at least `interval` events
    /// have been sequenced since the last saved snapshot
    pub fn should_snapshot(&self, current_sequence: u64) -> bool {
        self.dir.is_some()
            && current_sequence.saturating_sub(self.last_snapshot_sequence) >= self.interval
    }

    /// Serialize `snapshot` to `snapshot_<sequence>.json`.
    ///
    /// Written through a temp file and renamed into place so a crash cannot
    /// leave a half-written snapshot under the final name.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError> {
        let Some(dir) = &self.dir else {
            return Err(SnapshotError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "snapshot directory not configured",
            )));
        };

        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        let path = dir.join(format!("snapshot_{}.json", snapshot.sequence));
        let tmp_path = dir.join(format!("snapshot_{}.json.tmp", snapshot.sequence));

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(data.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        self.last_snapshot_sequence = snapshot.sequence;
        Ok(path)
    }

    /// Load the snapshot with the greatest sequence, or `None` if the
    /// directory is unset, missing, or holds no parseable snapshot
    pub fn load_latest(&self) -> Option<Snapshot> {
        let dir = self.dir.as_ref()?;
        let entries = fs::read_dir(dir).ok()?;

        let mut latest: Option<(u64, PathBuf)> = None;
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(sequence) = Self::parse_sequence(&name) {
                if latest.as_ref().map_or(true, |(max, _)| sequence > *max) {
                    latest = Some((sequence, entry.path()));
                }
            }
        }

        let (_, path) = latest?;
        match Self::load(&path) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %path.display(), %err, "could not load latest snapshot");
                None
            }
        }
    }

    fn load(path: &Path) -> Result<Snapshot, SnapshotError> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    fn parse_sequence(filename: &str) -> Option<u64> {
        filename
            .strip_prefix("snapshot_")?
            .strip_suffix(".json")?
            .parse::<u64>()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use types::prelude::*;

    fn sample_order(id: u64) -> Order {
        Order {
            id: OrderId::new(id),
            account_id: AccountId::from("alice"),
            symbol: Symbol::from("BTC-USD"),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: Price::from_major(10_000),
            quantity: Quantity::new(100),
            remaining_qty: Quantity::new(60),
            timestamp_ns: 1_708_123_456_789_000_000,
            status: OrderStatus::Partial,
            idempotency_key: None,
            client_order_id: None,
        }
    }

    fn sample_snapshot(sequence: u64) -> Snapshot {
        Snapshot {
            sequence,
            timestamp_ns: 1_708_123_456_789_000_000,
            next_order_id: 3,
            next_trade_id: 2,
            orders: vec![sample_order(1)],
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = SnapshotStore::new(Some(tmp.path().to_path_buf()), 100);

        let snapshot = sample_snapshot(42);
        let path = store.save(&snapshot).unwrap();
        assert!(path.ends_with("snapshot_42.json"));

        let loaded = store.load_latest().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_latest_picks_greatest_sequence() {
        let tmp = TempDir::new().unwrap();
        let mut store = SnapshotStore::new(Some(tmp.path().to_path_buf()), 100);

        for sequence in [100u64, 500, 300] {
            store.save(&sample_snapshot(sequence)).unwrap();
        }

        let loaded = store.load_latest().unwrap();
        assert_eq!(loaded.sequence, 500);
    }

    #[test]
    fn test_should_snapshot_interval() {
        let tmp = TempDir::new().unwrap();
        let mut store = SnapshotStore::new(Some(tmp.path().to_path_buf()), 100);

        assert!(!store.should_snapshot(50));
        assert!(store.should_snapshot(100));
        assert!(store.should_snapshot(250));

        store.save(&sample_snapshot(100)).unwrap();
        assert!(!store.should_snapshot(150));
        assert!(store.should_snapshot(200));
    }

    #[test]
    fn test_unconfigured_store_is_inert() {
        let mut store = SnapshotStore::new(None, 100);
        assert!(!store.should_snapshot(u64::MAX));
        assert!(store.load_latest().is_none());
        assert!(store.save(&sample_snapshot(1)).is_err());
    }

    #[test]
    fn test_empty_directory_loads_none() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(Some(tmp.path().to_path_buf()), 100);
        assert!(store.load_latest().is_none());
    }

    #[test]
    fn test_non_snapshot_files_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a snapshot").unwrap();
        fs::write(tmp.path().join("snapshot_abc.json"), "{}").unwrap();

        let mut store = SnapshotStore::new(Some(tmp.path().to_path_buf()), 100);
        store.save(&sample_snapshot(7)).unwrap();

        let loaded = store.load_latest().unwrap();
        assert_eq!(loaded.sequence, 7);
    }

    #[test]
    fn test_snapshot_file_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let mut store = SnapshotStore::new(Some(tmp.path().to_path_buf()), 100);
        let path = store.save(&sample_snapshot(1)).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains('\n'));
        assert!(contents.contains("\"next_order_id\": 3"));
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(SnapshotStore::parse_sequence("snapshot_42.json"), Some(42));
        assert_eq!(SnapshotStore::parse_sequence("snapshot_.json"), None);
        assert_eq!(SnapshotStore::parse_sequence("snapshot_42.json.tmp"), None);
        assert_eq!(SnapshotStore::parse_sequence("other_42.json"), None);
    }
}
