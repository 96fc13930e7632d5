use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{error::Result, weights::LayerWeights};

/// The persistence collaborator holding the history of weight snapshots.
///
/// How snapshots are stored and ordered is up to the implementor, the engine only asks
/// whether there is any and what the latest one holds.
pub trait SnapshotStorage: Send + Sync {
    fn has_snapshots(&self) -> bool;

    /// Should return the weights of every layer of the most recent snapshot.
    fn latest_weights(&self) -> Option<Vec<LayerWeights>>;

    /// Should persist a complete snapshot of the network.
    fn save(&self, layers: Vec<LayerWeights>) -> Result<()>;
}

/// A copy of every layer's weights at a point in training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_ms: u128,
    pub layers: Vec<LayerWeights>,
}

impl Snapshot {
    pub fn now(layers: Vec<LayerWeights>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis());

        Self {
            timestamp_ms,
            layers,
        }
    }
}

/// In-process snapshot history ordered by timestamp, the latest snapshot being the last one.
///
/// Snapshots sharing a timestamp keep their insertion order.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    history: RwLock<Vec<Snapshot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage whose history already holds `snapshots`.
    pub fn with_history(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.timestamp_ms);

        Self {
            history: RwLock::new(snapshots),
        }
    }

    /// Inserts `snapshot` after every snapshot that isn't newer than it.
    pub fn insert(&self, snapshot: Snapshot) {
        let mut history = self.history.write();
        let idx = history.partition_point(|s| s.timestamp_ms <= snapshot.timestamp_ms);

        debug!(
            layers = snapshot.layers.len(),
            position = idx,
            history = history.len() + 1;
            "snapshot saved"
        );
        history.insert(idx, snapshot);
    }

    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.history.read().clone()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn has_snapshots(&self) -> bool {
        !self.is_empty()
    }

    fn latest_weights(&self) -> Option<Vec<LayerWeights>> {
        self.history
            .read()
            .last()
            .map(|snapshot| snapshot.layers.clone())
    }

    fn save(&self, layers: Vec<LayerWeights>) -> Result<()> {
        self.insert(Snapshot::now(layers));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(value: f32) -> Vec<LayerWeights> {
        vec![LayerWeights::from_rows(vec![vec![value; 2]]).unwrap()]
    }

    #[test]
    fn empty_storage() {
        let storage = MemoryStorage::new();
        assert!(!storage.has_snapshots());
        assert!(storage.latest_weights().is_none());
    }

    #[test]
    fn latest_is_last_saved() {
        let storage = MemoryStorage::new();
        storage.save(layer(1.)).unwrap();
        storage.save(layer(2.)).unwrap();

        assert!(storage.has_snapshots());
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.latest_weights().unwrap(), layer(2.));
    }

    #[test]
    fn history_is_ordered_by_time() {
        let storage = MemoryStorage::with_history(vec![
            Snapshot {
                timestamp_ms: 20,
                layers: layer(2.),
            },
            Snapshot {
                timestamp_ms: 10,
                layers: layer(1.),
            },
        ]);

        assert_eq!(storage.latest_weights().unwrap(), layer(2.));
    }

    #[test]
    fn saving_keeps_timestamp_order() {
        let storage = MemoryStorage::with_history(vec![Snapshot {
            timestamp_ms: u128::MAX,
            layers: layer(9.),
        }]);

        storage.save(layer(1.)).unwrap();
        storage.insert(Snapshot {
            timestamp_ms: 5,
            layers: layer(2.),
        });
        storage.insert(Snapshot {
            timestamp_ms: 5,
            layers: layer(3.),
        });

        let timestamps: Vec<_> = storage.snapshots().iter().map(|s| s.timestamp_ms).collect();
        assert!(timestamps.is_sorted());
        assert_eq!(storage.snapshots()[0].layers, layer(2.));
        assert_eq!(storage.snapshots()[1].layers, layer(3.));
        assert_eq!(storage.latest_weights().unwrap(), layer(9.));
    }
}
