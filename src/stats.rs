use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use crate::{
    network::Network, storage::SnapshotStorage, synchronization::ConcurrentFlag,
    vector_ops::abs_sum, weights::LayerWeights,
};

/// The amount of epochs between checkpoints when none is configured.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 200;

/// Observes the training loop.
pub trait StatisticsManager {
    /// Should be called once per training step with the step's output error.
    fn add_output_error(&mut self, errors: &[f32]);

    /// Should be called once after every epoch.
    ///
    /// # Arguments
    /// * `epoch` - The amount of epochs completed so far, starting at 1.
    /// * `network` - The network being trained.
    fn collect_stats(&mut self, epoch: usize, network: &Network);
}

/// The checkpoint in flight, if any, and the waiters of its completion.
#[derive(Default)]
struct InFlight {
    flag: ConcurrentFlag,
    lock: Mutex<()>,
    idle: Condvar,
}

impl InFlight {
    fn finish(&self) {
        self.flag.try_set(false);

        // Taken so a waiter can't miss the wakeup between its check and its wait.
        let _guard = self.lock.lock();
        self.idle.notify_all();
    }

    fn wait(&self) {
        let mut guard = self.lock.lock();
        while self.flag.get() {
            self.idle.wait(&mut guard);
        }
    }
}

/// Saves snapshots on a background task, at most one at a time.
#[derive(Clone)]
pub struct Checkpointer {
    storage: Arc<dyn SnapshotStorage>,
    in_flight: Arc<InFlight>,
}

impl Checkpointer {
    pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
        Self {
            storage,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Starts saving `layers` unless a previous checkpoint is still being saved.
    ///
    /// # Returns
    /// Whether the checkpoint was started.
    pub fn request(&self, layers: Vec<LayerWeights>) -> bool {
        if !self.in_flight.flag.try_set(true) {
            debug!("checkpoint already in flight, skipping");
            return false;
        }

        let storage = Arc::clone(&self.storage);
        let in_flight = Arc::clone(&self.in_flight);

        rayon::spawn(move || {
            if let Err(e) = storage.save(layers) {
                warn!("failed to save checkpoint: {e}");
            }

            in_flight.finish();
        });

        true
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.flag.get()
    }

    /// Blocks until no checkpoint is being saved.
    pub fn wait_idle(&self) {
        self.in_flight.wait();
    }
}

/// Tracks the mean absolute output error of every epoch and checkpoints periodically.
pub struct EpochStatistics {
    checkpointer: Option<Checkpointer>,
    checkpoint_interval: usize,
    epoch_error: f32,
    samples: usize,
    history: Vec<f32>,
}

impl EpochStatistics {
    /// Creates a new `EpochStatistics`.
    ///
    /// # Arguments
    /// * `checkpointer` - Where to send checkpoints, if any.
    /// * `checkpoint_interval` - Epochs between checkpoints, zero disables them.
    pub fn new(checkpointer: Option<Checkpointer>, checkpoint_interval: usize) -> Self {
        Self {
            checkpointer,
            checkpoint_interval,
            epoch_error: 0.,
            samples: 0,
            history: Vec::new(),
        }
    }

    /// The mean absolute output error of every collected epoch.
    pub fn history(&self) -> &[f32] {
        &self.history
    }

    pub fn last_mean_error(&self) -> Option<f32> {
        self.history.last().copied()
    }

    fn should_checkpoint(&self, epoch: usize) -> bool {
        self.checkpoint_interval > 0 && epoch > 0 && epoch % self.checkpoint_interval == 0
    }
}

impl StatisticsManager for EpochStatistics {
    fn add_output_error(&mut self, errors: &[f32]) {
        self.epoch_error += abs_sum(errors);
        self.samples += 1;
    }

    fn collect_stats(&mut self, epoch: usize, network: &Network) {
        let mean_error = match self.samples {
            0 => 0.,
            samples => self.epoch_error / samples as f32,
        };

        info!(epoch = epoch, samples = self.samples, mean_error = mean_error; "epoch done");

        self.history.push(mean_error);
        self.epoch_error = 0.;
        self.samples = 0;

        if self.should_checkpoint(epoch) {
            if let Some(checkpointer) = &self.checkpointer {
                debug!(epoch = epoch; "requesting checkpoint");
                checkpointer.request(network.snapshot());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    use super::*;
    use crate::{
        compute::{ActFn, ComputerRegistry},
        error::Result,
        storage::MemoryStorage,
        weights::{LayerSpec, Topology},
    };

    struct GatedStorage {
        gate: Mutex<()>,
        saved: AtomicUsize,
    }

    impl SnapshotStorage for GatedStorage {
        fn has_snapshots(&self) -> bool {
            self.saved.load(Ordering::SeqCst) > 0
        }

        fn latest_weights(&self) -> Option<Vec<LayerWeights>> {
            None
        }

        fn save(&self, _layers: Vec<LayerWeights>) -> Result<()> {
            let _open = self.gate.lock();
            self.saved.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn network() -> Network {
        let topology = Topology::new(1, vec![LayerSpec::new(1, ActFn::Identity)]);
        let registry = ComputerRegistry::for_topology(&topology);
        let weights = vec![LayerWeights::new(1, 1, vec![0.5]).unwrap()];
        Network::new(topology, weights, registry).unwrap()
    }

    #[test]
    fn one_checkpoint_in_flight() {
        let storage = Arc::new(GatedStorage {
            gate: Mutex::new(()),
            saved: AtomicUsize::new(0),
        });
        let checkpointer = Checkpointer::new(storage.clone());

        let gate = storage.gate.lock();
        assert!(checkpointer.request(vec![]));
        assert!(checkpointer.in_flight());
        assert!(!checkpointer.request(vec![]));
        drop(gate);

        checkpointer.wait_idle();
        assert_eq!(storage.saved.load(Ordering::SeqCst), 1);
        assert!(checkpointer.request(vec![]));
        checkpointer.wait_idle();
        assert_eq!(storage.saved.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn mean_error_per_epoch() {
        let mut stats = EpochStatistics::new(None, DEFAULT_CHECKPOINT_INTERVAL);
        let net = network();

        stats.add_output_error(&[1., -1.]);
        stats.add_output_error(&[0., -4.]);
        stats.collect_stats(1, &net);
        stats.collect_stats(2, &net);

        assert_eq!(stats.history(), [3., 0.]);
        assert_eq!(stats.last_mean_error(), Some(0.));
    }

    #[test]
    fn checkpoints_every_interval() {
        let storage = Arc::new(MemoryStorage::new());
        let checkpointer = Checkpointer::new(storage.clone());
        let mut stats = EpochStatistics::new(Some(checkpointer.clone()), 2);
        let net = network();

        for epoch in 1..=5 {
            stats.collect_stats(epoch, &net);
            checkpointer.wait_idle();
        }

        assert_eq!(storage.len(), 2);
        assert_eq!(storage.latest_weights().unwrap(), net.snapshot());
    }

    #[test]
    fn wait_idle_blocks_until_the_save_ends() {
        let storage = Arc::new(GatedStorage {
            gate: Mutex::new(()),
            saved: AtomicUsize::new(0),
        });
        let checkpointer = Checkpointer::new(storage.clone());
        checkpointer.wait_idle();

        let gate = storage.gate.lock();
        assert!(checkpointer.request(vec![]));

        let released = Arc::new(AtomicBool::new(false));
        let waiter = {
            let (checkpointer, released) = (checkpointer.clone(), released.clone());
            thread::spawn(move || {
                checkpointer.wait_idle();
                released.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!released.load(Ordering::SeqCst));

        drop(gate);
        waiter.join().unwrap();

        assert!(released.load(Ordering::SeqCst));
        assert!(!checkpointer.in_flight());
        assert_eq!(storage.saved.load(Ordering::SeqCst), 1);
    }
}
