use std::{cell::RefCell, rc::Rc};

use log::info;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    compute::ComputerRegistry,
    error::{EngineErr, Result, check_len},
    initialization::DistributionSpec,
    network::Network,
    storage::SnapshotStorage,
    weights::{LayerWeights, Topology},
};

/// Builds `Network`s either from the latest stored snapshot or from a seeded distribution.
#[derive(Debug, Clone)]
pub struct NetFactory {
    topology: Topology,
    distribution: DistributionSpec,
    seed: u64,
}

impl NetFactory {
    /// Creates a new `NetFactory`.
    ///
    /// # Arguments
    /// * `topology` - The shape of the networks to build.
    /// * `distribution` - The distribution fresh weights are drawn from.
    /// * `seed` - The seed of the random number generator.
    pub fn new(topology: Topology, distribution: DistributionSpec, seed: u64) -> Self {
        Self {
            topology,
            distribution,
            seed,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Builds a network with dense computers for every layer.
    ///
    /// # Arguments
    /// * `storage` - Where a previous run may have left snapshots.
    ///
    /// # Returns
    /// The new network or an error if the stored snapshot doesn't fit the topology.
    pub fn build(&self, storage: &dyn SnapshotStorage) -> Result<Network> {
        let registry = ComputerRegistry::for_topology(&self.topology);
        self.build_with(storage, registry)
    }

    /// Same as `build` but with the caller's computers.
    pub fn build_with(
        &self,
        storage: &dyn SnapshotStorage,
        registry: ComputerRegistry,
    ) -> Result<Network> {
        let weights = self.initial_weights(storage)?;
        Network::new(self.topology.clone(), weights, registry)
    }

    /// Resolves the initial weights of every layer.
    ///
    /// A stored snapshot always wins over the seed, it's used as a whole or not at all.
    pub fn initial_weights(&self, storage: &dyn SnapshotStorage) -> Result<Vec<LayerWeights>> {
        if storage.has_snapshots() {
            let layers = storage.latest_weights().ok_or_else(|| {
                EngineErr::InconsistentState(
                    "storage reports snapshots but has no latest weights".into(),
                )
            })?;

            self.check_snapshot(&layers)?;
            info!(layers = layers.len(); "restoring weights from the latest snapshot");
            return Ok(layers);
        }

        info!(seed = self.seed, params = self.topology.size(); "initializing weights from seed");
        self.generate()
    }

    fn check_snapshot(&self, layers: &[LayerWeights]) -> Result<()> {
        let shapes = self.topology.shapes();
        check_len("snapshot layers", "topology layers", layers.len(), shapes.len())?;

        for (layer, (neurons, inputs)) in layers.iter().zip(shapes) {
            check_len("snapshot neurons", "topology neurons", layer.neurons(), neurons)?;
            check_len("snapshot inputs", "topology inputs", layer.inputs(), inputs)?;
        }

        Ok(())
    }

    /// Draws every weight in layer, neuron and input order from a single seeded generator.
    fn generate(&self) -> Result<Vec<LayerWeights>> {
        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(self.seed)));

        self.topology
            .shapes()
            .into_iter()
            .map(|(neurons, inputs)| {
                self.distribution
                    .param_gen(Rc::clone(&rng), neurons, inputs)?
                    .layer(neurons, inputs)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute::ActFn, storage::MemoryStorage, weights::LayerSpec};

    fn topology() -> Topology {
        Topology::new(
            3,
            vec![
                LayerSpec::new(4, ActFn::sigmoid(1.)),
                LayerSpec::new(2, ActFn::Identity),
            ],
        )
    }

    fn factory(seed: u64) -> NetFactory {
        NetFactory::new(topology(), DistributionSpec::default(), seed)
    }

    #[test]
    fn same_seed_same_weights() {
        let storage = MemoryStorage::new();
        let a = factory(7).initial_weights(&storage).unwrap();
        let b = factory(7).initial_weights(&storage).unwrap();

        assert_eq!(a, b);
        assert_eq!(a[0].shape(), (4, 3));
        assert_eq!(a[1].shape(), (2, 4));
    }

    #[test]
    fn different_seed_different_weights() {
        let storage = MemoryStorage::new();
        let a = factory(7).initial_weights(&storage).unwrap();
        let b = factory(8).initial_weights(&storage).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn snapshot_wins_over_seed() {
        let stored = vec![
            LayerWeights::new(4, 3, vec![0.25; 12]).unwrap(),
            LayerWeights::new(2, 4, vec![-1.; 8]).unwrap(),
        ];
        let storage = MemoryStorage::new();
        storage.save(stored.clone()).unwrap();

        for seed in [0, 7, 1234] {
            let net = factory(seed).build(&storage).unwrap();
            assert_eq!(net.snapshot(), stored);
        }
    }

    #[test]
    fn mismatched_snapshot_is_rejected() {
        let storage = MemoryStorage::new();
        storage
            .save(vec![LayerWeights::new(4, 3, vec![0.; 12]).unwrap()])
            .unwrap();

        let res = factory(1).initial_weights(&storage);
        assert!(matches!(res, Err(EngineErr::SizeMismatch { .. })));

        let storage = MemoryStorage::new();
        storage
            .save(vec![
                LayerWeights::new(4, 3, vec![0.; 12]).unwrap(),
                LayerWeights::new(2, 5, vec![0.; 10]).unwrap(),
            ])
            .unwrap();

        let res = factory(1).initial_weights(&storage);
        assert!(matches!(res, Err(EngineErr::SizeMismatch { .. })));
    }

    struct EmptyHistory;

    impl SnapshotStorage for EmptyHistory {
        fn has_snapshots(&self) -> bool {
            true
        }

        fn latest_weights(&self) -> Option<Vec<LayerWeights>> {
            None
        }

        fn save(&self, _layers: Vec<LayerWeights>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn snapshots_without_latest_weights_are_inconsistent() {
        let res = factory(1).initial_weights(&EmptyHistory);
        assert!(matches!(res, Err(EngineErr::InconsistentState(_))));

        assert!(factory(1).build(&EmptyHistory).is_err());
    }

    #[test]
    fn invalid_distribution() {
        let factory = NetFactory::new(
            topology(),
            DistributionSpec::Uniform { low: 1., high: 0. },
            1,
        );

        let res = factory.initial_weights(&MemoryStorage::new());
        assert!(matches!(res, Err(EngineErr::Rand(_))));
    }
}
