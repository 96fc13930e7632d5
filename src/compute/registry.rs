use std::collections::HashMap;

use log::debug;

use super::LayerComputers;
use crate::{
    error::{EngineErr, Result},
    weights::Topology,
};

/// Maps each layer index to the strategies that compute it.
#[derive(Clone, Default)]
pub struct ComputerRegistry {
    computers: HashMap<usize, LayerComputers>,
}

impl ComputerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers dense strategies for every layer of `topology`, frozen layers get a no-op compensation.
    pub fn for_topology(topology: &Topology) -> Self {
        let mut registry = Self::new();

        for (idx, layer) in topology.layers.iter().enumerate() {
            let computers = match layer.frozen {
                true => LayerComputers::frozen(layer.activation),
                false => LayerComputers::dense(layer.activation),
            };

            debug!(layer = idx, frozen = layer.frozen; "registering layer computers");
            registry.register(idx, computers);
        }

        registry
    }

    /// Registers the strategies of a layer, replacing any previous ones.
    pub fn register(&mut self, layer: usize, computers: LayerComputers) -> Option<LayerComputers> {
        self.computers.insert(layer, computers)
    }

    pub fn len(&self) -> usize {
        self.computers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.computers.is_empty()
    }

    /// Returns the strategies of `layer`.
    ///
    /// # Returns
    /// An `InconsistentState` error if the layer was never registered, the network
    /// can't be computed without them.
    pub fn get(&self, layer: usize) -> Result<&LayerComputers> {
        self.computers.get(&layer).ok_or_else(|| missing(layer))
    }

    /// Takes the strategies of `layer` out of the registry.
    pub fn take(&mut self, layer: usize) -> Result<LayerComputers> {
        self.computers.remove(&layer).ok_or_else(|| missing(layer))
    }
}

fn missing(layer: usize) -> EngineErr {
    EngineErr::InconsistentState(format!("no computers registered for layer {layer}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute::ActFn, weights::LayerSpec};

    #[test]
    fn registers_every_layer() {
        let topology = Topology::new(
            2,
            vec![
                LayerSpec::new(3, ActFn::Identity).frozen(),
                LayerSpec::new(1, ActFn::sigmoid(1.)),
            ],
        );

        let registry = ComputerRegistry::for_topology(&topology);

        assert_eq!(registry.len(), 2);
        assert!(registry.get(0).unwrap().compensate.is_frozen());
        assert!(!registry.get(1).unwrap().compensate.is_frozen());
    }

    #[test]
    fn missing_layer_is_inconsistent() {
        let mut registry = ComputerRegistry::new();
        registry.register(0, LayerComputers::dense(ActFn::Identity));

        assert!(registry.take(0).is_ok());
        assert!(matches!(registry.take(0), Err(EngineErr::InconsistentState(_))));
        assert!(matches!(registry.get(3), Err(EngineErr::InconsistentState(_))));
    }
}
