use std::{fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    compute::ActFn,
    error::{EngineErr, Result},
    initialization::DistributionSpec,
    stats::DEFAULT_CHECKPOINT_INTERVAL,
    weights::{LayerSpec, Topology},
};

/// A training sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub input: Vec<f32>,
    pub expected: Vec<f32>,
}

impl Sample {
    pub fn new(input: Vec<f32>, expected: Vec<f32>) -> Self {
        Self { input, expected }
    }
}

/// Everything needed to build and train a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub topology: Topology,
    pub seed: u64,
    pub distribution: DistributionSpec,
    pub learning_rate: f32,
    pub threads: usize,
    pub epochs: usize,
    pub checkpoint_interval: usize,
    pub samples: Vec<Sample>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let topology = Topology::new(
            2,
            vec![
                LayerSpec::new(4, ActFn::sigmoid(1.)),
                LayerSpec::new(1, ActFn::sigmoid(1.)),
            ],
        );

        let samples = [([0., 0.], 0.), ([0., 1.], 1.), ([1., 0.], 1.), ([1., 1.], 0.)]
            .into_iter()
            .map(|(input, expected)| Sample::new(input.to_vec(), vec![expected]))
            .collect();

        Self {
            topology,
            seed: 42,
            distribution: DistributionSpec::default(),
            learning_rate: 0.5,
            threads: 4,
            epochs: 1000,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            samples,
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EngineErr::Config(format!("cannot read '{}': {e}", path.display())))?;

        content.parse()
    }

    /// Checks the values serde can't.
    pub fn validate(&self) -> Result<()> {
        if self.topology.layers.is_empty() {
            return Err(EngineErr::Config("the topology has no layers".into()));
        }

        if let Some(idx) = self.topology.layers.iter().position(|layer| layer.neurons == 0) {
            return Err(EngineErr::Config(format!("layer {idx} has no neurons")));
        }

        if self.threads == 0 {
            return Err(EngineErr::NoWorkers);
        }

        if !self.learning_rate.is_finite() {
            return Err(EngineErr::Config(format!(
                "invalid learning rate {}",
                self.learning_rate
            )));
        }

        let (inputs, outputs) = (self.topology.inputs, self.topology.outputs());
        for (idx, sample) in self.samples.iter().enumerate() {
            if sample.input.len() != inputs || sample.expected.len() != outputs {
                return Err(EngineErr::Config(format!(
                    "sample {idx} doesn't match the topology, expected {inputs} inputs and {outputs} outputs"
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for EngineConfig {
    type Err = EngineErr;

    fn from_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
