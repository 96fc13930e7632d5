use log::trace;

use crate::{
    compute::{Compensate, ComputerRegistry, LayerComputers, ScoreConverter},
    error::{EngineErr, Result, check_len},
    vector_ops::abs_sum,
    weights::{LayerWeights, Topology},
    work::WorkerPool,
};

/// A layer of the network with the buffers of the current training step.
pub struct Layer {
    weights: LayerWeights,
    computers: LayerComputers,
    outputs: Vec<f32>,
    errors: Vec<f32>,
}

impl Layer {
    fn new(weights: LayerWeights, computers: LayerComputers) -> Self {
        let neurons = weights.neurons();

        Self {
            weights,
            computers,
            outputs: vec![0.; neurons],
            errors: vec![0.; neurons],
        }
    }

    pub fn weights(&self) -> &LayerWeights {
        &self.weights
    }

    pub fn computers(&self) -> &LayerComputers {
        &self.computers
    }

    /// The outputs recorded by the last forward pass.
    pub fn outputs(&self) -> &[f32] {
        &self.outputs
    }

    /// The per-neuron error of the last training step.
    pub fn errors(&self) -> &[f32] {
        &self.errors
    }
}

/// What a training step observed.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// `expected - actual` for every output neuron.
    pub output_error: Vec<f32>,
    /// The sum of the absolute output errors.
    pub abs_error: f32,
}

/// A layered network, index 0 being the layer closest to the input.
pub struct Network {
    topology: Topology,
    layers: Vec<Layer>,
}

impl Network {
    /// Creates a new `Network`.
    ///
    /// # Arguments
    /// * `topology` - The shape of the network.
    /// * `weights` - One weight matrix per layer, matching the topology.
    /// * `registry` - The computation strategies of every layer.
    ///
    /// # Returns
    /// An error if the weights don't match the topology or a layer has no registered computers.
    pub fn new(
        topology: Topology,
        weights: Vec<LayerWeights>,
        mut registry: ComputerRegistry,
    ) -> Result<Self> {
        if topology.layers.is_empty() {
            return Err(EngineErr::Config("a network needs at least one layer".into()));
        }

        let shapes = topology.shapes();
        check_len("weights", "topology layers", weights.len(), shapes.len())?;

        let mut layers = Vec::with_capacity(weights.len());

        for (idx, (weights, (neurons, inputs))) in weights.into_iter().zip(shapes).enumerate() {
            check_len("layer neurons", "topology neurons", weights.neurons(), neurons)?;
            check_len("layer inputs", "topology inputs", weights.inputs(), inputs)?;

            layers.push(Layer::new(weights, registry.take(idx)?));
        }

        Ok(Self { topology, layers })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn weights(&self, layer: usize) -> Option<&LayerWeights> {
        self.layers.get(layer).map(Layer::weights)
    }

    /// Copies the weights of every layer.
    pub fn snapshot(&self) -> Vec<LayerWeights> {
        self.layers.iter().map(|layer| layer.weights.clone()).collect()
    }

    /// Runs the input through every layer without touching the training buffers.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        check_len("input", "network inputs", input.len(), self.topology.inputs)?;

        let mut a = input.to_vec();
        for layer in &self.layers {
            a = layer.computers.predict.predict(&layer.weights, &a)?;
        }

        Ok(a)
    }

    /// Predicts and converts the outputs into a decision.
    pub fn classify(&self, input: &[f32], converter: &dyn ScoreConverter) -> Result<usize> {
        converter.convert(&self.predict(input)?)
    }

    /// Runs a full training step.
    ///
    /// The forward pass, the output error and every compensation are split in neuron ranges
    /// across the pool, each phase completes before the next one starts.
    ///
    /// # Arguments
    /// * `input` - The input of the network.
    /// * `expected` - The expected outputs.
    /// * `learning_rate` - Scales the weight updates.
    /// * `pool` - The workers to compute on.
    ///
    /// # Returns
    /// The observed output error, or an error if the buffers don't match the topology.
    pub fn train_step(
        &mut self,
        input: &[f32],
        expected: &[f32],
        learning_rate: f32,
        pool: &WorkerPool,
    ) -> Result<StepReport> {
        check_len("expected", "network outputs", expected.len(), self.topology.outputs())?;

        self.calculate(input, pool)?;
        self.derive_output_error(expected, pool)?;
        self.backpropagate()?;
        self.compensate(input, learning_rate, pool)?;

        let output_error = self.output_layer().errors.clone();
        let abs_error = abs_sum(&output_error);
        trace!(abs_error = abs_error; "training step done");

        Ok(StepReport {
            output_error,
            abs_error,
        })
    }

    fn output_layer(&self) -> &Layer {
        // `new` rejects networks without layers.
        &self.layers[self.layers.len() - 1]
    }

    /// Forward pass recording every layer's outputs.
    fn calculate(&mut self, input: &[f32], pool: &WorkerPool) -> Result<()> {
        check_len("input", "network inputs", input.len(), self.topology.inputs)?;

        for idx in 0..self.layers.len() {
            let (prev, rest) = self.layers.split_at_mut(idx);
            let input = prev.last().map_or(input, |layer| &layer.outputs[..]);

            let Layer {
                weights,
                computers,
                outputs,
                ..
            } = &mut rest[0];
            let (weights, calculate) = (&*weights, &computers.calculate);

            pool.for_each_range(outputs, weights.neurons(), 1, |range, chunk| {
                calculate.calculate(weights, input, chunk, range)
            })?;
        }

        Ok(())
    }

    /// Clears the errors of the previous step and derives the output layer's error.
    fn derive_output_error(&mut self, expected: &[f32], pool: &WorkerPool) -> Result<()> {
        for layer in &mut self.layers {
            layer.errors.fill(0.);
        }

        let last = self.layers.len() - 1;
        let Layer {
            outputs, errors, ..
        } = &mut self.layers[last];

        pool.output_error(expected, outputs, errors)
    }

    /// Pushes the error from the output layer back to the first one.
    fn backpropagate(&mut self) -> Result<()> {
        for idx in (1..self.layers.len()).rev() {
            let (prev, rest) = self.layers.split_at_mut(idx);
            let layer = &rest[0];
            let prev = &mut prev[idx - 1];

            layer
                .computers
                .backprop
                .backpropagate(&layer.weights, &layer.errors, &mut prev.errors)?;
        }

        Ok(())
    }

    /// Updates the weights of every layer from its known error.
    fn compensate(&mut self, input: &[f32], learning_rate: f32, pool: &WorkerPool) -> Result<()> {
        for idx in 0..self.layers.len() {
            let (prev, rest) = self.layers.split_at_mut(idx);
            let input = prev.last().map_or(input, |layer| &layer.outputs[..]);

            let Layer {
                weights,
                computers,
                outputs,
                errors,
            } = &mut rest[0];
            let (compensate, outputs, errors) = (&computers.compensate, &outputs[..], &errors[..]);

            let ranges = pool.partition(weights.neurons())?;
            let rows = weights.rows_mut_for(&ranges)?;
            let items: Vec<_> = ranges.into_iter().zip(rows).collect();

            pool.dispatch(items, |(range, rows)| {
                compensate.compensate(rows, input, learning_rate, errors, outputs, range)
            })?;
        }

        Ok(())
    }
}
