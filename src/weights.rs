use serde::{Deserialize, Serialize};

use crate::{
    compute::ActFn,
    error::{EngineErr, Result, check_len},
    range::{ProcessingRange, split_disjoint_mut},
};

/// The weight matrix of a single layer.
///
/// Each neuron owns a row with one weight per input unit, rows are stored contiguously.
/// The shape never changes after construction, only the values may be rewritten in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>", into = "Vec<Vec<f32>>")]
pub struct LayerWeights {
    neurons: usize,
    inputs: usize,
    values: Box<[f32]>,
}

impl LayerWeights {
    /// Creates a new `LayerWeights` from a row-major buffer.
    ///
    /// # Arguments
    /// * `neurons` - The amount of neurons (rows).
    /// * `inputs` - The amount of incoming weights per neuron (columns).
    /// * `values` - The `neurons * inputs` weights.
    ///
    /// # Returns
    /// A `SizeMismatch` error if `values` doesn't match the shape.
    pub fn new(neurons: usize, inputs: usize, values: Vec<f32>) -> Result<Self> {
        check_len("values", "neurons * inputs", values.len(), neurons * inputs)?;

        Ok(Self {
            neurons,
            inputs,
            values: values.into_boxed_slice(),
        })
    }

    pub fn zeros(neurons: usize, inputs: usize) -> Self {
        Self {
            neurons,
            inputs,
            values: vec![0.; neurons * inputs].into_boxed_slice(),
        }
    }

    /// Creates a new `LayerWeights` from one vector per neuron.
    ///
    /// # Returns
    /// A `SizeMismatch` error if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let neurons = rows.len();
        let inputs = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(neurons * inputs);

        for row in rows {
            check_len("neuron", "first neuron", row.len(), inputs)?;
            values.extend(row);
        }

        Self::new(neurons, inputs, values)
    }

    pub fn neurons(&self) -> usize {
        self.neurons
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Returns `(neurons, inputs)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.neurons, self.inputs)
    }

    /// Returns the incoming weights of the `idx`-th neuron.
    ///
    /// # Panics
    /// If `idx` is not a neuron of this layer.
    pub fn neuron(&self, idx: usize) -> &[f32] {
        let start = idx * self.inputs;
        &self.values[start..start + self.inputs]
    }

    /// Iterates the neurons in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.neurons).map(move |n| self.neuron(n))
    }

    /// Returns the rows of the neurons in `range` as a single row-major slice.
    pub fn rows_in(&self, range: ProcessingRange) -> Result<&[f32]> {
        if range.stop() > self.neurons {
            return Err(EngineErr::OutOfBounds {
                stop: range.stop(),
                len: self.neurons,
            });
        }

        Ok(&self.values[range.start() * self.inputs..range.stop() * self.inputs])
    }

    /// Hands out exclusive row-major views of the neurons in each range.
    ///
    /// # Returns
    /// An error if the ranges overlap or exceed the amount of neurons.
    pub fn rows_mut_for(&mut self, ranges: &[ProcessingRange]) -> Result<Vec<&mut [f32]>> {
        if let Some(last) = ranges.last() {
            if last.stop() > self.neurons {
                return Err(EngineErr::OutOfBounds {
                    stop: last.stop(),
                    len: self.neurons,
                });
            }
        }

        split_disjoint_mut(&mut self.values, ranges, self.inputs)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        (0..self.neurons).map(|n| self.neuron(n).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<f32>>> for LayerWeights {
    type Error = EngineErr;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<LayerWeights> for Vec<Vec<f32>> {
    fn from(value: LayerWeights) -> Self {
        value.to_rows()
    }
}

/// Description of a single layer of the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub neurons: usize,
    #[serde(default)]
    pub activation: ActFn,
    /// Frozen layers keep their weights during training.
    #[serde(default)]
    pub frozen: bool,
}

impl LayerSpec {
    pub fn new(neurons: usize, activation: ActFn) -> Self {
        Self {
            neurons,
            activation,
            frozen: false,
        }
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }
}

/// The shape of a network: the size of its input and every layer after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub inputs: usize,
    pub layers: Vec<LayerSpec>,
}

impl Topology {
    pub fn new(inputs: usize, layers: Vec<LayerSpec>) -> Self {
        Self { inputs, layers }
    }

    pub fn outputs(&self) -> usize {
        self.layers.last().map_or(self.inputs, |layer| layer.neurons)
    }

    /// Returns the `(neurons, inputs)` shape of every layer.
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        let mut inputs = self.inputs;

        self.layers
            .iter()
            .map(|layer| {
                let shape = (layer.neurons, inputs);
                inputs = layer.neurons;
                shape
            })
            .collect()
    }

    /// The total amount of weights in the network.
    pub fn size(&self) -> usize {
        self.shapes().iter().map(|(n, i)| n * i).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip() {
        let rows = vec![vec![1., 2.], vec![3., 4.], vec![5., 6.]];
        let weights = LayerWeights::from_rows(rows.clone()).unwrap();

        assert_eq!(weights.shape(), (3, 2));
        assert_eq!(weights.neuron(1), [3., 4.]);
        assert_eq!(weights.rows().count(), 3);
        assert_eq!(weights.to_rows(), rows);
    }

    #[test]
    fn ragged_rows() {
        let res = LayerWeights::from_rows(vec![vec![1., 2.], vec![3.]]);
        assert!(matches!(res, Err(EngineErr::SizeMismatch { .. })));
    }

    #[test]
    fn exclusive_rows() {
        let mut weights = LayerWeights::zeros(4, 2);
        let ranges = [
            ProcessingRange::new(0, 1).unwrap(),
            ProcessingRange::new(1, 4).unwrap(),
        ];

        let mut chunks = weights.rows_mut_for(&ranges).unwrap();
        chunks[0].fill(1.);
        chunks[1].fill(2.);

        assert_eq!(weights.as_slice(), [1., 1., 2., 2., 2., 2., 2., 2.]);
        assert!(weights.rows_mut_for(&[ProcessingRange::full(5)]).is_err());
    }

    #[test]
    fn serializes_as_rows() {
        let weights = LayerWeights::from_rows(vec![vec![1., -1.]]).unwrap();
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, "[[1.0,-1.0]]");

        let back: LayerWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weights);
    }

    #[test]
    fn topology_shapes() {
        let topology = Topology::new(
            3,
            vec![
                LayerSpec::new(4, ActFn::Identity),
                LayerSpec::new(2, ActFn::Identity),
            ],
        );

        assert_eq!(topology.shapes(), [(4, 3), (2, 4)]);
        assert_eq!(topology.size(), 20);
        assert_eq!(topology.outputs(), 2);
    }
}
