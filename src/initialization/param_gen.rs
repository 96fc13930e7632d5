use std::iter;

use crate::{
    error::{Result, check_len},
    weights::LayerWeights,
};

/// Draws the initial weights of a single layer, neuron after neuron and input after input.
pub trait ParamGen {
    /// The amount of weights left to draw.
    fn remaining(&self) -> usize;

    /// Should draw the next weight, `None` once the layer is complete.
    fn draw(&mut self) -> Option<f32>;

    /// Draws every remaining weight into a `neurons x inputs` layer.
    ///
    /// # Returns
    /// A `SizeMismatch` error if the generator doesn't hold exactly one layer's worth of weights.
    fn layer(&mut self, neurons: usize, inputs: usize) -> Result<LayerWeights> {
        check_len("remaining weights", "layer size", self.remaining(), neurons * inputs)?;

        let values = iter::from_fn(|| self.draw()).collect();
        LayerWeights::new(neurons, inputs, values)
    }
}
