//! Weight-proportional error distribution.
//!
//! A neuron's error is split across its inputs proportionally to the magnitude of each
//! incoming weight, ignoring the sign of the weight and the activation's derivative.
//! This is not the chain rule and must not be replaced by it, trained snapshots depend on it.

use crate::{
    compute::ErrorBackpropagation,
    error::{Result, check_len},
    vector_ops::abs_sum,
    weights::LayerWeights,
};

/// Distributes the `error` of a single neuron over the input-side `errors`.
///
/// `errors[i] += (|weights[i]| / sum(|weights|)) * error`
///
/// A neuron without weights, or whose weights are all zero, contributes nothing.
///
/// # Arguments
/// * `weights` - The incoming weights of the neuron.
/// * `error` - The error of the neuron.
/// * `errors` - The error buffer of the layer's inputs.
///
/// # Returns
/// A `SizeMismatch` error if `errors` doesn't have one entry per weight.
pub fn calculate_neuron_error(weights: &[f32], error: f32, errors: &mut [f32]) -> Result<()> {
    check_len("errors", "weights", errors.len(), weights.len())?;

    let total = abs_sum(weights);
    if total == 0. {
        return Ok(());
    }

    errors
        .iter_mut()
        .zip(weights)
        .for_each(|(e, w)| *e += (w.abs() / total) * error);

    Ok(())
}

/// The state of one backward step through a layer.
pub struct BackpropContext<'a> {
    neurons: &'a LayerWeights,
    errors: &'a mut [f32],
}

impl<'a> BackpropContext<'a> {
    /// Creates a new `BackpropContext`.
    ///
    /// # Arguments
    /// * `neurons` - The weight matrix of the layer.
    /// * `errors` - The error buffer of the layer's inputs.
    ///
    /// # Returns
    /// A `SizeMismatch` error if `errors` doesn't have one entry per input unit.
    pub fn new(neurons: &'a LayerWeights, errors: &'a mut [f32]) -> Result<Self> {
        check_len("errors", "layer inputs", errors.len(), neurons.inputs())?;
        Ok(Self { neurons, errors })
    }

    /// Distributes the error of every neuron of the layer.
    ///
    /// # Arguments
    /// * `layer_errors` - One error per neuron.
    pub fn distribute(self, layer_errors: &[f32]) -> Result<()> {
        check_len("layer errors", "neurons", layer_errors.len(), self.neurons.neurons())?;

        for (weights, &error) in self.neurons.rows().zip(layer_errors) {
            calculate_neuron_error(weights, error, self.errors)?;
        }

        Ok(())
    }
}

/// `ErrorBackpropagation` strategy backed by [`calculate_neuron_error`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightProportionalBackprop;

impl ErrorBackpropagation for WeightProportionalBackprop {
    fn backpropagate(
        &self,
        weights: &LayerWeights,
        errors: &[f32],
        input_errors: &mut [f32],
    ) -> Result<()> {
        BackpropContext::new(weights, input_errors)?.distribute(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conserves_error() {
        let mut errors = [0.; 3];
        calculate_neuron_error(&[1., 1., 2.], 4., &mut errors).unwrap();
        assert_eq!(errors, [1., 1., 2.]);
    }

    #[test]
    fn ignores_sign() {
        let mut errors = [0.; 2];
        calculate_neuron_error(&[-3., 1.], -2., &mut errors).unwrap();
        assert_eq!(errors, [-1.5, -0.5]);
    }

    #[test]
    fn accumulates() {
        let mut errors = [1., 1.];
        calculate_neuron_error(&[1., 1.], 2., &mut errors).unwrap();
        assert_eq!(errors, [2., 2.]);
    }

    #[test]
    fn zero_weights_contribute_nothing() {
        let mut errors = [0.5, 0.5, 0.5];
        calculate_neuron_error(&[0., 0., 0.], 5., &mut errors).unwrap();
        assert_eq!(errors, [0.5, 0.5, 0.5]);
        assert!(errors.iter().all(|e| e.is_finite()));
    }

    #[test]
    fn empty_weights_are_noop() {
        let mut errors: [f32; 0] = [];
        calculate_neuron_error(&[], 5., &mut errors).unwrap();
    }

    #[test]
    fn size_mismatch() {
        let mut errors = [0.; 2];
        assert!(calculate_neuron_error(&[1., 2., 3.], 1., &mut errors).is_err());
    }

    #[test]
    fn distributes_every_neuron() {
        let layer = LayerWeights::from_rows(vec![vec![1., 3.], vec![0., 0.], vec![2., 2.]]).unwrap();
        let mut input_errors = [0.; 2];

        WeightProportionalBackprop
            .backpropagate(&layer, &[4., 10., 1.], &mut input_errors)
            .unwrap();

        assert_eq!(input_errors, [1.5, 3.5]);
    }
}
