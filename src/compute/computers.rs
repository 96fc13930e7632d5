use std::sync::Arc;

use super::{ActFn, DeltaCompensate, DenseCalculate, DensePredict, NoCompensate};
use crate::{
    backprop::WeightProportionalBackprop, error::Result, range::ProcessingRange,
    weights::LayerWeights,
};

/// Forward pass used while training.
///
/// Works on a single neuron range so the pass can be split across workers.
pub trait Calculate: Send + Sync {
    /// Should compute the outputs of the neurons in `range`.
    ///
    /// # Arguments
    /// * `weights` - The layer's weights.
    /// * `input` - The full input vector of the layer.
    /// * `outputs` - The exclusive output slice of `range`, it's kept by the layer afterwards.
    /// * `range` - The neurons to compute.
    ///
    /// # Returns
    /// An error if the buffers don't match the layer's shape.
    fn calculate(
        &self,
        weights: &LayerWeights,
        input: &[f32],
        outputs: &mut [f32],
        range: ProcessingRange,
    ) -> Result<()>;
}

/// Forward pass used for inference, retains nothing.
pub trait Predict: Send + Sync {
    /// Should return the outputs of every neuron of the layer.
    fn predict(&self, weights: &LayerWeights, input: &[f32]) -> Result<Vec<f32>>;
}

/// Weight update of a layer whose error is already known.
pub trait Compensate: Send + Sync {
    /// Should update the weights of the neurons in `range` in place.
    ///
    /// # Arguments
    /// * `rows` - The exclusive row-major weights of the neurons in `range`.
    /// * `input` - The input the layer saw during the forward pass.
    /// * `learning_rate` - Scales the size of the update.
    /// * `errors` - The per-neuron error of the whole layer.
    /// * `outputs` - The recorded per-neuron outputs of the whole layer.
    /// * `range` - The neurons owned by this call.
    ///
    /// # Returns
    /// An error if the buffers don't match the layer's shape.
    fn compensate(
        &self,
        rows: &mut [f32],
        input: &[f32],
        learning_rate: f32,
        errors: &[f32],
        outputs: &[f32],
        range: ProcessingRange,
    ) -> Result<()>;
}

/// Pushes a layer's output error back as error of its inputs.
pub trait ErrorBackpropagation: Send + Sync {
    /// Should accumulate into `input_errors` the share of `errors` that each input is blamed for.
    fn backpropagate(
        &self,
        weights: &LayerWeights,
        errors: &[f32],
        input_errors: &mut [f32],
    ) -> Result<()>;
}

/// The compensation strategy of a layer.
///
/// `Frozen` layers keep their weights untouched no matter the inputs.
#[derive(Clone)]
pub enum Compensation {
    Delta(DeltaCompensate),
    Frozen(NoCompensate),
    Custom(Arc<dyn Compensate>),
}

impl Compensation {
    pub fn is_frozen(&self) -> bool {
        matches!(self, Compensation::Frozen(_))
    }
}

impl Compensate for Compensation {
    fn compensate(
        &self,
        rows: &mut [f32],
        input: &[f32],
        learning_rate: f32,
        errors: &[f32],
        outputs: &[f32],
        range: ProcessingRange,
    ) -> Result<()> {
        match self {
            Compensation::Delta(c) => {
                c.compensate(rows, input, learning_rate, errors, outputs, range)
            }
            Compensation::Frozen(c) => {
                c.compensate(rows, input, learning_rate, errors, outputs, range)
            }
            Compensation::Custom(c) => {
                c.compensate(rows, input, learning_rate, errors, outputs, range)
            }
        }
    }
}

/// The four computation strategies of a single layer.
#[derive(Clone)]
pub struct LayerComputers {
    pub calculate: Arc<dyn Calculate>,
    pub predict: Arc<dyn Predict>,
    pub compensate: Compensation,
    pub backprop: Arc<dyn ErrorBackpropagation>,
}

impl LayerComputers {
    /// Creates the strategies of a fully connected, trainable layer.
    ///
    /// # Arguments
    /// * `act_fn` - The activation function of the layer.
    pub fn dense(act_fn: ActFn) -> Self {
        Self {
            calculate: Arc::new(DenseCalculate::new(act_fn)),
            predict: Arc::new(DensePredict::new(act_fn)),
            compensate: Compensation::Delta(DeltaCompensate::new(act_fn)),
            backprop: Arc::new(WeightProportionalBackprop),
        }
    }

    /// Same as `dense` but the weights are never updated.
    pub fn frozen(act_fn: ActFn) -> Self {
        Self::dense(act_fn).freeze()
    }

    pub fn freeze(mut self) -> Self {
        self.compensate = Compensation::Frozen(NoCompensate);
        self
    }

    pub fn with_calculate(mut self, calculate: Arc<dyn Calculate>) -> Self {
        self.calculate = calculate;
        self
    }

    pub fn with_predict(mut self, predict: Arc<dyn Predict>) -> Self {
        self.predict = predict;
        self
    }

    pub fn with_compensate(mut self, compensate: Compensation) -> Self {
        self.compensate = compensate;
        self
    }

    pub fn with_backprop(mut self, backprop: Arc<dyn ErrorBackpropagation>) -> Self {
        self.backprop = backprop;
        self
    }
}
