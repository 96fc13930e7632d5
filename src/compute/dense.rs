use ndarray::{ArrayView1, ArrayView2};

use super::{ActFn, Calculate, Compensate, Predict};
use crate::{
    error::{EngineErr, Result, check_len},
    range::ProcessingRange,
    weights::LayerWeights,
};

/// Views the row-major weights of `neurons` neurons as a matrix.
fn view_rows(rows: &[f32], neurons: usize, inputs: usize) -> Result<ArrayView2<'_, f32>> {
    check_len("rows", "neurons * inputs", rows.len(), neurons * inputs)?;
    // The length was checked above, `from_shape` can't fail for a standard layout.
    ArrayView2::from_shape((neurons, inputs), rows).map_err(|_| EngineErr::SizeMismatch {
        a: "rows",
        b: "shape",
        got: rows.len(),
        expected: neurons * inputs,
    })
}

/// Weighted sum followed by the activation function.
#[derive(Debug, Clone, Copy)]
pub struct DenseCalculate {
    act_fn: ActFn,
}

impl DenseCalculate {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn }
    }
}

impl Calculate for DenseCalculate {
    fn calculate(
        &self,
        weights: &LayerWeights,
        input: &[f32],
        outputs: &mut [f32],
        range: ProcessingRange,
    ) -> Result<()> {
        check_len("input", "layer inputs", input.len(), weights.inputs())?;
        check_len("outputs", "range", outputs.len(), range.len())?;

        let w = view_rows(weights.rows_in(range)?, range.len(), weights.inputs())?;
        let z = w.dot(&ArrayView1::from(input));

        outputs
            .iter_mut()
            .zip(z.iter())
            .for_each(|(a, &z)| *a = self.act_fn.f(z));

        Ok(())
    }
}

/// Same computation as `DenseCalculate` over the whole layer, into a fresh buffer.
#[derive(Debug, Clone, Copy)]
pub struct DensePredict {
    act_fn: ActFn,
}

impl DensePredict {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn }
    }
}

impl Predict for DensePredict {
    fn predict(&self, weights: &LayerWeights, input: &[f32]) -> Result<Vec<f32>> {
        check_len("input", "layer inputs", input.len(), weights.inputs())?;

        let w = view_rows(weights.as_slice(), weights.neurons(), weights.inputs())?;
        let mut a = w.dot(&ArrayView1::from(input)).to_vec();
        self.act_fn.apply(&mut a);
        Ok(a)
    }
}

/// Delta rule update.
///
/// `w[n][i] += learning_rate * errors[n] * f'(outputs[n]) * input[i]`, errors being
/// `expected - actual` so that adding moves the output towards the expected value.
#[derive(Debug, Clone, Copy)]
pub struct DeltaCompensate {
    act_fn: ActFn,
}

impl DeltaCompensate {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn }
    }
}

impl Compensate for DeltaCompensate {
    fn compensate(
        &self,
        rows: &mut [f32],
        input: &[f32],
        learning_rate: f32,
        errors: &[f32],
        outputs: &[f32],
        range: ProcessingRange,
    ) -> Result<()> {
        check_len("rows", "range * inputs", rows.len(), range.len() * input.len())?;
        check_len("outputs", "errors", outputs.len(), errors.len())?;
        if range.stop() > errors.len() {
            return Err(EngineErr::OutOfBounds {
                stop: range.stop(),
                len: errors.len(),
            });
        }

        if input.is_empty() {
            return Ok(());
        }

        let errors = &errors[range.as_range()];
        let outputs = &outputs[range.as_range()];

        rows.chunks_exact_mut(input.len())
            .zip(errors.iter().zip(outputs))
            .for_each(|(row, (&e, &a))| {
                let delta = learning_rate * e * self.act_fn.df_from_output(a);
                row.iter_mut().zip(input).for_each(|(w, &x)| *w += delta * x);
            });

        Ok(())
    }
}

/// Leaves the weights untouched, used to freeze a layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompensate;

impl Compensate for NoCompensate {
    fn compensate(
        &self,
        _rows: &mut [f32],
        _input: &[f32],
        _learning_rate: f32,
        _errors: &[f32],
        _outputs: &[f32],
        _range: ProcessingRange,
    ) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> LayerWeights {
        LayerWeights::from_rows(vec![vec![1., 2.], vec![-1., 0.5], vec![0., 3.]]).unwrap()
    }

    #[test]
    fn calculate_range_matches_predict() {
        let weights = layer();
        let input = [0.5, -1.];
        let act_fn = ActFn::sigmoid(1.);

        let full = DensePredict::new(act_fn).predict(&weights, &input).unwrap();

        let mut outputs = [0.; 2];
        let range = ProcessingRange::new(1, 3).unwrap();
        DenseCalculate::new(act_fn)
            .calculate(&weights, &input, &mut outputs, range)
            .unwrap();

        for (a, b) in outputs.iter().zip(&full[1..]) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn identity_predict_is_matmul() {
        let out = DensePredict::new(ActFn::Identity)
            .predict(&layer(), &[1., 1.])
            .unwrap();
        assert_eq!(out, [3., -0.5, 3.]);
    }

    #[test]
    fn predict_rejects_bad_input() {
        assert!(DensePredict::new(ActFn::Identity).predict(&layer(), &[1.]).is_err());
    }

    #[test]
    fn delta_moves_towards_expected() {
        let mut rows = vec![0.5, 0.5];
        let input = [1., 2.];
        let errors = [0., 1.];
        let outputs = [0., 0.];
        let range = ProcessingRange::new(1, 2).unwrap();

        DeltaCompensate::new(ActFn::Identity)
            .compensate(&mut rows, &input, 0.1, &errors, &outputs, range)
            .unwrap();

        assert!((rows[0] - 0.6).abs() < 1e-6);
        assert!((rows[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn no_compensate_leaves_rows() {
        let mut rows = vec![0.25, -4., 7.5];
        let before = rows.clone();

        NoCompensate
            .compensate(&mut rows, &[9., 9., 9.], 100., &[3.], &[1.], ProcessingRange::full(1))
            .unwrap();

        assert_eq!(rows, before);
    }
}
