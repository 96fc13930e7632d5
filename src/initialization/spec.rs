use std::{cell::RefCell, ops::Range, rc::Rc};

use rand::Rng;
use rand_distr::{Normal, Uniform};
use serde::{Deserialize, Serialize};

use super::{ConstParamGen, ParamGen, RandParamGen};
use crate::error::Result;

/// The distribution the initial weights of a layer are drawn from.
///
/// Fan-based variants take the fan of the layer being initialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSpec {
    Const { value: f32 },
    Uniform { low: f32, high: f32 },
    Normal { mean: f32, std_dev: f32 },
    XavierUniform,
    LecunUniform,
    Kaiming,
}

impl Default for DistributionSpec {
    fn default() -> Self {
        Self::Uniform {
            low: -0.5,
            high: 0.5,
        }
    }
}

impl DistributionSpec {
    /// Resolves the weight generator of a single layer.
    ///
    /// # Arguments
    /// * `rng` - The random number generator shared by every layer of the network.
    /// * `neurons` - The fan out of the layer.
    /// * `inputs` - The fan in of the layer.
    ///
    /// # Returns
    /// A generator of exactly `neurons * inputs` weights, or a `Rand` error if the
    /// distribution parameters are invalid.
    pub fn param_gen<R>(
        &self,
        rng: Rc<RefCell<R>>,
        neurons: usize,
        inputs: usize,
    ) -> Result<Box<dyn ParamGen>>
    where
        R: Rng + 'static,
    {
        let limit = neurons * inputs;
        let (fan_in, fan_out) = (inputs as f32, neurons as f32);

        let param_gen: Box<dyn ParamGen> = match *self {
            DistributionSpec::Const { value } => Box::new(ConstParamGen::new(value, limit)),
            DistributionSpec::Uniform { low, high } => uniform(rng, limit, low..high)?,
            DistributionSpec::Normal { mean, std_dev } => normal(rng, limit, mean, std_dev)?,
            DistributionSpec::XavierUniform => {
                let bound = (6. / (fan_in + fan_out)).sqrt();
                uniform(rng, limit, -bound..bound)?
            }
            DistributionSpec::LecunUniform => {
                let bound = (3. / fan_in).sqrt();
                uniform(rng, limit, -bound..bound)?
            }
            DistributionSpec::Kaiming => normal(rng, limit, 0., (2. / fan_in).sqrt())?,
        };

        Ok(param_gen)
    }
}

/// Weights drawn uniformly from `range`, empty or unbounded ranges are rejected.
fn uniform<R>(rng: Rc<RefCell<R>>, limit: usize, range: Range<f32>) -> Result<Box<dyn ParamGen>>
where
    R: Rng + 'static,
{
    let distribution = Uniform::new(range.start, range.end)?;
    Ok(Box::new(RandParamGen::new(rng, distribution, limit)))
}

/// Normally distributed weights, an invalid deviation is rejected.
fn normal<R>(rng: Rc<RefCell<R>>, limit: usize, mean: f32, std_dev: f32) -> Result<Box<dyn ParamGen>>
where
    R: Rng + 'static,
{
    let distribution = Normal::new(mean, std_dev)?;
    Ok(Box::new(RandParamGen::new(rng, distribution, limit)))
}
