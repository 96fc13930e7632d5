use serde::{Deserialize, Serialize};

/// The activation function applied to a neuron's weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFn {
    Identity,
    Sigmoid { amp: f32 },
}

impl Default for ActFn {
    fn default() -> Self {
        Self::sigmoid(1.)
    }
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid { amp }
    }

    pub fn f(&self, z: f32) -> f32 {
        match *self {
            ActFn::Identity => z,
            ActFn::Sigmoid { amp } => amp / (1. + (-z).exp()),
        }
    }

    pub fn df(&self, z: f32) -> f32 {
        match *self {
            ActFn::Identity => 1.,
            ActFn::Sigmoid { amp } => (amp * (-z).exp()) / ((-z).exp() + 1.).powi(2),
        }
    }

    /// The derivative expressed in terms of the activation's output `a = f(z)`.
    ///
    /// Lets compensation work from the recorded outputs without keeping the weighted sums.
    pub fn df_from_output(&self, a: f32) -> f32 {
        match *self {
            ActFn::Identity => 1.,
            ActFn::Sigmoid { amp } if amp == 0. => 0.,
            ActFn::Sigmoid { amp } => a * (1. - a / amp),
        }
    }

    /// Applies the activation in place.
    pub fn apply(&self, zs: &mut [f32]) {
        if let ActFn::Identity = self {
            return;
        }

        zs.iter_mut().for_each(|z| *z = self.f(*z));
    }
}
