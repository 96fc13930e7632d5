use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::Distribution;

use super::ParamGen;

/// A weight generator that follows a certain probabilistic distribution.
///
/// Weights are drawn one by one from the shared `rng`, so the same seeded rng always
/// yields the same sequence.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen` weight generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn draw(&mut self) -> Option<f32> {
        self.remaining = self.remaining.checked_sub(1)?;
        Some(self.distribution.sample(&mut *self.rng.borrow_mut()))
    }
}
