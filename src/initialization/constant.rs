use super::ParamGen;

/// Fills a layer with a single value, mostly useful for tests and reproducible baselines.
#[derive(Debug, Clone, Copy)]
pub struct ConstParamGen {
    value: f32,
    remaining: usize,
}

impl ConstParamGen {
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }
}

impl ParamGen for ConstParamGen {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn draw(&mut self) -> Option<f32> {
        self.remaining = self.remaining.checked_sub(1)?;
        Some(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts() {
        let mut param_gen = ConstParamGen::new(0.5, 2);

        assert_eq!(param_gen.draw(), Some(0.5));
        assert_eq!(param_gen.remaining(), 1);
        assert_eq!(param_gen.draw(), Some(0.5));
        assert_eq!(param_gen.draw(), None);
    }

    #[test]
    fn builds_layer() {
        let layer = ConstParamGen::new(-1., 6).layer(2, 3).unwrap();
        assert_eq!(layer.to_rows(), vec![vec![-1.; 3]; 2]);
    }

    #[test]
    fn wrong_layer_size() {
        assert!(ConstParamGen::new(1., 5).layer(2, 3).is_err());
    }
}
