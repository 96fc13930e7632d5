use crate::error::{EngineErr, Result};

/// Turns the outputs of a network into a decision.
///
/// There's no sensible default policy, implementors must provide one.
pub trait ScoreConverter {
    fn convert(&self, _outputs: &[f32]) -> Result<usize> {
        Err(EngineErr::NotImplemented("ScoreConverter::convert"))
    }
}

/// Picks the index of the highest output, the first one on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgMax;

impl ScoreConverter for ArgMax {
    fn convert(&self, outputs: &[f32]) -> Result<usize> {
        outputs
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
            .ok_or(EngineErr::SizeMismatch {
                a: "outputs",
                b: "at least one output",
                got: 0,
                expected: 1,
            })
    }
}
