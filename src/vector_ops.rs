use crate::{
    error::{EngineErr, Result, check_len},
    range::ProcessingRange,
};

/// Returns the sum of the absolute values of `weights`.
pub fn abs_sum(weights: &[f32]) -> f32 {
    weights.iter().map(|w| w.abs()).sum()
}

/// Accumulates `expected[i] - actual[i]` into `dest[i]` for every `i` in `range`.
///
/// # Returns
/// An error if the buffers have different lengths or `range` goes past their end.
pub fn subtract(
    expected: &[f32],
    actual: &[f32],
    dest: &mut [f32],
    range: ProcessingRange,
) -> Result<()> {
    check_len("actual", "expected", actual.len(), expected.len())?;
    check_len("dest", "expected", dest.len(), expected.len())?;

    if range.stop() > dest.len() {
        return Err(EngineErr::OutOfBounds {
            stop: range.stop(),
            len: dest.len(),
        });
    }

    subtract_into(expected, actual, &mut dest[range.as_range()], range)
}

/// Range-local variant of [`subtract`].
///
/// `dest` is the exclusive sub-slice owned by `range`, its first element maps to
/// `range.start()` of `expected` and `actual`.
///
/// # Returns
/// An error if `dest` doesn't have `range.len()` elements or `range` goes past the inputs.
pub fn subtract_into(
    expected: &[f32],
    actual: &[f32],
    dest: &mut [f32],
    range: ProcessingRange,
) -> Result<()> {
    let len = expected.len().min(actual.len());
    if range.stop() > len {
        return Err(EngineErr::OutOfBounds {
            stop: range.stop(),
            len,
        });
    }

    check_len("dest", "range", dest.len(), range.len())?;

    let expected = &expected[range.as_range()];
    let actual = &actual[range.as_range()];

    dest.iter_mut()
        .zip(expected.iter().zip(actual))
        .for_each(|(d, (e, a))| *d += e - a);

    Ok(())
}
