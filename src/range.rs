use std::{mem, ops::Range};

use crate::error::{EngineErr, Result};

/// A contiguous, half-open slice `[start, stop)` of neuron or element indices
/// assigned to a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessingRange {
    start: usize,
    stop: usize,
}

impl ProcessingRange {
    /// Creates a new `ProcessingRange`.
    ///
    /// # Arguments
    /// * `start` - The first index of the range.
    /// * `stop` - One past the last index of the range.
    ///
    /// # Returns
    /// An `InvalidRange` error if `stop < start`.
    pub fn new(start: usize, stop: usize) -> Result<Self> {
        if stop < start {
            return Err(EngineErr::InvalidRange { start, stop });
        }

        Ok(Self { start, stop })
    }

    /// The range covering `[0, len)`.
    pub fn full(len: usize) -> Self {
        Self { start: 0, stop: len }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn stop(&self) -> usize {
        self.stop
    }

    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    pub fn contains(&self, idx: usize) -> bool {
        (self.start..self.stop).contains(&idx)
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.stop
    }
}

/// Splits `[0, len)` into at most `workers` non-empty ranges.
///
/// The ranges are ordered, pairwise disjoint and cover every index exactly once.
/// Their sizes differ by at most one, the first `len % workers` ranges being the bigger ones.
///
/// # Arguments
/// * `len` - The size of the index domain.
/// * `workers` - The maximum amount of ranges to produce.
///
/// # Returns
/// The ranges, or `NoWorkers` if `workers` is zero.
pub fn partition(len: usize, workers: usize) -> Result<Vec<ProcessingRange>> {
    if workers == 0 {
        return Err(EngineErr::NoWorkers);
    }

    let base = len / workers;
    let extra = len % workers;
    let nranges = workers.min(len);

    let mut ranges = Vec::with_capacity(nranges);
    let mut start = 0;

    for i in 0..nranges {
        let size = base + (i < extra) as usize;
        ranges.push(ProcessingRange {
            start,
            stop: start + size,
        });
        start += size;
    }

    Ok(ranges)
}

/// Hands out one exclusive sub-slice of `buf` per range.
///
/// Every index of a range owns `stride` consecutive elements of `buf`, which lets the same
/// neuron ranges address both per-neuron buffers (`stride == 1`) and row-major weight matrices
/// (`stride == inputs`).
///
/// # Arguments
/// * `buf` - The shared buffer to split.
/// * `ranges` - Ordered and disjoint ranges.
/// * `stride` - The amount of elements per index.
///
/// # Returns
/// The sub-slices in the same order as `ranges`, or an error if the ranges overlap,
/// are unordered or go past the end of the buffer.
pub fn split_disjoint_mut<'a, T>(
    buf: &'a mut [T],
    ranges: &[ProcessingRange],
    stride: usize,
) -> Result<Vec<&'a mut [T]>> {
    let len = buf.len();
    let mut rest = buf;
    let mut offset = 0;
    let mut chunks = Vec::with_capacity(ranges.len());

    for range in ranges {
        if range.start < offset {
            return Err(EngineErr::OverlappingRanges {
                prev_stop: offset,
                next_start: range.start,
            });
        }

        if range.stop * stride > len {
            return Err(EngineErr::OutOfBounds {
                stop: range.stop * stride,
                len,
            });
        }

        let (_, tail) = mem::take(&mut rest).split_at_mut((range.start - offset) * stride);
        let (chunk, tail) = tail.split_at_mut(range.len() * stride);
        chunks.push(chunk);

        rest = tail;
        offset = range.stop;
    }

    Ok(chunks)
}
