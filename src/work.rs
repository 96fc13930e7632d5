use log::debug;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    error::{EngineErr, Result, check_len},
    range::{ProcessingRange, partition, split_disjoint_mut},
    synchronization::CountDownLatch,
    vector_ops,
};

/// A unit of output-error work: the slice of `dest` owned by `range`.
///
/// `expected` and `actual` are shared read-only by every item of a dispatch, `dest` is
/// exclusive to this item so no two items can write the same index.
#[derive(Debug)]
pub struct WorkInfo<'a> {
    pub range: ProcessingRange,
    pub expected: &'a [f32],
    pub actual: &'a [f32],
    pub dest: &'a mut [f32],
}

impl WorkInfo<'_> {
    /// Accumulates `expected - actual` over this item's range.
    pub fn run(self) -> Result<()> {
        vector_ops::subtract_into(self.expected, self.actual, self.dest, self.range)
    }
}

/// A pool of worker threads executing range-scoped work items.
///
/// The calling thread never runs work itself, it only blocks on the latch of each dispatch.
/// It must not be one of the pool's own threads.
pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Creates a new `WorkerPool`.
    ///
    /// # Arguments
    /// * `threads` - The amount of worker threads, also the amount of slices per operation.
    ///
    /// # Returns
    /// `NoWorkers` if `threads` is zero or an error if the threads couldn't be spawned.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(EngineErr::NoWorkers);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("engine-worker-{idx}"))
            .build()?;

        debug!(threads = threads; "worker pool ready");
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Splits `[0, len)` into one range per worker.
    pub fn partition(&self, len: usize) -> Result<Vec<ProcessingRange>> {
        partition(len, self.threads)
    }

    /// Runs `f` once per item on the pool and blocks until every item has signaled.
    ///
    /// The latch is armed with `items.len()` before the first item is spawned, every item
    /// signals it exactly once, even if `f` panics.
    ///
    /// # Returns
    /// The first error returned by any item.
    pub fn dispatch<T, F>(&self, items: Vec<T>, f: F) -> Result<()>
    where
        T: Send,
        F: Fn(T) -> Result<()> + Sync,
    {
        let latch = CountDownLatch::new(items.len());
        let failure: Mutex<Option<EngineErr>> = Mutex::new(None);

        self.pool.in_place_scope(|scope| {
            for item in items {
                let (latch, f, failure) = (&latch, &f, &failure);

                scope.spawn(move |_| {
                    let _signal = latch.guard();
                    if let Err(e) = f(item) {
                        let mut failure = failure.lock();
                        if failure.is_none() {
                            *failure = Some(e);
                        }
                    }
                });
            }

            latch.wait();
        });

        match failure.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Splits `buf` in one exclusive chunk per worker and runs `f` over each of them.
    ///
    /// # Arguments
    /// * `buf` - The shared buffer, `len * stride` elements long.
    /// * `len` - The amount of indices in the domain.
    /// * `stride` - Elements of `buf` per index.
    /// * `f` - Receives the range and its exclusive chunk.
    pub fn for_each_range<T, F>(&self, buf: &mut [T], len: usize, stride: usize, f: F) -> Result<()>
    where
        T: Send,
        F: Fn(ProcessingRange, &mut [T]) -> Result<()> + Sync,
    {
        check_len("buffer", "len * stride", buf.len(), len * stride)?;

        let ranges = self.partition(len)?;
        let chunks = split_disjoint_mut(buf, &ranges, stride)?;
        let items: Vec<_> = ranges.into_iter().zip(chunks).collect();

        self.dispatch(items, |(range, chunk)| f(range, chunk))
    }

    /// Accumulates `expected - actual` into `dest`, partitioned across the workers.
    pub fn output_error(&self, expected: &[f32], actual: &[f32], dest: &mut [f32]) -> Result<()> {
        check_len("actual", "expected", actual.len(), expected.len())?;
        check_len("dest", "expected", dest.len(), expected.len())?;

        let ranges = self.partition(dest.len())?;
        let chunks = split_disjoint_mut(dest, &ranges, 1)?;
        let items: Vec<_> = ranges
            .into_iter()
            .zip(chunks)
            .map(|(range, dest)| WorkInfo {
                range,
                expected,
                actual,
                dest,
            })
            .collect();

        self.dispatch(items, WorkInfo::run)
    }
}
