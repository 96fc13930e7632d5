use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

/// Unblocks waiters once a fixed amount of completion signals have been received.
///
/// The count must be set to the amount of dispatched slices before dispatching any of them.
#[derive(Debug)]
pub struct CountDownLatch {
    count: AtomicUsize,
    lock: Mutex<()>,
    zero: Condvar,
}

impl CountDownLatch {
    /// Creates a new `CountDownLatch`.
    ///
    /// # Arguments
    /// * `count` - The amount of signals to wait for.
    pub fn new(count: usize) -> Self {
        Self {
            count: AtomicUsize::new(count),
            lock: Mutex::new(()),
            zero: Condvar::new(),
        }
    }

    /// Signals the completion of one slice.
    ///
    /// # Panics
    /// If the latch was already released, a slice signaling twice is a bug.
    pub fn count_down(&self) {
        let prev = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or_else(|_| panic!("latch counted down more times than it was dispatched"));

        if prev == 1 {
            let _guard = self.lock.lock();
            self.zero.notify_all();
        }
    }

    /// The amount of signals still pending.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until the count reaches zero.
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while self.count.load(Ordering::Acquire) > 0 {
            self.zero.wait(&mut guard);
        }
    }

    /// Returns a guard that signals this latch exactly once when dropped.
    pub fn guard(&self) -> CountDownGuard<'_> {
        CountDownGuard { latch: self }
    }
}

/// Counts down its latch on drop, even when the slice panics.
#[derive(Debug)]
pub struct CountDownGuard<'a> {
    latch: &'a CountDownLatch,
}

impl Drop for CountDownGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;

    #[test]
    fn zero_count_does_not_block() {
        let latch = CountDownLatch::new(0);
        latch.wait();
    }

    #[test]
    fn releases_after_all_signals() {
        const SLICES: usize = 8;

        let latch = Arc::new(CountDownLatch::new(SLICES));

        for i in 0..SLICES {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(i as u64));
                let _guard = latch.guard();
            });
        }

        latch.wait();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    #[should_panic]
    fn extra_signal_panics() {
        let latch = CountDownLatch::new(1);
        latch.count_down();
        latch.count_down();
    }
}
