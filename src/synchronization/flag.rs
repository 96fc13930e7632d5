use std::sync::atomic::{AtomicBool, Ordering};

/// A lock-free boolean guarding one-shot state transitions.
///
/// Used to ensure "at most one" semantics, e.g. a single checkpoint in flight,
/// without ever blocking the caller.
#[derive(Debug, Default)]
pub struct ConcurrentFlag {
    value: AtomicBool,
}

impl ConcurrentFlag {
    /// Creates a new `ConcurrentFlag`.
    ///
    /// # Arguments
    /// * `value` - The initial state of the flag.
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    /// Atomically transitions the flag from `!value` to `value`.
    ///
    /// # Arguments
    /// * `value` - The state to transition to.
    ///
    /// # Returns
    /// Whether this call performed the transition.
    pub fn try_set(&self, value: bool) -> bool {
        self.value
            .compare_exchange(!value, value, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    use super::*;

    #[test]
    fn transitions_once() {
        let flag = ConcurrentFlag::new(false);

        assert!(flag.try_set(true));
        assert!(!flag.try_set(true));
        assert!(flag.get());

        assert!(flag.try_set(false));
        assert!(!flag.try_set(false));
        assert!(!flag.get());
    }

    #[test]
    fn single_winner_under_contention() {
        const THREADS: usize = 16;

        let flag = Arc::new(ConcurrentFlag::default());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let flag = Arc::clone(&flag);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if flag.try_set(true) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
