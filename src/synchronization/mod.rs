mod flag;
mod latch;

pub use flag::ConcurrentFlag;
pub use latch::{CountDownGuard, CountDownLatch};
