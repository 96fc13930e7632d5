use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used in the entire engine.
pub type Result<T> = std::result::Result<T, EngineErr>;

/// The engine's error type.
#[derive(Debug)]
pub enum EngineErr {
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidRange {
        start: usize,
        stop: usize,
    },
    OverlappingRanges {
        prev_stop: usize,
        next_start: usize,
    },
    OutOfBounds {
        stop: usize,
        len: usize,
    },
    NoWorkers,
    ThreadPool(String),
    InconsistentState(String),
    NotImplemented(&'static str),
    Rand(String),
    Storage(String),
    Config(String),
}

impl Display for EngineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            EngineErr::InvalidRange { start, stop } => {
                write!(f, "Invalid processing range, stop {stop} is before start {start}")
            }
            EngineErr::OverlappingRanges {
                prev_stop,
                next_start,
            } => write!(
                f,
                "Processing ranges overlap or are unordered, a range starts at {next_start} but the previous one stops at {prev_stop}"
            ),
            EngineErr::OutOfBounds { stop, len } => {
                write!(f, "Processing range stops at {stop} but the buffer has {len} elements")
            }
            EngineErr::NoWorkers => f.write_str("Can't partition work across zero workers"),
            EngineErr::ThreadPool(detail) => write!(f, "Failed to build the worker pool: {detail}"),
            EngineErr::InconsistentState(detail) => write!(f, "Inconsistent state: {detail}"),
            EngineErr::NotImplemented(what) => write!(f, "{what} has no default policy"),
            EngineErr::Rand(detail) => write!(f, "Invalid weight distribution: {detail}"),
            EngineErr::Storage(detail) => write!(f, "Snapshot storage error: {detail}"),
            EngineErr::Config(detail) => write!(f, "Invalid configuration: {detail}"),
        }
    }
}

impl Error for EngineErr {}

impl From<NormalError> for EngineErr {
    fn from(value: NormalError) -> Self {
        Self::Rand(value.to_string())
    }
}

impl From<UniformError> for EngineErr {
    fn from(value: UniformError) -> Self {
        Self::Rand(value.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for EngineErr {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(value.to_string())
    }
}

impl From<serde_json::Error> for EngineErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}

/// Checks that two buffers that must be processed together have the same length.
///
/// # Arguments
/// * `a`, `b` - Names of the buffers, used in the error message.
/// * `got` - The length of `a`.
/// * `expected` - The length of `b`.
pub(crate) fn check_len(a: &'static str, b: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(EngineErr::SizeMismatch {
            a,
            b,
            got,
            expected,
        });
    }

    Ok(())
}
