pub mod backprop;
pub mod compute;
pub mod config;
pub mod error;
pub mod factory;
pub mod initialization;
pub mod network;
pub mod range;
pub mod stats;
pub mod storage;
pub mod synchronization;
pub mod vector_ops;
pub mod weights;
pub mod work;

pub use config::{EngineConfig, Sample};
pub use error::{EngineErr, Result};
pub use factory::NetFactory;
pub use network::{Network, StepReport};
pub use stats::{Checkpointer, EpochStatistics, StatisticsManager};
pub use storage::{MemoryStorage, SnapshotStorage};
pub use weights::{LayerSpec, LayerWeights, Topology};
pub use work::WorkerPool;
