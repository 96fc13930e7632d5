mod activation;
mod computers;
mod dense;
mod registry;
mod score;

pub use activation::ActFn;
pub use computers::{Calculate, Compensate, Compensation, ErrorBackpropagation, LayerComputers, Predict};
pub use dense::{DeltaCompensate, DenseCalculate, DensePredict, NoCompensate};
pub use registry::ComputerRegistry;
pub use score::{ArgMax, ScoreConverter};
