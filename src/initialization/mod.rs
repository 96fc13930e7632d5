mod constant;
mod param_gen;
mod random;
mod spec;

pub use constant::ConstParamGen;
pub use param_gen::ParamGen;
pub use random::RandParamGen;
pub use spec::DistributionSpec;
