pub mod correlation;
pub mod defaults;
pub mod interface;
pub mod lanczos;
pub mod output;

pub use correlation::CorrelationAccumulator;
pub use interface::CiOperator;
pub use lanczos::{
    LanczosPropagator, LanczosPropagatorBuilder, PropagationError, ReducedHamiltonian,
};
