pub mod defaults;
pub mod fci;
pub mod io;
pub mod utils;

pub use fci::{kernel_lanczos, CorrelationResult, FciError, InitialGuess, Integrals};
pub use io::Configuration;
