use std::fmt;

pub use krylov::*;
pub use propagator::*;
pub use reduced::*;

mod krylov;
mod propagator;
mod reduced;

/// Failure modes of the restarted Lanczos propagation. All of them only end the propagation
/// of the current polarization axis; the samples gathered until then stay valid.
#[derive(Debug, Clone, PartialEq)]
pub enum PropagationError {
    /// The vector that should seed the next Krylov space has (almost) zero norm.
    VanishingNorm { time: f64, norm: f64 },
    /// The Lanczos recursion terminated before a second basis vector was found.
    KrylovCollapse { time: f64, dim: usize },
    /// The estimated time step is below the allowed minimum or not a number.
    StepTooSmall { time: f64, step: f64 },
    /// The maximal number of Krylov restarts was reached before `maxtime`.
    RestartLimit { time: f64, restarts: usize },
    /// Diagonalization of the reduced Hamiltonian failed.
    Linalg(String),
}

impl fmt::Display for PropagationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationError::VanishingNorm { time, norm } => write!(
                f,
                "propagated vector vanished at t = {:.6} (norm {:.3e})",
                time, norm
            ),
            PropagationError::KrylovCollapse { time, dim } => write!(
                f,
                "Krylov space collapsed to dimension {} at t = {:.6}",
                dim, time
            ),
            PropagationError::StepTooSmall { time, step } => write!(
                f,
                "time step {:.3e} is too small at t = {:.6}",
                step, time
            ),
            PropagationError::RestartLimit { time, restarts } => write!(
                f,
                "restart limit of {} reached at t = {:.6}",
                restarts, time
            ),
            PropagationError::Linalg(message) => {
                write!(f, "diagonalization of reduced Hamiltonian failed: {}", message)
            }
        }
    }
}

impl std::error::Error for PropagationError {}
