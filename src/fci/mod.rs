use std::fmt;

pub use analysis::*;
pub use cistring::*;
pub use dipole::*;
pub use hamiltonian::*;
pub use integrals::*;
pub use kernel::*;
pub use precond::*;
pub use pspace::*;
pub use rdm::*;
pub use solver::*;

mod analysis;
pub mod cistring;
mod dipole;
mod hamiltonian;
mod integrals;
mod kernel;
pub(crate) mod logging;
mod precond;
mod pspace;
mod rdm;
mod solver;
pub mod solvers;

/// Errors of the full configuration interaction stage.
#[derive(Debug, Clone, PartialEq)]
pub enum FciError {
    /// Complex one- or two-electron integrals cannot be handled by the real eigensolver.
    ComplexHamiltonian,
    /// Occupation strings are packed into 64 bit integers.
    TooManyOrbitals(usize),
    InvalidElectrons { norb: usize, nelec: (usize, usize) },
    ShapeMismatch(String),
    InvalidConfig(String),
    NoDipoleAxes,
    Linalg(String),
    ThreadPool(String),
}

impl fmt::Display for FciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FciError::ComplexHamiltonian => write!(f, "Complex Hamiltonian is not supported"),
            FciError::TooManyOrbitals(norb) => write!(
                f,
                "{} orbitals exceed the maximum of {} orbitals",
                norb, MAX_PACKED_ORBITALS
            ),
            FciError::InvalidElectrons { norb, nelec } => write!(
                f,
                "({}, {}) electrons cannot be placed in {} orbitals",
                nelec.0, nelec.1, norb
            ),
            FciError::ShapeMismatch(message) => write!(f, "shape mismatch: {}", message),
            FciError::InvalidConfig(message) => write!(f, "invalid configuration: {}", message),
            FciError::NoDipoleAxes => write!(f, "no polarization axis selected"),
            FciError::Linalg(message) => write!(f, "linear algebra failure: {}", message),
            FciError::ThreadPool(message) => write!(f, "thread pool failure: {}", message),
        }
    }
}

impl std::error::Error for FciError {}
