use crate::lanczos::PropagationError;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Eigh, UPLO};

/// Tridiagonal representation of the Hamiltonian in the Krylov space of one restart. The first
/// restart is built from a real seed and stays real; every later restart works on complex
/// vectors and stores a complex (Hermitian) matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum ReducedHamiltonian {
    Real(Array2<f64>),
    Complex(Array2<c64>),
}

impl ReducedHamiltonian {
    /// Assemble the full tridiagonal matrix from the recurrence coefficients. All `m - 1`
    /// off-diagonal couplings are placed; the sub-diagonal is the conjugate of the
    /// super-diagonal.
    pub fn from_recurrence(alpha: &[f64], beta: &[f64], complex: bool) -> Self {
        let m: usize = alpha.len();
        let mut ht: Array2<f64> = Array2::from_diag(&Array1::from(alpha.to_vec()));
        for (p, b) in beta.iter().enumerate().take(m.saturating_sub(1)) {
            ht[[p, p + 1]] = *b;
            ht[[p + 1, p]] = *b;
        }
        if complex {
            ReducedHamiltonian::Complex(ht.mapv(c64::from))
        } else {
            ReducedHamiltonian::Real(ht)
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            ReducedHamiltonian::Real(ht) => ht.nrows(),
            ReducedHamiltonian::Complex(ht) => ht.nrows(),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ReducedHamiltonian::Complex(_))
    }

    pub fn to_complex(&self) -> Array2<c64> {
        match self {
            ReducedHamiltonian::Real(ht) => ht.mapv(c64::from),
            ReducedHamiltonian::Complex(ht) => ht.clone(),
        }
    }

    /// Largest deviation |H_ij - conj(H_ji)|.
    pub fn hermiticity_error(&self) -> f64 {
        let ht: Array2<c64> = self.to_complex();
        let adjoint: Array2<c64> = ht.t().mapv(|val| val.conj());
        (&ht - &adjoint)
            .iter()
            .fold(0.0, |acc: f64, val| acc.max(val.norm()))
    }

    pub fn is_hermitian(&self, threshold: f64) -> bool {
        self.hermiticity_error() < threshold
    }

    /// Eigenvalues in ascending order and the eigenvectors as columns.
    pub fn eigh(&self) -> Result<(Array1<f64>, Array2<c64>), PropagationError> {
        match self {
            ReducedHamiltonian::Real(ht) => {
                let (w, t): (Array1<f64>, Array2<f64>) = ht
                    .eigh(UPLO::Lower)
                    .map_err(|err| PropagationError::Linalg(err.to_string()))?;
                Ok((w, t.mapv(c64::from)))
            }
            ReducedHamiltonian::Complex(ht) => ht
                .eigh(UPLO::Lower)
                .map_err(|err| PropagationError::Linalg(err.to_string())),
        }
    }

    /// Time evolution operator exp(-i Ht t) = T diag(exp(-i w t)) T^H.
    pub fn propagator(&self, time: f64) -> Result<Array2<c64>, PropagationError> {
        let (w, t): (Array1<f64>, Array2<c64>) = self.eigh()?;
        Ok(propagator_from_eigenpairs(w.view(), t.view(), time))
    }
}

pub fn propagator_from_eigenpairs(
    w: ArrayView1<f64>,
    t: ArrayView2<c64>,
    time: f64,
) -> Array2<c64> {
    let phases: Array1<c64> = w.mapv(|e| c64::new(0.0, -e * time).exp());
    let scaled: Array2<c64> = &t * &phases;
    scaled.dot(&t.t().mapv(|val| val.conj()))
}
