use crate::fci::{FciError, MAX_PACKED_ORBITALS};
use ndarray::prelude::*;

/// Real one- and two-electron integrals in the orthonormal orbital basis.
/// The two-electron integrals are stored in chemists' notation `eri[i,j,k,l] = (ij|kl)`.
#[derive(Debug, Clone)]
pub struct Integrals {
    pub h1e: Array2<f64>,
    pub eri: Array4<f64>,
    pub ecore: f64,
}

impl Integrals {
    pub fn new(h1e: Array2<f64>, eri: Array4<f64>, ecore: f64) -> Result<Self, FciError> {
        let norb: usize = h1e.nrows();
        if h1e.ncols() != norb {
            return Err(FciError::ShapeMismatch(format!(
                "one-electron integrals of shape {:?} are not square",
                h1e.shape()
            )));
        }
        if eri.dim() != (norb, norb, norb, norb) {
            return Err(FciError::ShapeMismatch(format!(
                "two-electron integrals of shape {:?} do not match {} orbitals",
                eri.shape(),
                norb
            )));
        }
        if norb > MAX_PACKED_ORBITALS {
            return Err(FciError::TooManyOrbitals(norb));
        }
        Ok(Self { h1e, eri, ecore })
    }

    /// Two-electron integrals given as a `norb^2 x norb^2` matrix with compound indices
    /// `ij = i * norb + j`.
    pub fn from_matrix(h1e: Array2<f64>, eri: ArrayView2<f64>, ecore: f64) -> Result<Self, FciError> {
        let norb: usize = h1e.nrows();
        let n2: usize = norb * norb;
        if eri.dim() != (n2, n2) {
            return Err(FciError::ShapeMismatch(format!(
                "two-electron integrals of shape {:?} do not match {} orbitals",
                eri.shape(),
                norb
            )));
        }
        let eri4: Array4<f64> = Array4::from_shape_fn((norb, norb, norb, norb), |(i, j, k, l)| {
            eri[[i * norb + j, k * norb + l]]
        });
        Self::new(h1e, eri4, ecore)
    }

    pub fn norb(&self) -> usize {
        self.h1e.nrows()
    }

    /// Largest deviation of the integrals from the symmetry of a Hermitian operator.
    pub fn hermiticity_error(&self) -> f64 {
        hermiticity_error(self.h1e.view(), self.eri.view())
    }
}

/// max(|h1e - h1e^T|, |eri - eri.transpose(1, 0, 3, 2)|)
pub fn hermiticity_error(h1e: ArrayView2<f64>, eri: ArrayView4<f64>) -> f64 {
    let h1e_error: f64 = (&h1e - &h1e.t())
        .iter()
        .fold(0.0, |acc: f64, x| acc.max(x.abs()));
    let eri_t: ArrayView4<f64> = eri.permuted_axes([1, 0, 3, 2]);
    let eri_error: f64 = (&eri - &eri_t)
        .iter()
        .fold(0.0, |acc: f64, x| acc.max(x.abs()));
    h1e_error.max(eri_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::model_integrals;
    use approx::assert_abs_diff_eq;

    #[test]
    fn matrix_and_tensor_layout_agree() {
        let integrals: Integrals = model_integrals(3);
        let matrix: Array2<f64> = Array2::from_shape_fn((9, 9), |(ij, kl)| {
            integrals.eri[[ij / 3, ij % 3, kl / 3, kl % 3]]
        });
        let other = Integrals::from_matrix(integrals.h1e.clone(), matrix.view(), 0.0).unwrap();
        assert_eq!(other.eri, integrals.eri);
        assert!(integrals.hermiticity_error() < 1e-14);
    }

    #[test]
    fn hermiticity_error_of_perturbed_integrals() {
        let mut integrals: Integrals = model_integrals(3);
        integrals.h1e[[0, 2]] += 0.1;
        assert_abs_diff_eq!(integrals.hermiticity_error(), 0.1, epsilon = 1e-14);
        integrals.h1e[[2, 0]] += 0.1;
        integrals.eri[[0, 1, 1, 2]] -= 0.25;
        assert_abs_diff_eq!(
            hermiticity_error(integrals.h1e.view(), integrals.eri.view()),
            0.25,
            epsilon = 1e-14
        );
    }

    #[test]
    fn mismatching_shapes_are_rejected() {
        let h1e: Array2<f64> = Array2::zeros((3, 3));
        let eri: Array4<f64> = Array4::zeros((2, 2, 2, 2));
        assert!(matches!(
            Integrals::new(h1e, eri, 0.0),
            Err(FciError::ShapeMismatch(_))
        ));
        let h1e: Array2<f64> = Array2::zeros((2, 3));
        let eri: Array2<f64> = Array2::zeros((4, 4));
        assert!(matches!(
            Integrals::from_matrix(h1e, eri.view(), 0.0),
            Err(FciError::ShapeMismatch(_))
        ));
    }
}
