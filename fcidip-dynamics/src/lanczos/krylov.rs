use crate::defaults::NORM_FLOOR;
use crate::lanczos::{PropagationError, ReducedHamiltonian};
use ndarray::prelude::*;
use ndarray_linalg::{c64, Norm};

/// Orthonormal Krylov basis of a single restart together with the coefficients of the
/// three-term recurrence.
#[derive(Debug, Clone)]
pub struct KrylovBasis {
    /// Basis vectors stored as rows, shape: [m, dim]
    pub vectors: Array2<c64>,
    /// Diagonal of the tridiagonal matrix, length m
    pub alpha: Vec<f64>,
    /// Off-diagonal of the tridiagonal matrix, length m - 1
    pub beta: Vec<f64>,
}

impl KrylovBasis {
    /// Number of basis vectors.
    pub fn dim(&self) -> usize {
        self.alpha.len()
    }

    pub fn reduced_hamiltonian(&self, complex: bool) -> ReducedHamiltonian {
        ReducedHamiltonian::from_recurrence(&self.alpha, &self.beta, complex)
    }

    /// Overlaps <x|v_k> of a real vector with all basis vectors.
    pub fn project(&self, x: ArrayView1<f64>) -> Array1<c64> {
        self.vectors.dot(&x.mapv(c64::from))
    }

    /// Full space vector sum_k d_k |v_k>.
    pub fn expand(&self, d: ArrayView1<c64>) -> Array1<c64> {
        self.vectors.t().dot(&d)
    }
}

/// <a|b> for complex vectors.
pub fn braket(a: ArrayView1<c64>, b: ArrayView1<c64>) -> c64 {
    a.iter().zip(b.iter()).map(|(x, y)| x.conj() * y).sum()
}

/// Lanczos recursion with full re-orthogonalization. The recursion stops when `max_krylov`
/// vectors (or the full space) are reached or when the squared norm of the next vector falls
/// below `lindep`, the same convention as in the Davidson solver.
pub fn lanczos<F>(
    mut apply: F,
    seed: ArrayView1<c64>,
    max_krylov: usize,
    lindep: f64,
) -> Result<KrylovBasis, PropagationError>
where
    F: FnMut(ArrayView1<c64>) -> Array1<c64>,
{
    let dim: usize = seed.len();
    let m_max: usize = max_krylov.min(dim);

    let norm: f64 = seed.norm_l2();
    if !(norm > NORM_FLOOR) {
        return Err(PropagationError::VanishingNorm { time: 0.0, norm });
    }

    let mut vectors: Vec<Array1<c64>> = vec![seed.mapv(|val| val / norm)];
    let mut alpha: Vec<f64> = Vec::with_capacity(m_max);
    let mut beta: Vec<f64> = Vec::with_capacity(m_max);

    while alpha.len() < m_max {
        let j: usize = vectors.len() - 1;
        let mut w: Array1<c64> = apply(vectors[j].view());
        let a: f64 = braket(vectors[j].view(), w.view()).re;
        alpha.push(a);
        if vectors.len() == m_max {
            break;
        }

        // three-term recurrence
        w.scaled_add(c64::from(-a), &vectors[j]);
        if j > 0 {
            w.scaled_add(c64::from(-beta[j - 1]), &vectors[j - 1]);
        }
        // two Gram-Schmidt sweeps against the whole basis
        for _ in 0..2 {
            for v in vectors.iter() {
                let overlap: c64 = braket(v.view(), w.view());
                w.scaled_add(-overlap, v);
            }
        }

        let b: f64 = w.norm_l2();
        if !(b * b > lindep) {
            break;
        }
        beta.push(b);
        w.mapv_inplace(|val| val / b);
        vectors.push(w);
    }

    let mut basis: Array2<c64> = Array2::zeros((vectors.len(), dim));
    for (mut row, v) in basis.outer_iter_mut().zip(vectors.iter()) {
        row.assign(v);
    }

    Ok(KrylovBasis {
        vectors: basis,
        alpha,
        beta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::CiOperator;
    use approx::assert_abs_diff_eq;

    fn model_matrix(dim: usize) -> Array2<f64> {
        Array2::from_shape_fn((dim, dim), |(i, j)| {
            if i == j {
                -1.0 + 0.5 * i as f64
            } else {
                0.1 / (1.0 + (i as f64 - j as f64).abs())
            }
        })
    }

    fn seed(dim: usize) -> Array1<c64> {
        Array1::from_shape_fn(dim, |i| c64::from(1.0 / (1.0 + i as f64)))
    }

    #[test]
    fn basis_is_orthonormal() {
        let h = model_matrix(20);
        let basis = lanczos(|x| h.apply_complex(x), seed(20).view(), 8, 1e-14).unwrap();
        assert_eq!(basis.dim(), 8);
        assert_eq!(basis.beta.len(), 7);
        let overlap: Array2<c64> = basis
            .vectors
            .mapv(|v| v.conj())
            .dot(&basis.vectors.t());
        for ((i, j), val) in overlap.indexed_iter() {
            let expected: f64 = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(val.re, expected, epsilon = 1e-12);
            assert_abs_diff_eq!(val.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn tridiagonal_matrix_is_projected_operator() {
        let h = model_matrix(15);
        let basis = lanczos(|x| h.apply_complex(x), seed(15).view(), 6, 1e-14).unwrap();
        let hc: Array2<c64> = h.mapv(c64::from);
        let projected: Array2<c64> = basis
            .vectors
            .mapv(|v| v.conj())
            .dot(&hc.dot(&basis.vectors.t()));
        let reduced: Array2<c64> = basis.reduced_hamiltonian(true).to_complex();
        for (a, b) in projected.iter().zip(reduced.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn recursion_stops_at_invariant_subspace() {
        // the seed only couples to a two-dimensional invariant subspace
        let mut h: Array2<f64> = Array2::zeros((6, 6));
        h[[0, 0]] = 1.0;
        h[[1, 1]] = 2.0;
        h[[0, 1]] = 0.5;
        h[[1, 0]] = 0.5;
        for i in 2..6 {
            h[[i, i]] = i as f64;
        }
        let mut x: Array1<c64> = Array1::zeros(6);
        x[0] = c64::from(1.0);
        let basis = lanczos(|v| h.apply_complex(v), x.view(), 6, 1e-12).unwrap();
        assert_eq!(basis.dim(), 2);
    }

    #[test]
    fn weak_coupling_below_the_squared_threshold_stops_the_recursion() {
        let mut h: Array2<f64> = Array2::zeros((4, 4));
        h[[0, 0]] = 1.0;
        h[[1, 1]] = 2.0;
        h[[0, 1]] = 0.5;
        h[[1, 0]] = 0.5;
        // beta = 1e-9, beta^2 = 1e-18
        h[[1, 2]] = 1e-9;
        h[[2, 1]] = 1e-9;
        h[[2, 2]] = 3.0;
        h[[3, 3]] = 4.0;
        let mut x: Array1<c64> = Array1::zeros(4);
        x[0] = c64::from(1.0);
        let basis = lanczos(|v| h.apply_complex(v), x.view(), 4, 1e-14).unwrap();
        assert_eq!(basis.dim(), 2);
        let basis = lanczos(|v| h.apply_complex(v), x.view(), 4, 1e-20).unwrap();
        assert_eq!(basis.dim(), 3);
    }

    #[test]
    fn zero_seed_is_rejected() {
        let h = model_matrix(4);
        let x: Array1<c64> = Array1::zeros(4);
        let result = lanczos(|v| h.apply_complex(v), x.view(), 4, 1e-14);
        assert!(matches!(
            result,
            Err(PropagationError::VanishingNorm { .. })
        ));
    }
}
