/*!

# Davidson Diagonalization

The Davidson method is suitable for diagonal-dominant symmetric matrices,
like the CI Hamiltonian in the basis of Slater determinants. The lowest
`n_roots` eigenpairs are computed simultaneously in a subspace of variable
size. The products of the matrix with the subspace vectors are kept, so that
only the products of the new directions have to be computed in every
iteration. Every root beyond the first may add four more vectors to the
subspace. When the subspace would grow beyond this limit it is collapsed onto
the current Ritz vectors and, as far as there is room, onto the Ritz vectors
of the previous iteration. Keeping the previous vectors prevents the last
roots from stagnating after a collapse.

*/

use crate::fci::solvers::utils;
use crate::fci::solvers::DavidsonEngine;
use crate::fci::FciError;
use ndarray::prelude::*;
use ndarray_linalg::*;
use ndarray_stats::QuantileExt;
use std::time::Instant;

/// Result of the Davidson routine
#[derive(Debug, Clone)]
pub struct Davidson {
    pub eigenvalues: Array1<f64>,
    pub eigenvectors: Array2<f64>,
    /// Convergence flag of every root. The routine never fails because of
    /// missing convergence, the caller decides what to do with these roots.
    pub converged: Vec<bool>,
    pub iterations: usize,
}

impl Davidson {
    /// Compute the lowest eigenvalues of a symmetric, diagonal dominant matrix.
    /// * `engine` an object that implements the `DavidsonEngine` trait.
    /// * `guess` the initial guess for the eigenvectors (as columns).
    /// * `n_roots` the number of (lowest) eigenvalues/eigenvectors to compute.
    /// * `tolerance` convergence threshold for the change of the eigenvalues.
    /// * `tolerance_residual` convergence threshold for the norm of the residual vectors.
    /// * `lindep` new directions with a squared norm below this value are discarded.
    /// * `max_cycle` the maximal number of iterations.
    /// * `max_space` the size of the subspace for a single root before it is collapsed,
    ///   `4 * (n_roots - 1)` vectors are added for the other roots.
    pub fn new<D: DavidsonEngine>(
        engine: &mut D,
        guess: Array2<f64>,
        n_roots: usize,
        tolerance: f64,
        tolerance_residual: f64,
        lindep: f64,
        max_cycle: usize,
        max_space: usize,
    ) -> Result<Self, FciError> {
        // Timer to measure the time within the Davidson routine.
        let timer: Instant = Instant::now();

        // Dimension of the original matrix problem.
        let dim: usize = engine.get_size();
        if guess.nrows() != dim {
            return Err(FciError::ShapeMismatch(format!(
                "guess vectors of length {} for a problem of size {}",
                guess.nrows(),
                dim
            )));
        }

        // The guess vectors are orthonormalized.
        let empty: Array2<f64> = Array2::zeros((dim, 0));
        let mut basis: Array2<f64> = orthonormalize(empty.view(), guess.view(), lindep)?;
        if basis.ncols() < n_roots {
            return Err(FciError::Linalg(format!(
                "initial guess spans {} directions but {} roots are requested",
                basis.ncols(),
                n_roots
            )));
        }
        let mut products: Array2<f64> = engine.compute_products(basis.view());
        let max_space: usize = max_space.max(n_roots) + 4 * n_roots.saturating_sub(1);
        // Ritz vectors of the last iteration in the coefficients of the current basis.
        let mut previous_ritz: Option<Array2<f64>> = None;

        utils::print_davidson_init(max_cycle, n_roots, tolerance, tolerance_residual);

        let mut eigenvalues: Array1<f64> = Array1::zeros(n_roots);
        let mut eigenvectors: Array2<f64> = Array2::zeros((dim, n_roots));
        let mut previous: Array1<f64> = Array1::from_elem(n_roots, f64::INFINITY);
        let mut converged: Vec<bool> = vec![false; n_roots];
        let mut iterations: usize = 0;

        for i in 0..max_cycle {
            iterations = i + 1;
            // 1. The subspace Hamiltonian.
            let a_proj: Array2<f64> = basis.t().dot(&products);
            let a_proj: Array2<f64> = 0.5 * (&a_proj + &a_proj.t());

            // 2. Solve the eigenvalue problem for the subspace Hamiltonian.
            // The eigenvalues (u) and eigenvectors (v) are sorted in ascending order.
            let (u, v): (Array1<f64>, Array2<f64>) = a_proj
                .eigh(UPLO::Lower)
                .map_err(|err| FciError::Linalg(err.to_string()))?;
            let u: Array1<f64> = u.slice_move(s![0..n_roots]);
            let v: Array2<f64> = v.slice_move(s![.., 0..n_roots]);

            // 3. Ritz vectors and residues.
            let ritz: Array2<f64> = basis.dot(&v);
            let ritz_products: Array2<f64> = products.dot(&v);
            let residues: Array2<f64> = &ritz_products - &(&ritz * &u);
            let errors: Array1<f64> = residues
                .axis_iter(Axis(1))
                .map(|col| col.norm_l2())
                .collect();
            let delta: Array1<f64> = (&u - &previous).mapv(f64::abs);

            for (k, flag) in converged.iter_mut().enumerate() {
                *flag = delta[k] < tolerance && errors[k] < tolerance_residual;
            }
            let roots_cvd: usize = converged.iter().filter(|c| **c).count();
            utils::print_davidson_iteration(
                i,
                roots_cvd,
                n_roots - roots_cvd,
                basis.ncols(),
                *delta.max_skipnan(),
                *errors.max_skipnan(),
            );

            eigenvalues = u.clone();
            eigenvectors = ritz.clone();
            previous = u;

            if roots_cvd == n_roots {
                break;
            }

            // 4. Preconditioned corrections of the roots that are not converged.
            let mut corrections: Vec<Array1<f64>> = Vec::new();
            for k in (0..n_roots).filter(|k| !converged[*k]) {
                let correction: Array1<f64> =
                    engine.precondition(residues.column(k), eigenvalues[k], ritz.column(k));
                let norm: f64 = correction.norm_l2();
                if norm > 0.0 && norm.is_finite() {
                    corrections.push(correction / norm);
                }
            }
            let corrections: Array2<f64> = columns(dim, &corrections);
            let new_directions: Array2<f64> =
                orthonormalize(basis.view(), corrections.view(), lindep)?;

            // 5. No direction survived the orthogonalization, the subspace is exhausted.
            if new_directions.ncols() == 0 {
                for (k, flag) in converged.iter_mut().enumerate() {
                    *flag = errors[k] < tolerance_residual;
                }
                break;
            }

            // 6. The subspace is collapsed if it would become too large. The new directions
            // are orthogonal to the span of the old basis and therefore also to the collapsed one.
            let n_new: usize = new_directions.ncols();
            let coefficients: Array2<f64> = if basis.ncols() + n_new > max_space {
                let keep: usize = max_space.saturating_sub(n_new).max(n_roots);
                let q: Array2<f64> = collapse(v.view(), previous_ritz.as_ref(), keep, lindep)?;
                basis = basis.dot(&q);
                products = products.dot(&q);
                q.t().dot(&v)
            } else {
                v
            };
            previous_ritz = Some(pad_rows(coefficients, n_new));
            let new_products: Array2<f64> = engine.compute_products(new_directions.view());
            basis = ndarray::concatenate(Axis(1), &[basis.view(), new_directions.view()])
                .map_err(|err| FciError::Linalg(err.to_string()))?;
            products = ndarray::concatenate(Axis(1), &[products.view(), new_products.view()])
                .map_err(|err| FciError::Linalg(err.to_string()))?;
        }

        let all_converged: bool = converged.iter().all(|c| *c);
        utils::print_davidson_end(all_converged, timer);

        Ok(Self {
            eigenvalues,
            eigenvectors,
            converged,
            iterations,
        })
    }
}

/// Orthonormal subspace coefficients of the collapsed basis: the current Ritz vectors `v` come
/// first, the previous Ritz vectors fill up the remaining `keep - v.ncols()` columns.
fn collapse(
    v: ArrayView2<f64>,
    previous: Option<&Array2<f64>>,
    keep: usize,
    lindep: f64,
) -> Result<Array2<f64>, FciError> {
    let empty: Array2<f64> = Array2::zeros((v.nrows(), 0));
    let candidates: Array2<f64> = match previous {
        Some(previous) if previous.nrows() == v.nrows() => {
            ndarray::concatenate(Axis(1), &[v.view(), previous.view()])
                .map_err(|err| FciError::Linalg(err.to_string()))?
        }
        _ => v.to_owned(),
    };
    let q: Array2<f64> = orthonormalize(empty.view(), candidates.view(), lindep)?;
    let keep: usize = keep.min(q.ncols());
    Ok(q.slice_move(s![.., ..keep]))
}

/// Append `n` rows of zeros, the coefficients of vectors that are added to the basis.
fn pad_rows(coefficients: Array2<f64>, n: usize) -> Array2<f64> {
    let (rows, cols) = coefficients.dim();
    let mut padded: Array2<f64> = Array2::zeros((rows + n, cols));
    padded.slice_mut(s![..rows, ..]).assign(&coefficients);
    padded
}

/// Stack a list of vectors as the columns of a matrix.
fn columns(dim: usize, vectors: &[Array1<f64>]) -> Array2<f64> {
    Array2::from_shape_fn((dim, vectors.len()), |(i, j)| vectors[j][i])
}

/// Gram-Schmidt orthonormalization (two sweeps) of the columns of `candidates` against
/// the orthonormal columns of `basis` and against each other. Candidates whose squared norm
/// falls below `lindep` are dropped.
pub fn orthonormalize(
    basis: ArrayView2<f64>,
    candidates: ArrayView2<f64>,
    lindep: f64,
) -> Result<Array2<f64>, FciError> {
    let dim: usize = basis.nrows();
    if candidates.nrows() != dim {
        return Err(FciError::ShapeMismatch(format!(
            "vectors of length {} cannot be orthogonalized against a basis of length {}",
            candidates.nrows(),
            dim
        )));
    }
    let mut accepted: Vec<Array1<f64>> = Vec::new();
    for candidate in candidates.axis_iter(Axis(1)) {
        let mut vec: Array1<f64> = candidate.to_owned();
        for _ in 0..2 {
            vec = &vec - &basis.dot(&basis.t().dot(&vec));
            for other in accepted.iter() {
                let overlap: f64 = other.dot(&vec);
                vec.scaled_add(-overlap, other);
            }
        }
        let norm_sq: f64 = vec.dot(&vec);
        if norm_sq > lindep && norm_sq.is_finite() {
            accepted.push(vec / norm_sq.sqrt());
        }
    }
    Ok(columns(dim, &accepted))
}
