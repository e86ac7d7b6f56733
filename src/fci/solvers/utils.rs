/*!

## Auxiliar functions of the iterative solvers

 */

use log::info;
use ndarray::prelude::*;
use std::cmp::Ordering;
use std::time::Instant;

/// Generate the initial subspace vectors. These correspond to the `dim` lowest
/// diagonal elements of the matrix that will be diagonalized.
pub fn initial_subspace(diag: ArrayView1<f64>, dim: usize) -> Array2<f64> {
    let order: Vec<usize> = argsort(diag);
    let dim: usize = dim.min(diag.len());
    let mut mtx: Array2<f64> = Array2::zeros([diag.len(), dim]);
    for (idx, i) in order.into_iter().take(dim).enumerate() {
        mtx[[i, idx]] = 1.0;
    }
    mtx
}

/// Indices that sort `v` in ascending order. The sort is stable, equal values keep
/// the order of their indices.
pub fn argsort(v: ArrayView1<f64>) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..v.len()).collect();
    idx.sort_by(|&i, &j| v[i].partial_cmp(&v[j]).unwrap_or(Ordering::Equal));
    idx
}

/// Generate a random highly diagonal symmetric matrix
#[cfg(test)]
pub fn generate_diagonal_dominant(dim: usize, sparsity: f64) -> Array2<f64> {
    use ndarray_linalg::generate::random;
    let diag: Array1<f64> = 10.0 * random([dim]);
    let off_diag: Array2<f64> = random((dim, dim));
    let arr = &off_diag + &off_diag.t();
    let mut arr = &arr * sparsity;
    arr.diag_mut().assign(&diag);
    arr
}

pub fn print_davidson_init(max_iter: usize, nroots: usize, tolerance: f64, residual: f64) {
    info!("{:^80}", "");
    info!("{: ^80}", "Iterative Davidson Routine");
    info!("{:-^80}", "");
    info!(
        "{: <45} {:4.2e}",
        "Energy is converged when its change is below:", tolerance
    );
    info!("{: <45} {:4.2e}", "and the residual is below:", residual);
    info!("{: <45} {}", "Maximum number of iterations:", max_iter);
    if nroots == 1 {
        info!("{: >4} {: <25}", nroots, " Root will be computed.");
    } else {
        info!("{: >4} {: <25}", nroots, " Roots will be computed.");
    }
    info!("{:-^75} ", "");
    info!(
        "{: <5}{: >14}{: >14}{: >14}{: >14}{: >14}",
        "Iter.", "Roots conv.", "Roots left", "#subsp. Vec.", "Max dE", "Max res."
    );
    info!("{:-^75} ", "");
}

pub fn print_davidson_iteration(
    iter: usize,
    roots_cvd: usize,
    roots_lft: usize,
    nvec: usize,
    max_de: f64,
    max_res: f64,
) {
    info!(
        "{: >5}{:>14}{:>14}{:>14}{:>14.4e}{:>14.4e}",
        iter + 1,
        roots_cvd,
        roots_lft,
        nvec,
        max_de,
        max_res
    );
}

pub fn print_davidson_end(converged: bool, time: Instant) {
    info!("{:-^75} ", "");
    if converged {
        info!("Davidson routine converged")
    } else {
        log::warn!("Davidson routine did not converge!")
    }
    info!(
        "{:>68} {:>8.2} s",
        "elapsed time:",
        time.elapsed().as_secs_f32()
    );
    info!("{:-^80}", "");
    info!("{:^80}", "");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_keeps_ties_in_order() {
        let values: Array1<f64> = array![3.0, 1.0, 2.0, 1.0, 0.5];
        assert_eq!(argsort(values.view()), vec![4, 1, 3, 2, 0]);
    }

    #[test]
    fn unit_guess_on_lowest_diagonal() {
        let diag: Array1<f64> = array![3.0, 1.0, 2.0];
        let guess: Array2<f64> = initial_subspace(diag.view(), 2);
        assert_eq!(guess, array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    }
}
