use ndarray::prelude::*;
use ndarray::Data;
pub use davidson::*;
pub use utils::*;

pub(crate) mod davidson;
pub mod utils;

/// Abstract Trait defining the API required by solver engines.
///
/// Engines implement the product functions for iterative solvers that
/// do not require the target matrix to be stored directly.
pub trait DavidsonEngine {
    /// Compute a Matrix * trial vector products
    /// Expected output:
    ///  The product `A x X_{i}` for each `X_{i}` in `X`, in that order.
    ///   Where `A` is the symmetric matrix to be diagonalized.
    fn compute_products(&mut self, x: ArrayView2<f64>) -> Array2<f64>;

    /// Apply the preconditioner to a residual vector `r_k` of the Ritz pair (`w_k`, `x_k`).
    fn precondition(&self, r_k: ArrayView1<f64>, w_k: f64, x_k: ArrayView1<f64>) -> Array1<f64>;

    /// Return the size of the matrix problem.
    fn get_size(&self) -> usize;
}

impl<S> DavidsonEngine for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn compute_products(&mut self, x: ArrayView2<f64>) -> Array2<f64> {
        self.dot(&x)
    }

    fn precondition(&self, r_k: ArrayView1<f64>, w_k: f64, _x_k: ArrayView1<f64>) -> Array1<f64> {
        let denominator: Array1<f64> = self.diag().mapv(|d| {
            let value: f64 = w_k - d;
            if value.abs() < 1e-8 {
                1e-8
            } else {
                value
            }
        });
        &r_k / &denominator
    }

    fn get_size(&self) -> usize {
        self.nrows()
    }
}
