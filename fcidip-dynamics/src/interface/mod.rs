pub use ndarray::prelude::*;
use ndarray::{Data, Zip};
use ndarray_linalg::c64;

/// Trait that provides an interface to a Hamiltonian that is only known by its action on a
/// vector. The propagator never needs the matrix itself, it only asks for products of the
/// operator with real vectors (first Krylov pass) or complex vectors (every later pass).
pub trait CiOperator {
    /// Dimension of the vector space the operator acts on.
    fn dim(&self) -> usize;

    /// Returns the product H|x> for a real vector.
    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64>;

    /// Returns the product H|x> for a complex vector. Since the operator is real, the real and
    /// the imaginary part are propagated separately through [CiOperator::apply].
    fn apply_complex(&self, x: ArrayView1<c64>) -> Array1<c64> {
        let hx_re: Array1<f64> = self.apply(x.mapv(|val| val.re).view());
        let hx_im: Array1<f64> = self.apply(x.mapv(|val| val.im).view());
        Zip::from(&hx_re)
            .and(&hx_im)
            .map_collect(|&re, &im| c64::new(re, im))
    }
}

/// A dense, real symmetric matrix can be used directly as an operator.
impl<S> CiOperator for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self.dot(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn complex_product_splits_real_and_imaginary_part() {
        let h: Array2<f64> = array![[1.0, 0.5, 0.0], [0.5, -2.0, 0.3], [0.0, 0.3, 0.7]];
        let x: Array1<c64> = array![
            c64::new(1.0, -1.0),
            c64::new(0.0, 2.0),
            c64::new(0.5, 0.25)
        ];
        let hx: Array1<c64> = h.apply_complex(x.view());
        let reference: Array1<c64> = h.mapv(c64::from).dot(&x);
        for (a, b) in hx.iter().zip(reference.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-14);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-14);
        }
    }
}
