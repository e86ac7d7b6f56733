use crate::defaults::{DIAG_FLOOR, PRECOND_CAP};
use ndarray::prelude::*;

/// Reciprocal of `x`, limited in magnitude to `PRECOND_CAP`. The sign is kept; non-finite
/// values are mapped to the cap.
fn clamped_inverse(x: f64) -> f64 {
    let inverse: f64 = 1.0 / x;
    if !inverse.is_finite() {
        if x.is_sign_negative() {
            -PRECOND_CAP
        } else {
            PRECOND_CAP
        }
    } else if inverse.abs() > PRECOND_CAP {
        PRECOND_CAP.copysign(inverse)
    } else {
        inverse
    }
}

/// Preconditioners for the corrections of the Davidson solver.
#[derive(Debug, Clone)]
pub enum Preconditioner {
    /// Olsen's correction of the residual. The energy shift e1 uses the exact inverse on the
    /// pspace block and the diagonal approximation elsewhere, the corrected residual is
    /// scaled by the diagonal inverse only.
    Pspace {
        hdiag: Array1<f64>,
        addr: Vec<usize>,
        eigenvalues: Array1<f64>,
        eigenvectors: Array2<f64>,
        level_shift: f64,
    },
    /// r / (hdiag - (e - level_shift))
    Diagonal { hdiag: Array1<f64>, level_shift: f64 },
}

impl Preconditioner {
    pub fn apply(&self, r: ArrayView1<f64>, e: f64, x0: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Preconditioner::Diagonal { hdiag, level_shift } => {
                let shift: f64 = e - level_shift;
                let denominator: Array1<f64> = hdiag.mapv(|h| {
                    let d: f64 = h - shift;
                    if d.abs() < DIAG_FLOOR {
                        DIAG_FLOOR
                    } else {
                        d
                    }
                });
                &r / &denominator
            }
            Preconditioner::Pspace {
                hdiag,
                addr,
                eigenvalues,
                eigenvectors,
                level_shift,
            } => {
                let shift: f64 = e - level_shift;
                let hdiaginv: Array1<f64> = hdiag.mapv(|h| clamped_inverse(h - shift));
                // (h0 - shift)^-1 in the pspace
                let scaled: Array2<f64> =
                    eigenvectors * &eigenvalues.mapv(|w| clamped_inverse(w - shift));
                let h0e0inv: Array2<f64> = scaled.dot(&eigenvectors.t());

                let apply_inverse = |v: ArrayView1<f64>| -> Array1<f64> {
                    let mut result: Array1<f64> = &v * &hdiaginv;
                    let block: Array1<f64> = addr.iter().map(|k| v[*k]).collect();
                    let block: Array1<f64> = h0e0inv.dot(&block);
                    for (k, value) in addr.iter().zip(block.iter()) {
                        result[*k] = *value;
                    }
                    result
                };
                let h0x0: Array1<f64> = apply_inverse(x0);
                let h0r: Array1<f64> = apply_inverse(r);
                let denominator: f64 = x0.dot(&h0x0);
                let e1: f64 = if denominator == 0.0 || !denominator.is_finite() {
                    0.0
                } else {
                    x0.dot(&h0r) / denominator
                };
                (&r - &(e1 * &x0)) * &hdiaginv
            }
        }
    }
}
