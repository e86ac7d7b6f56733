use crate::fci::solvers::argsort;
use crate::fci::{cre_des_sign, hermiticity_error, occupied, CiSpace, FciError};
use crate::defaults::HERMITIAN_THRESHOLD;
use ndarray::prelude::*;

/// Orbitals that are occupied in `ket` but not in `bra` (annihilated) and the orbitals
/// occupied in `bra` but not in `ket` (created).
fn replacements(bra: u64, ket: u64) -> (Vec<usize>, Vec<usize>) {
    (occupied(ket & !bra), occupied(bra & !ket))
}

/// <bra|H|ket> of two different determinants from the Slater-Condon rules.
fn off_diagonal(
    h1e: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    bra: (u64, u64),
    ket: (u64, u64),
) -> f64 {
    let (des_a, cre_a) = replacements(bra.0, ket.0);
    let (des_b, cre_b) = replacements(bra.1, ket.1);
    match (des_a.len(), des_b.len()) {
        (1, 0) => single(h1e, eri, des_a[0], cre_a[0], ket.0, ket.1),
        (0, 1) => single(h1e, eri, des_b[0], cre_b[0], ket.1, ket.0),
        (2, 0) => same_spin_double(eri, &des_a, &cre_a, ket.0),
        (0, 2) => same_spin_double(eri, &des_b, &cre_b, ket.1),
        (1, 1) => {
            let (i, a) = (des_a[0], cre_a[0]);
            let (j, b) = (des_b[0], cre_b[0]);
            cre_des_sign(a, i, ket.0) * cre_des_sign(b, j, ket.1) * eri[[a, i, b, j]]
        }
        _ => 0.0,
    }
}

/// Single replacement i -> a in the string `ket` with the other spin string `other`.
fn single(
    h1e: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    i: usize,
    a: usize,
    ket: u64,
    other: u64,
) -> f64 {
    let mut value: f64 = h1e[[a, i]];
    for j in occupied(ket) {
        value += eri[[a, i, j, j]] - eri[[a, j, j, i]];
    }
    for j in occupied(other) {
        value += eri[[a, i, j, j]];
    }
    cre_des_sign(a, i, ket) * value
}

/// Double replacement (i, j) -> (a, b) within one spin string.
fn same_spin_double(eri: ArrayView4<f64>, des: &[usize], cre: &[usize], ket: u64) -> f64 {
    let (i, j) = (des[0], des[1]);
    let (a, b) = (cre[0], cre[1]);
    let s1: f64 = cre_des_sign(a, i, ket);
    let intermediate: u64 = (ket ^ (1u64 << i)) | (1u64 << a);
    let s2: f64 = cre_des_sign(b, j, intermediate);
    s1 * s2 * (eri[[a, i, b, j]] - eri[[a, j, b, i]])
}

/// Determinant addresses of the `np` lowest diagonal elements. Equal diagonal elements are
/// ordered by their address.
pub fn pspace_addresses(hdiag: ArrayView1<f64>, np: usize) -> Vec<usize> {
    if hdiag.len() <= np {
        return (0..hdiag.len()).collect();
    }
    argsort(hdiag).into_iter().take(np).collect()
}

/// Explicit Hamiltonian in the space of the `np` determinants with the lowest diagonal
/// elements. Returns the determinant addresses and the matrix.
pub fn pspace(
    h1e: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    hdiag: ArrayView1<f64>,
    space: &CiSpace,
    np: usize,
) -> Result<(Vec<usize>, Array2<f64>), FciError> {
    if hdiag.len() != space.dim() {
        return Err(FciError::ShapeMismatch(format!(
            "diagonal of length {} for {} determinants",
            hdiag.len(),
            space.dim()
        )));
    }
    let nb: usize = space.nb();
    let addr: Vec<usize> = pspace_addresses(hdiag, np);
    let determinants: Vec<(u64, u64)> = addr
        .iter()
        .map(|k| (space.strings_a[k / nb], space.strings_b[k % nb]))
        .collect();
    let n: usize = addr.len();

    let mut h0: Array2<f64> = Array2::zeros((n, n));
    for p in 0..n {
        for q in 0..p {
            h0[[p, q]] = off_diagonal(h1e, eri, determinants[p], determinants[q]);
        }
    }

    if hermiticity_error(h1e, eri) < HERMITIAN_THRESHOLD {
        for p in 0..n {
            for q in 0..p {
                h0[[q, p]] = h0[[p, q]];
            }
        }
    } else {
        // <q|H|p> = <p|H^T|q> for real integrals
        let eri_t: ArrayView4<f64> = eri.permuted_axes([1, 0, 3, 2]);
        for p in 0..n {
            for q in 0..p {
                h0[[q, p]] = off_diagonal(h1e.t(), eri_t, determinants[p], determinants[q]);
            }
        }
    }

    for (p, k) in addr.iter().enumerate() {
        h0[[p, p]] = hdiag[*k];
    }
    Ok((addr, h0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fci::make_hdiag;
    use crate::utils::tests::model_integrals;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lowest_diagonal_elements_are_selected() {
        let hdiag: Array1<f64> = array![0.5, -1.0, 0.5, 2.0, -1.0];
        assert_eq!(pspace_addresses(hdiag.view(), 3), vec![1, 4, 0]);
        assert_eq!(pspace_addresses(hdiag.view(), 10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pspace_hamiltonian_is_symmetric() {
        let integrals = model_integrals(5);
        let space = CiSpace::new(5, (2, 2)).unwrap();
        let hdiag = make_hdiag(integrals.h1e.view(), integrals.eri.view(), &space);
        let (addr, h0) = pspace(
            integrals.h1e.view(),
            integrals.eri.view(),
            hdiag.view(),
            &space,
            30,
        )
        .unwrap();
        assert_eq!(addr.len(), 30);
        assert_eq!(h0.dim(), (30, 30));
        for p in 0..30 {
            assert_abs_diff_eq!(h0[[p, p]], hdiag[addr[p]], epsilon = 1e-14);
            assert!(hdiag[addr[p]] <= hdiag[addr[29]]);
            for q in 0..30 {
                assert_abs_diff_eq!(h0[[p, q]], h0[[q, p]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn non_hermitian_integrals_fill_both_triangles() {
        let mut integrals = model_integrals(3);
        integrals.h1e[[0, 1]] += 0.1;
        let space = CiSpace::new(3, (1, 1)).unwrap();
        let hdiag = make_hdiag(integrals.h1e.view(), integrals.eri.view(), &space);
        let (addr, h0) = pspace(
            integrals.h1e.view(),
            integrals.eri.view(),
            hdiag.view(),
            &space,
            9,
        )
        .unwrap();
        // alpha 0 -> 1 with the beta electron in orbital 0
        let ket: usize = addr.iter().position(|k| *k == 0).unwrap();
        let bra: usize = addr.iter().position(|k| *k == 3).unwrap();
        let asymmetry: f64 = h0[[bra, ket]] - h0[[ket, bra]];
        assert_abs_diff_eq!(asymmetry.abs(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn wrong_diagonal_length() {
        let integrals = model_integrals(3);
        let space = CiSpace::new(3, (1, 1)).unwrap();
        let hdiag: Array1<f64> = Array1::zeros(4);
        assert!(pspace(
            integrals.h1e.view(),
            integrals.eri.view(),
            hdiag.view(),
            &space,
            4
        )
        .is_err());
    }
}
