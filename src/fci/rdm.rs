/*!

# Reduced density matrices

One- and two-particle density matrices of CI vectors in the orbital basis. The one-particle
matrices follow the convention

dm1[p,q] = <bra| q^+ p |ket>

so that the expectation value of a one-electron operator is `sum_pq h[p,q] dm1[q,p]`. The
spin-traced two-particle matrix is

dm2[p,q,r,s] = <p^+ r^+ s q> = <E_pq E_rs> - delta_qr <E_ps>

and the electronic energy is `sum_pq h1e[p,q] dm1[q,p] + 1/2 sum_pqrs (pq|rs) dm2[p,q,r,s]`.

 */

use crate::fci::hamiltonian::single_replacements;
use crate::fci::{CiSpace, FciError};
use ndarray::prelude::*;

fn check_length(civec: ArrayView1<f64>, space: &CiSpace) -> Result<(), FciError> {
    if civec.len() != space.dim() {
        return Err(FciError::ShapeMismatch(format!(
            "CI vector of length {} for {} determinants",
            civec.len(),
            space.dim()
        )));
    }
    Ok(())
}

/// Alpha and beta transition density matrices <bra|q^+ p|ket>.
pub fn trans_rdm1s(
    bra: ArrayView1<f64>,
    ket: ArrayView1<f64>,
    space: &CiSpace,
) -> Result<(Array2<f64>, Array2<f64>), FciError> {
    check_length(bra, space)?;
    check_length(ket, space)?;
    let norb: usize = space.norb;
    let nb: usize = space.nb();
    let mut dm_a: Array2<f64> = Array2::zeros((norb, norb));
    let mut dm_b: Array2<f64> = Array2::zeros((norb, norb));

    // E_{cre,des} |I> = sign |J> contributes to <E_{cre,des}>, that is dm[des, cre]
    for (ia, links) in space.link_a.iter().enumerate() {
        for link in links.iter() {
            let overlap: f64 = (0..nb)
                .map(|ib| bra[link.addr * nb + ib] * ket[ia * nb + ib])
                .sum();
            dm_a[[link.des, link.cre]] += link.sign * overlap;
        }
    }
    for ia in 0..space.na() {
        for (ib, links) in space.link_b.iter().enumerate() {
            let amplitude: f64 = ket[ia * nb + ib];
            if amplitude == 0.0 {
                continue;
            }
            for link in links.iter() {
                dm_b[[link.des, link.cre]] += link.sign * bra[ia * nb + link.addr] * amplitude;
            }
        }
    }
    Ok((dm_a, dm_b))
}

/// Spin-traced transition density matrix.
pub fn trans_rdm1(
    bra: ArrayView1<f64>,
    ket: ArrayView1<f64>,
    space: &CiSpace,
) -> Result<Array2<f64>, FciError> {
    let (dm_a, dm_b) = trans_rdm1s(bra, ket, space)?;
    Ok(dm_a + dm_b)
}

/// Alpha and beta one-particle density matrices of a CI vector.
pub fn make_rdm1s(
    civec: ArrayView1<f64>,
    space: &CiSpace,
) -> Result<(Array2<f64>, Array2<f64>), FciError> {
    trans_rdm1s(civec, civec, space)
}

/// Spin-traced one-particle density matrix of a CI vector.
pub fn make_rdm1(civec: ArrayView1<f64>, space: &CiSpace) -> Result<Array2<f64>, FciError> {
    trans_rdm1(civec, civec, space)
}

/// Spin-traced one- and two-particle density matrices of a CI vector.
pub fn make_rdm12(
    civec: ArrayView1<f64>,
    space: &CiSpace,
) -> Result<(Array2<f64>, Array4<f64>), FciError> {
    check_length(civec, space)?;
    let norb: usize = space.norb;
    // t1[K, pq] = <K|E_pq|c>
    let t1: Array2<f64> = single_replacements(civec, space);
    // <E_qp> for real vectors
    let expectation: Array1<f64> = t1.t().dot(&civec);
    let dm1: Array2<f64> = Array2::from_shape_fn((norb, norb), |(p, q)| expectation[q * norb + p]);
    // products[pq, rs] = <c|E_qp E_rs|c>
    let products: Array2<f64> = t1.t().dot(&t1);
    let dm2: Array4<f64> = Array4::from_shape_fn((norb, norb, norb, norb), |(p, q, r, s)| {
        let value: f64 = products[[q * norb + p, r * norb + s]];
        if q == r {
            value - dm1[[s, p]]
        } else {
            value
        }
    });
    Ok((dm1, dm2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fci::{contract_1e, energy};
    use crate::utils::tests::{model_integrals, random_vector};
    use approx::assert_abs_diff_eq;
    use ndarray_linalg::Norm;

    fn normalized(dim: usize, seed: usize) -> Array1<f64> {
        let v: Array1<f64> = random_vector(dim, seed);
        let norm: f64 = v.norm_l2();
        v / norm
    }

    #[test]
    fn traces_count_the_electrons() {
        let space = CiSpace::new(5, (3, 2)).unwrap();
        let c: Array1<f64> = normalized(space.dim(), 3);
        let (dm_a, dm_b) = make_rdm1s(c.view(), &space).unwrap();
        assert_abs_diff_eq!(dm_a.diag().sum(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dm_b.diag().sum(), 2.0, epsilon = 1e-12);
        let (dm1, dm2) = make_rdm12(c.view(), &space).unwrap();
        assert_abs_diff_eq!(dm1, dm_a + dm_b, epsilon = 1e-12);
        let pairs: f64 = (0..5)
            .flat_map(|p| (0..5).map(move |r| (p, r)))
            .map(|(p, r)| dm2[[p, p, r, r]])
            .sum();
        assert_abs_diff_eq!(pairs, 5.0 * 4.0, epsilon = 1e-10);
    }

    #[test]
    fn density_matrices_reproduce_the_energy() {
        let integrals = model_integrals(4);
        let space = CiSpace::new(4, (2, 1)).unwrap();
        let c: Array1<f64> = normalized(space.dim(), 7);
        let (dm1, dm2) = make_rdm12(c.view(), &space).unwrap();
        let one: f64 = (&integrals.h1e * &dm1.t()).sum();
        let two: f64 = 0.5 * (&integrals.eri * &dm2).sum();
        let reference: f64 = energy(integrals.h1e.view(), integrals.eri.view(), c.view(), &space);
        assert_abs_diff_eq!(one + two, reference, epsilon = 1e-10);
    }

    #[test]
    fn transition_density_matches_one_electron_operator() {
        let integrals = model_integrals(4);
        let space = CiSpace::new(4, (2, 2)).unwrap();
        let bra: Array1<f64> = normalized(space.dim(), 11);
        let ket: Array1<f64> = normalized(space.dim(), 12);
        let dm: Array2<f64> = trans_rdm1(bra.view(), ket.view(), &space).unwrap();
        // <bra|sum_pq h[p,q] E_pq|ket> = sum_pq h[p,q] dm[q,p]
        let reference: f64 = bra.dot(&contract_1e(integrals.h1e.view(), ket.view(), &space));
        assert_abs_diff_eq!((&integrals.h1e * &dm.t()).sum(), reference, epsilon = 1e-12);
        let swapped: Array2<f64> = trans_rdm1(ket.view(), bra.view(), &space).unwrap();
        assert_abs_diff_eq!(swapped, dm.t(), epsilon = 1e-12);
    }

    #[test]
    fn wrong_vector_length() {
        let space = CiSpace::new(3, (1, 1)).unwrap();
        let c: Array1<f64> = Array1::zeros(4);
        assert!(matches!(
            make_rdm1(c.view(), &space),
            Err(FciError::ShapeMismatch(_))
        ));
    }
}
