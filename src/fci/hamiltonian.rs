/*!

# Direct CI Hamiltonian

The Hamiltonian is never stored. Its product with a CI vector is assembled from the
single replacement tables of the alpha and beta strings:

H|c> = sum_{pq,rs} h2e[pq,rs] E_pq E_rs |c>

where the one-electron part is absorbed into the effective two-electron integrals `h2e`
(see [absorb_h1e]). Both contractions are written as gathers over the determinants of
the output vector, so every output row is written by exactly one thread and the result
does not depend on the number of threads.

 */

use crate::fci::{occupied, CiSpace, FciError, Integrals};
use fcidip_dynamics::CiOperator;
use ndarray::parallel::prelude::*;
use ndarray::prelude::*;
use ndarray::Zip;

/// Effective two-electron integrals as `norb^2 x norb^2` matrix:
/// f1e = (h1e - 1/2 sum_i (ji|ik)) / nelec, added to h2e[k,k,:,:] and h2e[:,:,k,k],
/// and everything scaled by `fac`.
pub fn absorb_h1e(
    h1e: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    nelec: usize,
    fac: f64,
) -> Array2<f64> {
    let norb: usize = h1e.nrows();
    let mut f1e: Array2<f64> = h1e.to_owned();
    for j in 0..norb {
        for k in 0..norb {
            let exchange: f64 = (0..norb).map(|i| eri[[j, i, i, k]]).sum();
            f1e[[j, k]] -= 0.5 * exchange;
        }
    }
    f1e /= nelec as f64 + 1e-100;

    let mut h2e: Array4<f64> = eri.to_owned();
    for k in 0..norb {
        {
            let mut block = h2e.slice_mut(s![k, k, .., ..]);
            block += &f1e;
        }
        let mut block = h2e.slice_mut(s![.., .., k, k]);
        block += &f1e;
    }
    h2e *= fac;
    let n2: usize = norb * norb;
    Array2::from_shape_fn((n2, n2), |(ij, kl)| {
        h2e[[ij / norb, ij % norb, kl / norb, kl % norb]]
    })
}

/// Diagonal elements <I|H|I> of all determinants, ordered as the CI vector (alpha major).
pub fn make_hdiag(h1e: ArrayView2<f64>, eri: ArrayView4<f64>, space: &CiSpace) -> Array1<f64> {
    let norb: usize = space.norb;
    let jdiag: Array2<f64> = Array2::from_shape_fn((norb, norb), |(i, j)| eri[[i, i, j, j]]);
    let kdiag: Array2<f64> = Array2::from_shape_fn((norb, norb), |(i, j)| eri[[i, j, j, i]]);
    let occ_a: Vec<Vec<usize>> = space.strings_a.iter().map(|s| occupied(*s)).collect();
    let occ_b: Vec<Vec<usize>> = space.strings_b.iter().map(|s| occupied(*s)).collect();
    let nb: usize = space.nb();

    let mut hdiag: Array1<f64> = Array1::zeros(space.dim());
    Zip::indexed(&mut hdiag).par_for_each(|idx, value| {
        let aocc: &[usize] = &occ_a[idx / nb];
        let bocc: &[usize] = &occ_b[idx % nb];
        let mut e1: f64 = 0.0;
        for i in aocc.iter().chain(bocc.iter()) {
            e1 += h1e[[*i, *i]];
        }
        let mut e2: f64 = 0.0;
        for i in aocc.iter().chain(bocc.iter()) {
            for j in aocc.iter().chain(bocc.iter()) {
                e2 += jdiag[[*i, *j]];
            }
        }
        for occ in [aocc, bocc] {
            for i in occ.iter() {
                for j in occ.iter() {
                    e2 -= kdiag[[*i, *j]];
                }
            }
        }
        *value = e1 + 0.5 * e2;
    });
    hdiag
}

/// sum_pq f1e[p,q] E_pq |c>
pub fn contract_1e(f1e: ArrayView2<f64>, civec: ArrayView1<f64>, space: &CiSpace) -> Array1<f64> {
    let nb: usize = space.nb();
    let mut sigma: Array1<f64> = Array1::zeros(space.dim());
    sigma
        .axis_chunks_iter_mut(Axis(0), nb)
        .into_par_iter()
        .enumerate()
        .for_each(|(ia, mut row)| {
            for link in space.link_a[ia].iter() {
                let factor: f64 = link.sign * f1e[[link.des, link.cre]];
                for ib in 0..nb {
                    row[ib] += factor * civec[link.addr * nb + ib];
                }
            }
            for ib in 0..nb {
                for link in space.link_b[ib].iter() {
                    row[ib] += link.sign * f1e[[link.des, link.cre]] * civec[ia * nb + link.addr];
                }
            }
        });
    sigma
}

/// All single replacements of a CI vector, t1[I, p * norb + q] = <I|E_pq|c>.
pub(crate) fn single_replacements(civec: ArrayView1<f64>, space: &CiSpace) -> Array2<f64> {
    let norb: usize = space.norb;
    let nb: usize = space.nb();
    let mut t1: Array2<f64> = Array2::zeros((space.dim(), norb * norb));
    t1.axis_chunks_iter_mut(Axis(0), nb)
        .into_par_iter()
        .enumerate()
        .for_each(|(ia, mut block)| {
            for link in space.link_a[ia].iter() {
                let pair: usize = link.des * norb + link.cre;
                for ib in 0..nb {
                    block[[ib, pair]] += link.sign * civec[link.addr * nb + ib];
                }
            }
            for ib in 0..nb {
                for link in space.link_b[ib].iter() {
                    block[[ib, link.des * norb + link.cre]] +=
                        link.sign * civec[ia * nb + link.addr];
                }
            }
        });
    t1
}

/// sum_{pq,rs} h2e[pq,rs] E_pq E_rs |c> for absorbed integrals `h2e` (`norb^2 x norb^2`).
pub fn contract_2e(h2e: ArrayView2<f64>, civec: ArrayView1<f64>, space: &CiSpace) -> Array1<f64> {
    let norb: usize = space.norb;
    let nb: usize = space.nb();
    let t1: Array2<f64> = single_replacements(civec, space);
    let g: Array2<f64> = t1.dot(&h2e.t());

    let mut sigma: Array1<f64> = Array1::zeros(space.dim());
    sigma
        .axis_chunks_iter_mut(Axis(0), nb)
        .into_par_iter()
        .enumerate()
        .for_each(|(ia, mut row)| {
            for link in space.link_a[ia].iter() {
                let pair: usize = link.des * norb + link.cre;
                for ib in 0..nb {
                    row[ib] += link.sign * g[[link.addr * nb + ib, pair]];
                }
            }
            for ib in 0..nb {
                for link in space.link_b[ib].iter() {
                    row[ib] += link.sign * g[[ia * nb + link.addr, link.des * norb + link.cre]];
                }
            }
        });
    sigma
}

/// Electronic energy <c|H|c> of a normalized CI vector.
pub fn energy(
    h1e: ArrayView2<f64>,
    eri: ArrayView4<f64>,
    civec: ArrayView1<f64>,
    space: &CiSpace,
) -> f64 {
    let h2e: Array2<f64> = absorb_h1e(h1e, eri, space.n_electrons(), 0.5);
    civec.dot(&contract_2e(h2e.view(), civec, space))
}

/// The CI Hamiltonian of fixed electron numbers, applied to vectors through [contract_2e].
#[derive(Debug, Clone)]
pub struct HamiltonianOperator {
    space: CiSpace,
    h2e: Array2<f64>,
}

impl HamiltonianOperator {
    pub fn new(integrals: &Integrals, nelec: (usize, usize)) -> Result<Self, FciError> {
        let space: CiSpace = CiSpace::new(integrals.norb(), nelec)?;
        Ok(Self::from_space(integrals, space))
    }

    pub fn from_space(integrals: &Integrals, space: CiSpace) -> Self {
        let h2e: Array2<f64> = absorb_h1e(
            integrals.h1e.view(),
            integrals.eri.view(),
            space.n_electrons(),
            0.5,
        );
        Self { space, h2e }
    }

    pub fn space(&self) -> &CiSpace {
        &self.space
    }
}

impl CiOperator for HamiltonianOperator {
    fn dim(&self) -> usize {
        self.space.dim()
    }

    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        contract_2e(self.h2e.view(), x, &self.space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fci::pspace;
    use crate::utils::tests::{model_integrals, random_vector};
    use approx::assert_abs_diff_eq;

    fn full_matrix(integrals: &Integrals, space: &CiSpace) -> Array2<f64> {
        let hdiag = make_hdiag(integrals.h1e.view(), integrals.eri.view(), space);
        let (addr, h0) = pspace(
            integrals.h1e.view(),
            integrals.eri.view(),
            hdiag.view(),
            space,
            space.dim(),
        )
        .unwrap();
        let mut full: Array2<f64> = Array2::zeros((space.dim(), space.dim()));
        for (p, ip) in addr.iter().enumerate() {
            for (q, iq) in addr.iter().enumerate() {
                full[[*ip, *iq]] = h0[[p, q]];
            }
        }
        full
    }

    #[test]
    fn operator_matches_explicit_matrix() {
        let integrals: Integrals = model_integrals(4);
        for nelec in [(2, 2), (3, 1), (2, 0)] {
            let operator = HamiltonianOperator::new(&integrals, nelec).unwrap();
            let full: Array2<f64> = full_matrix(&integrals, operator.space());
            let dim: usize = operator.dim();
            for k in 0..dim {
                let mut unit: Array1<f64> = Array1::zeros(dim);
                unit[k] = 1.0;
                let column: Array1<f64> = operator.apply(unit.view());
                for i in 0..dim {
                    assert_abs_diff_eq!(column[i], full[[i, k]], epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn diagonal_matches_operator() {
        let integrals: Integrals = model_integrals(5);
        let operator = HamiltonianOperator::new(&integrals, (2, 3)).unwrap();
        let hdiag = make_hdiag(integrals.h1e.view(), integrals.eri.view(), operator.space());
        for k in [0, 7, 33, operator.dim() - 1] {
            let mut unit: Array1<f64> = Array1::zeros(operator.dim());
            unit[k] = 1.0;
            assert_abs_diff_eq!(operator.apply(unit.view())[k], hdiag[k], epsilon = 1e-10);
        }
    }

    #[test]
    fn operator_is_symmetric() {
        let integrals: Integrals = model_integrals(5);
        let operator = HamiltonianOperator::new(&integrals, (2, 2)).unwrap();
        let x: Array1<f64> = random_vector(operator.dim(), 1);
        let y: Array1<f64> = random_vector(operator.dim(), 2);
        let xhy: f64 = x.dot(&operator.apply(y.view()));
        let yhx: f64 = y.dot(&operator.apply(x.view()));
        assert_abs_diff_eq!(xhy, yhx, epsilon = 1e-10);
    }

    #[test]
    fn one_electron_contraction() {
        let integrals: Integrals = model_integrals(4);
        let space: CiSpace = CiSpace::new(4, (2, 1)).unwrap();
        let zero: Array4<f64> = Array4::zeros((4, 4, 4, 4));
        let c: Array1<f64> = random_vector(space.dim(), 3);
        let h2e: Array2<f64> = absorb_h1e(integrals.h1e.view(), zero.view(), 3, 0.5);
        let by_2e: Array1<f64> = contract_2e(h2e.view(), c.view(), &space);
        let by_1e: Array1<f64> = contract_1e(integrals.h1e.view(), c.view(), &space);
        for (a, b) in by_2e.iter().zip(by_1e.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn energy_is_expectation_value() {
        let integrals: Integrals = model_integrals(4);
        let space: CiSpace = CiSpace::new(4, (2, 2)).unwrap();
        let c: Array1<f64> = random_vector(space.dim(), 4);
        let c: Array1<f64> = &c / c.dot(&c).sqrt();
        let full: Array2<f64> = full_matrix(&integrals, &space);
        let reference: f64 = c.dot(&full.dot(&c));
        let e: f64 = energy(integrals.h1e.view(), integrals.eri.view(), c.view(), &space);
        assert_abs_diff_eq!(e, reference, epsilon = 1e-10);
    }
}
