use crate::fci::{addrs_to_strings, occupied, str_to_addr, CiSpace, FciError};
use ndarray::prelude::*;
use std::collections::BTreeMap;

/// Parity of the occupied orbitals below `p`.
fn parity_below(p: usize, string: u64) -> f64 {
    if (string & ((1u64 << p) - 1)).count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Expectation value <S^2> and the multiplicity 2S + 1 with <S^2> = S(S + 1).
///
/// <S^2> = <S_- S_+> + S_z (S_z + 1) and <S_- S_+> is the squared norm of
/// S_+ |c> = sum_p a^+_{p,alpha} a_{p,beta} |c>, which lives in the space with one more alpha
/// and one less beta electron.
pub fn spin_square(civec: ArrayView1<f64>, space: &CiSpace) -> Result<(f64, f64), FciError> {
    if civec.len() != space.dim() {
        return Err(FciError::ShapeMismatch(format!(
            "CI vector of length {} for {} determinants",
            civec.len(),
            space.dim()
        )));
    }
    let (na, nb): (usize, usize) = space.nelec;
    let sz: f64 = 0.5 * (na as f64 - nb as f64);

    let mut raised: f64 = 0.0;
    if na < space.norb && nb > 0 {
        let n_beta: usize = space.nb();
        // S_+|c> in the addresses of the (na + 1, nb - 1) space; a BTreeMap keeps the
        // summation order fixed
        let mut target: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (ia, string_a) in space.strings_a.iter().enumerate() {
            for (ib, string_b) in space.strings_b.iter().enumerate() {
                let amplitude: f64 = civec[ia * n_beta + ib];
                if amplitude == 0.0 {
                    continue;
                }
                for p in occupied(string_b & !string_a) {
                    let new_a: u64 = string_a | (1u64 << p);
                    let new_b: u64 = string_b ^ (1u64 << p);
                    let sign: f64 = parity_below(p, *string_a) * parity_below(p, *string_b);
                    *target
                        .entry((str_to_addr(new_a), str_to_addr(new_b)))
                        .or_insert(0.0) += sign * amplitude;
                }
            }
        }
        raised = target.values().map(|x| x * x).sum();
    }

    let ss: f64 = raised + sz * (sz + 1.0);
    let s: f64 = (ss + 0.25).sqrt() - 0.5;
    Ok((ss, 2.0 * s + 1.0))
}

/// A determinant with a large coefficient in a CI vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LargeCi {
    pub coefficient: f64,
    pub string_a: u64,
    pub string_b: u64,
}

impl LargeCi {
    /// Occupied alpha and beta orbitals.
    pub fn occupations(&self) -> (Vec<usize>, Vec<usize>) {
        (occupied(self.string_a), occupied(self.string_b))
    }
}

/// All determinants whose coefficient exceeds `tol` in magnitude, in address order.
pub fn large_ci(
    civec: ArrayView1<f64>,
    space: &CiSpace,
    tol: f64,
) -> Result<Vec<LargeCi>, FciError> {
    if civec.len() != space.dim() {
        return Err(FciError::ShapeMismatch(format!(
            "CI vector of length {} for {} determinants",
            civec.len(),
            space.dim()
        )));
    }
    let nb: usize = space.nb();
    let selected: Vec<(usize, f64)> = civec
        .iter()
        .enumerate()
        .filter(|(_, c)| c.abs() > tol)
        .map(|(k, c)| (k, *c))
        .collect();
    let addr_a: Vec<usize> = selected.iter().map(|(k, _)| k / nb).collect();
    let addr_b: Vec<usize> = selected.iter().map(|(k, _)| k % nb).collect();
    let strings_a: Vec<u64> = addrs_to_strings(space.norb, space.nelec.0, &addr_a)?;
    let strings_b: Vec<u64> = addrs_to_strings(space.norb, space.nelec.1, &addr_b)?;
    Ok(selected
        .iter()
        .zip(strings_a.into_iter().zip(strings_b.into_iter()))
        .map(|((_, coefficient), (string_a, string_b))| LargeCi {
            coefficient: *coefficient,
            string_a,
            string_b,
        })
        .collect())
}
