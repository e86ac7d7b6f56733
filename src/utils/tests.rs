use crate::fci::Integrals;
use ndarray::prelude::*;

/// Model Hamiltonian of `norb` orbitals. The two-electron integrals are built as
/// sum_L B_L[i,j] B_L[k,l] with symmetric B_L, so they have the full permutational symmetry
/// of real orbitals and are positive semi-definite like Coulomb integrals.
pub fn model_integrals(norb: usize) -> Integrals {
    let h1e: Array2<f64> = Array2::from_shape_fn((norb, norb), |(i, j)| {
        if i == j {
            -1.0 + 0.35 * i as f64
        } else {
            -0.1 / (1.0 + (i as f64 - j as f64).abs()) + 0.01 * (i + j) as f64
        }
    });
    let factors: Vec<Array2<f64>> = (0..norb)
        .map(|l| {
            Array2::from_shape_fn((norb, norb), |(i, j)| {
                let di: f64 = i as f64 - l as f64;
                let dj: f64 = j as f64 - l as f64;
                0.4 / (1.0 + di * di + dj * dj) + 0.02 * ((i * j + l) % 3) as f64
            })
        })
        .collect();
    let eri: Array4<f64> = Array4::from_shape_fn((norb, norb, norb, norb), |(i, j, k, l)| {
        factors.iter().map(|b| b[[i, j]] * b[[k, l]]).sum()
    });
    Integrals::new(h1e, eri, 0.0).unwrap()
}

/// Symmetric dipole matrices of the three Cartesian components.
pub fn model_dipoles(norb: usize) -> Array3<f64> {
    Array3::from_shape_fn((3, norb, norb), |(x, i, j)| {
        if i == j {
            0.1 * (x + 1) as f64 * i as f64
        } else {
            0.3 / (1.0 + (i as f64 - j as f64).abs() + x as f64)
        }
    })
}

/// Deterministic vector with entries in [-1, 1].
pub fn random_vector(dim: usize, seed: usize) -> Array1<f64> {
    Array1::from_shape_fn(dim, |i| {
        ((i + 1) as f64 * (seed as f64 + 0.5) * 12.9898).sin()
    })
}
