use crate::fci::{LargeCi, SolverPath};
use crate::utils::Timer;
use log::{debug, info};
use ndarray::ArrayView1;

pub fn print_fci_init(norb: usize, nelec: (usize, usize), dim: usize, path: SolverPath) {
    info!("{:^80}", "");
    info!("{: ^80}", "Full Configuration Interaction");
    info!("{:-^80}", "");
    info!("{: <25} {}", "orbitals:", norb);
    info!("{: <25} {} alpha, {} beta", "electrons:", nelec.0, nelec.1);
    info!("{: <25} {}", "determinants:", dim);
    match path {
        SolverPath::Direct => info!("{: <25} {}", "solver:", "explicit diagonalization"),
        SolverPath::Iterative => info!("{: <25} {}", "solver:", "Davidson"),
    }
    info!("{:-^80}", "");
}

pub fn print_fci_energies(energies: ArrayView1<f64>, converged: &[bool]) {
    info!("{:^80}", "");
    info!("{: <5} {: >22} {: >12}", "Root", "Energy [Hartree]", "converged");
    info!("{:-^41}", "");
    for (root, (energy, flag)) in energies.iter().zip(converged.iter()).enumerate() {
        info!("{: >5} {:>22.14} {: >12}", root, energy, flag);
    }
    info!("{:-^41}", "");
}

pub fn print_ground_state_character(ss: f64, multiplicity: f64, dominant: &[LargeCi]) {
    info!("{: <25} {:>12.8}", "<S^2>:", ss);
    info!("{: <25} {:>12.8}", "2S+1:", multiplicity);
    debug!("{: <25}", "leading determinants:");
    debug!("{: >12} {: >20} {: >20}", "coefficient", "alpha", "beta");
    for determinant in dominant.iter() {
        let (alpha, beta) = determinant.occupations();
        debug!(
            "{: >12.8} {: >20} {: >20}",
            determinant.coefficient,
            format!("{:?}", alpha),
            format!("{:?}", beta)
        );
    }
}

pub fn print_dipole_seed(axis: usize, norm: f64, permanent_dipole: f64, seed_energy: f64) {
    info!("{:^80}", "");
    info!("{: ^80}", format!("Dipole excitation along axis {}", axis));
    info!("{:-^80}", "");
    debug!("{: <35} {:>18.10e}", "norm of mu|0>:", norm);
    info!("{: <35} {:>18.14}", "permanent dipole <0|mu|0>:", permanent_dipole);
    info!("{: <35} {:>18.14}", "energy <mu0|H|mu0>:", seed_energy);
}

pub fn print_kernel_end(timer: &Timer, ground_energy: f64, n_axes: usize, n_failed: usize) {
    info!("{:-^80}", "");
    info!("{: <35} {:>18.14} Hartree", "ground state energy:", ground_energy);
    info!(
        "{: <35} {} of {}",
        "propagated axes:",
        n_axes - n_failed,
        n_axes
    );
    info!("{}", timer);
    info!("{:-^80}", "");
}
