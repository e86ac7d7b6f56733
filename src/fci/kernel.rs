use crate::defaults::LARGE_CI_TOL;
use crate::fci::logging::{print_dipole_seed, print_ground_state_character, print_kernel_end};
use crate::fci::{
    large_ci, spin_square, DipoleSeed, FciError, FciSolution, HamiltonianOperator, InitialGuess,
    Integrals, LargeCi, SolverPath,
};
use crate::io::Configuration;
use crate::utils::Timer;
use fcidip_dynamics::output::helper::print_propagation_failure;
use fcidip_dynamics::output::AxisSummary;
use fcidip_dynamics::{CiOperator, CorrelationAccumulator, LanczosPropagator, PropagationError};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

/// Propagation result of one Cartesian component of the dipole operator.
#[derive(Debug, Clone)]
pub struct AxisCorrelation {
    pub axis: usize,
    pub permanent_dipole: f64,
    /// <mu0|H|mu0> including `ecore`, if the seed could be normalized.
    pub seed_energy: Option<f64>,
    /// All samples that were recorded, also if the propagation stopped early.
    pub accumulator: CorrelationAccumulator,
    pub error: Option<PropagationError>,
}

impl AxisCorrelation {
    pub fn summary(&self) -> AxisSummary {
        AxisSummary::new(
            &self.accumulator,
            self.permanent_dipole,
            self.seed_energy,
            self.error.as_ref().map(|err| err.to_string()),
        )
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationResult {
    /// Total ground state energy (including `ecore`).
    pub ground_energy: f64,
    /// <S^2> of the ground state.
    pub spin_square: f64,
    pub energies: Array1<f64>,
    pub converged: Vec<bool>,
    pub path: SolverPath,
    pub axes: Vec<AxisCorrelation>,
}

/// Serializable overview of a [CorrelationResult].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResultSummary {
    pub ground_energy: f64,
    pub spin_square: f64,
    pub energies: Vec<f64>,
    pub converged: Vec<bool>,
    pub solver: String,
    pub axes: Vec<AxisSummary>,
}

impl CorrelationResult {
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            ground_energy: self.ground_energy,
            spin_square: self.spin_square,
            energies: self.energies.to_vec(),
            converged: self.converged.clone(),
            solver: format!("{:?}", self.path),
            axes: self.axes.iter().map(|axis| axis.summary()).collect(),
        }
    }
}

/// Ground state of the CI Hamiltonian followed by the real-time propagation of the
/// dipole-excited ground state along every selected axis. The correlation function
/// C(t) = exp(i E0 t) <mu0|exp(-i H t)|mu0> uses the electronic ground state energy E0, so
/// that the constant `ecore` does not enter the phase.
///
/// A failing axis does not stop the calculation, its error is stored in the result.
pub fn kernel_lanczos(
    integrals: &Integrals,
    dipoles: ArrayView3<f64>,
    guess: Option<&InitialGuess>,
    config: &Configuration,
) -> Result<CorrelationResult, FciError> {
    config.validate()?;
    let norb: usize = integrals.norb();
    if dipoles.dim().1 != norb || dipoles.dim().2 != norb {
        return Err(FciError::ShapeMismatch(format!(
            "dipole matrices of shape {:?} do not match {} orbitals",
            dipoles.shape(),
            norb
        )));
    }
    if let Some(axis) = config
        .propagation
        .axes
        .iter()
        .find(|axis| **axis >= dipoles.dim().0)
    {
        return Err(FciError::ShapeMismatch(format!(
            "axis {} requested but only {} dipole matrices are given",
            axis,
            dipoles.dim().0
        )));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.fci.threads)
        .build()
        .map_err(|err| FciError::ThreadPool(err.to_string()))?;

    pool.install(|| -> Result<CorrelationResult, FciError> {
        let timer: Timer = Timer::start();
        let operator: HamiltonianOperator =
            HamiltonianOperator::new(integrals, config.system.nelec)?;
        let solution: FciSolution = config.fci.solver()?.solve(integrals, &operator, guess)?;
        let propagator: LanczosPropagator = config.propagation.propagator()?;
        let e0: f64 = solution.electronic_energies[0];
        let (ss, multiplicity) = spin_square(solution.ground_state(), operator.space())?;
        let dominant: Vec<LargeCi> =
            large_ci(solution.ground_state(), operator.space(), LARGE_CI_TOL)?;
        print_ground_state_character(ss, multiplicity, &dominant);

        let axes: Vec<AxisCorrelation> = config
            .propagation
            .axes
            .iter()
            .map(|axis| {
                propagate_axis(
                    *axis,
                    dipoles.index_axis(Axis(0), *axis),
                    &solution,
                    &operator,
                    &propagator,
                    e0,
                    integrals.ecore,
                )
            })
            .collect();

        let n_failed: usize = axes.iter().filter(|axis| axis.error.is_some()).count();
        let ground_energy: f64 = solution.energies[0];
        print_kernel_end(&timer, ground_energy, axes.len(), n_failed);
        Ok(CorrelationResult {
            ground_energy,
            spin_square: ss,
            energies: solution.energies,
            converged: solution.converged,
            path: solution.path,
            axes,
        })
    })
}

fn propagate_axis(
    axis: usize,
    dipole: ArrayView2<f64>,
    solution: &FciSolution,
    operator: &HamiltonianOperator,
    propagator: &LanczosPropagator,
    e0: f64,
    ecore: f64,
) -> AxisCorrelation {
    let seed: DipoleSeed = DipoleSeed::new(axis, dipole, solution.ground_state(), operator.space());
    let mu0: Array1<f64> = match seed.normalized() {
        Ok(mu0) => mu0,
        Err(err) => {
            print_propagation_failure(axis, &err.to_string());
            return AxisCorrelation {
                axis,
                permanent_dipole: seed.permanent_dipole,
                seed_energy: None,
                accumulator: CorrelationAccumulator::new(axis, e0, Array1::zeros(operator.dim())),
                error: Some(err),
            };
        }
    };
    let seed_energy: f64 = mu0.dot(&operator.apply(mu0.view())) + ecore;
    print_dipole_seed(axis, seed.norm, seed.permanent_dipole, seed_energy);

    let mut accumulator: CorrelationAccumulator = CorrelationAccumulator::new(axis, e0, mu0.clone());
    let error: Option<PropagationError> =
        match propagator.propagate(operator, mu0.view(), &mut accumulator) {
            Ok(()) => None,
            Err(err) => {
                print_propagation_failure(axis, &err.to_string());
                Some(err)
            }
        };
    AxisCorrelation {
        axis,
        permanent_dipole: seed.permanent_dipole,
        seed_energy: Some(seed_energy),
        accumulator,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{model_dipoles, model_integrals};
    use approx::assert_abs_diff_eq;
    use ndarray_linalg::c64;

    fn config(maxtime: f64) -> Configuration {
        let mut config = Configuration::default();
        config.system.nelec = (2, 1);
        config.propagation.maxtime = maxtime;
        config.propagation.max_krylov = 6;
        config.fci.threads = 2;
        config
    }

    #[test]
    fn correlation_functions_of_all_axes() {
        let integrals = model_integrals(4);
        let dipoles = model_dipoles(4);
        let result = kernel_lanczos(&integrals, dipoles.view(), None, &config(2.0)).unwrap();
        assert_eq!(result.axes.len(), 3);
        for axis in result.axes.iter() {
            assert!(axis.error.is_none());
            let acc = &axis.accumulator;
            assert_abs_diff_eq!(acc.samples()[0].re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(acc.samples()[0].im, 0.0, epsilon = 1e-12);
            assert!(acc.final_time().unwrap() >= 2.0);
            for value in acc.samples().iter() {
                assert!(value.norm() <= 1.0 + 1e-8);
            }
        }
        // doublet or quartet in the (2, 1) space
        let two_s: f64 = 2.0 * ((result.spin_square + 0.25).sqrt() - 0.5);
        assert_abs_diff_eq!(two_s, two_s.round(), epsilon = 1e-6);
        assert_eq!(two_s.round() as usize % 2, 1);
        let summary = result.summary();
        assert_eq!(summary.spin_square, result.spin_square);
        assert_eq!(summary.axes.len(), 3);
        assert_eq!(summary.solver, "Direct");
    }

    #[test]
    fn runs_are_deterministic() {
        let integrals = model_integrals(4);
        let dipoles = model_dipoles(4);
        let mut settings = config(1.0);
        settings.fci.davidson_only = true;
        let first = kernel_lanczos(&integrals, dipoles.view(), None, &settings).unwrap();
        let second = kernel_lanczos(&integrals, dipoles.view(), None, &settings).unwrap();
        assert_eq!(first.ground_energy, second.ground_energy);
        for (a, b) in first.axes.iter().zip(second.axes.iter()) {
            assert_eq!(a.accumulator.times(), b.accumulator.times());
            let samples_a: &[c64] = a.accumulator.samples();
            assert_eq!(samples_a, b.accumulator.samples());
        }
    }

    #[test]
    fn selected_axes_only() {
        let integrals = model_integrals(3);
        let dipoles = model_dipoles(3);
        let mut settings = config(0.5);
        settings.propagation.axes = vec![2];
        let result = kernel_lanczos(&integrals, dipoles.view(), None, &settings).unwrap();
        assert_eq!(result.axes.len(), 1);
        assert_eq!(result.axes[0].axis, 2);

        settings.propagation.axes = Vec::new();
        assert_eq!(
            kernel_lanczos(&integrals, dipoles.view(), None, &settings).unwrap_err(),
            FciError::NoDipoleAxes
        );
    }

    #[test]
    fn failing_axis_is_recorded() {
        // one determinant: mu|0> is parallel to |0> and the Krylov space cannot grow
        let integrals = model_integrals(2);
        let dipoles = model_dipoles(2);
        let mut settings = config(1.0);
        settings.system.nelec = (2, 2);
        let result = kernel_lanczos(&integrals, dipoles.view(), None, &settings).unwrap();
        assert_eq!(result.axes.len(), 3);
        for axis in result.axes.iter() {
            assert!(matches!(
                axis.error,
                Some(PropagationError::KrylovCollapse { .. })
            ));
            assert!(axis.summary().error.is_some());
            // the t = 0 sample survives the failure
            assert_eq!(axis.accumulator.len(), 1);
            assert_abs_diff_eq!(axis.accumulator.samples()[0].re, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn wrong_dipole_shape() {
        let integrals = model_integrals(3);
        let dipoles: Array3<f64> = Array3::zeros((3, 2, 2));
        assert!(matches!(
            kernel_lanczos(&integrals, dipoles.view(), None, &config(1.0)),
            Err(FciError::ShapeMismatch(_))
        ));
    }
}
