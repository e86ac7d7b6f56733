use crate::correlation::CorrelationAccumulator;
use crate::defaults::*;
use crate::interface::CiOperator;
use crate::lanczos::{lanczos, propagator_from_eigenpairs, KrylovBasis, PropagationError};
use crate::output::helper::*;
use derive_builder::Builder;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray_linalg::{c64, Norm};
use ndarray_stats::QuantileExt;
use std::time::Instant;

/// Real-time propagation of a state with restarted short Krylov expansions.
///
/// At every restart a Lanczos basis of the current state is built, the tridiagonal reduced
/// Hamiltonian is diagonalized and a time step is chosen so that the truncation error of the
/// short expansion stays below `threshold`. The state is advanced by exactly this step, the
/// correlation sample `exp(i E0 t) <mu0|psi(t)>` is recorded and the propagated (normalized)
/// vector seeds the next Krylov space.
#[derive(Builder, Clone, Debug)]
pub struct LanczosPropagator {
    /// Maximal dimension of the Krylov space.
    #[builder(default = "MAX_KRYLOV")]
    max_krylov: usize,
    /// Linear dependence threshold of the Lanczos recursion.
    #[builder(default = "LINDEP")]
    lindep: f64,
    /// Truncation threshold of the adaptive step size.
    #[builder(default = "TIME_STEP_THRESHOLD")]
    threshold: f64,
    /// Total propagation time.
    maxtime: f64,
    /// Maximal number of Krylov restarts.
    #[builder(default = "MAX_RESTARTS")]
    max_restarts: usize,
    /// Smallest time step that is accepted.
    #[builder(default = "MIN_TIME_STEP")]
    min_time_step: f64,
}

impl LanczosPropagator {
    pub fn maxtime(&self) -> f64 {
        self.maxtime
    }

    pub fn max_krylov(&self) -> usize {
        self.max_krylov
    }

    /// Propagate the normalized `seed` under `operator` until `maxtime` and store the samples
    /// in `accumulator`. The reference energy `E0` of the phase factor is taken from the
    /// accumulator. On error the accumulator keeps all samples recorded so far, the sample of
    /// the failing restart included, and the final time is set to the time of that sample.
    pub fn propagate<O: CiOperator>(
        &self,
        operator: &O,
        seed: ArrayView1<f64>,
        accumulator: &mut CorrelationAccumulator,
    ) -> Result<(), PropagationError> {
        let timer: Instant = Instant::now();
        print_propagation_init(self.maxtime, self.max_krylov, self.threshold);

        let e0: f64 = accumulator.reference_energy();
        let mut state: Array1<c64> = seed.mapv(c64::from);
        let mut time: f64 = 0.0;
        let mut restarts: usize = 0;

        loop {
            // The first Krylov space is spanned by a real seed.
            let first_pass: bool = restarts == 0;
            let krylov: Result<KrylovBasis, PropagationError> = if first_pass {
                lanczos(
                    |x| operator.apply(x.mapv(|val| val.re).view()).mapv(c64::from),
                    state.view(),
                    self.max_krylov,
                    self.lindep,
                )
            } else {
                lanczos(
                    |x| operator.apply_complex(x),
                    state.view(),
                    self.max_krylov,
                    self.lindep,
                )
            };
            let basis: KrylovBasis = match krylov {
                Ok(basis) => basis,
                Err(err) => {
                    if !accumulator.is_empty() {
                        accumulator.finish(time);
                    }
                    return Err(match err {
                        PropagationError::VanishingNorm { norm, .. } => {
                            PropagationError::VanishingNorm { time, norm }
                        }
                        other => other,
                    });
                }
            };

            let m: usize = basis.dim();
            let ht = basis.reduced_hamiltonian(!first_pass);

            // Sampling: the amplitude vector of the restart state is the first unit vector,
            // so <mu0|psi(t)> is the projection on the first Krylov vector. The sample is
            // recorded before any check of the Krylov space, t = 0 is always part of the record.
            let projection: Array1<c64> = basis.project(accumulator.seed().view());
            let mut d: Array1<c64> = Array1::zeros(m);
            d[0] = c64::from(1.0);
            let sample: c64 = c64::new(0.0, e0 * time).exp() * projection.dot(&d);
            accumulator.push(time, sample, projection, ht.clone());

            if m < 2 {
                accumulator.finish(time);
                return Err(PropagationError::KrylovCollapse { time, dim: m });
            }
            let (w, t): (Array1<f64>, Array2<c64>) = match ht.eigh() {
                Ok(pairs) => pairs,
                Err(err) => {
                    accumulator.finish(time);
                    return Err(err);
                }
            };
            debug!(
                "{: <25} {:>18.10}",
                "lowest Ritz value:",
                w.min().copied().unwrap_or(f64::NAN)
            );

            let mut step: f64 = time_step_limit(w.view(), t.view(), self.threshold)?;
            if step.is_infinite() {
                step = self.maxtime - time;
            }
            if step.is_nan() || step < self.min_time_step {
                accumulator.finish(time);
                return Err(PropagationError::StepTooSmall { time, step });
            }
            print_restart(restarts, time, step, m, sample);

            // Propagation inside the Krylov space and reconstruction of the full vector.
            let u: Array2<c64> = propagator_from_eigenpairs(w.view(), t.view(), step);
            let d_next: Array1<c64> = u.dot(&d);
            let psi: Array1<c64> = basis.expand(d_next.view());
            state = match normalize(psi, time + step) {
                Ok(state) => state,
                Err(err) => {
                    accumulator.finish(time);
                    return Err(err);
                }
            };

            time += step;
            restarts += 1;
            if time >= self.maxtime {
                accumulator.finish(time);
                break;
            }
            if restarts >= self.max_restarts {
                accumulator.finish(time);
                return Err(PropagationError::RestartLimit { time, restarts });
            }
        }
        info!("{: <25} {}", "number of restarts:", restarts);
        print_propagation_end(timer);
        Ok(())
    }
}

/// Divide by the norm, refusing vectors whose norm has vanished.
pub fn normalize(psi: Array1<c64>, time: f64) -> Result<Array1<c64>, PropagationError> {
    let norm: f64 = psi.norm_l2();
    if !(norm > NORM_FLOOR) {
        return Err(PropagationError::VanishingNorm { time, norm });
    }
    Ok(psi.mapv(|val| val / norm))
}

/// Largest time step for which the neglected Krylov directions stay below `threshold`:
///
/// t_lim = ((m-1)! / ||w^(m-1) * T[:, m-1]||)^(1/(m-1)) * threshold^(0.5/(m-1))
///
/// The expression is evaluated with logarithms to avoid overflow of the factorial and of the
/// eigenvalue powers. A vanishing norm gives an infinite step.
pub fn time_step_limit(
    w: ArrayView1<f64>,
    t: ArrayView2<c64>,
    threshold: f64,
) -> Result<f64, PropagationError> {
    let m: usize = w.len();
    if m < 2 {
        return Err(PropagationError::KrylovCollapse { time: 0.0, dim: m });
    }
    let order: f64 = (m - 1) as f64;
    let column: ArrayView1<c64> = t.column(m - 1);
    if w.iter().any(|e| !e.is_finite()) || column.iter().any(|c| !c.norm().is_finite()) {
        return Ok(f64::NAN);
    }

    // logarithms of the individual entries |w_k|^(m-1) |T_k,m-1|
    let logs: Vec<f64> = w
        .iter()
        .zip(column.iter())
        .filter(|(e, c)| **e != 0.0 && c.norm() > 0.0)
        .map(|(e, c)| order * e.abs().ln() + c.norm().ln())
        .collect();
    if logs.is_empty() {
        return Ok(f64::INFINITY);
    }
    let max_log: f64 = logs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let log_norm: f64 =
        max_log + 0.5 * logs.iter().map(|l| (2.0 * (l - max_log)).exp()).sum::<f64>().ln();

    let log_factorial: f64 = (1..m).map(|k| (k as f64).ln()).sum();
    let log_step: f64 = (log_factorial - log_norm) / order + 0.5 * threshold.ln() / order;
    Ok(log_step.exp())
}
