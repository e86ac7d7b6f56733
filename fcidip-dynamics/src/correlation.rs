use crate::lanczos::{PropagationError, ReducedHamiltonian};
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Append-only record of the correlation function of one polarization axis.
///
/// For every restart `k` the accumulator stores the start time `t_k`, the sample
/// `C(t_k) = exp(i E0 t_k) <mu0|psi(t_k)>`, the projections `<mu0|v_j>` on the Krylov vectors
/// of that restart and the reduced Hamiltonian. The snapshots are sufficient to evaluate
/// `C(t)` at any time of the interval `[t_k, t_k+1)` without touching the full CI space again.
#[derive(Debug, Clone)]
pub struct CorrelationAccumulator {
    axis: usize,
    e0: f64,
    seed: Array1<f64>,
    times: Vec<f64>,
    samples: Vec<c64>,
    projections: Vec<Array1<c64>>,
    reduced_hamiltonians: Vec<ReducedHamiltonian>,
    final_time: Option<f64>,
}

impl CorrelationAccumulator {
    /// `seed` is the normalized dipole-excited state mu0 and `e0` the reference energy of the
    /// phase factor.
    pub fn new(axis: usize, e0: f64, seed: Array1<f64>) -> Self {
        Self {
            axis,
            e0,
            seed,
            times: Vec::new(),
            samples: Vec::new(),
            projections: Vec::new(),
            reduced_hamiltonians: Vec::new(),
            final_time: None,
        }
    }

    pub fn push(
        &mut self,
        time: f64,
        sample: c64,
        projection: Array1<c64>,
        reduced_hamiltonian: ReducedHamiltonian,
    ) {
        self.times.push(time);
        self.samples.push(sample);
        self.projections.push(projection);
        self.reduced_hamiltonians.push(reduced_hamiltonian);
    }

    /// Store the time that was reached after the last step.
    pub fn finish(&mut self, time: f64) {
        self.final_time = Some(time);
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn reference_energy(&self) -> f64 {
        self.e0
    }

    pub fn seed(&self) -> &Array1<f64> {
        &self.seed
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn samples(&self) -> &[c64] {
        &self.samples
    }

    pub fn projections(&self) -> &[Array1<c64>] {
        &self.projections
    }

    pub fn reduced_hamiltonians(&self) -> &[ReducedHamiltonian] {
        &self.reduced_hamiltonians
    }

    pub fn final_time(&self) -> Option<f64> {
        self.final_time
    }

    pub fn krylov_dims(&self) -> Vec<usize> {
        self.reduced_hamiltonians.iter().map(|ht| ht.dim()).collect()
    }

    /// Time nodes as they are written to disk: the start time of every restart followed by the
    /// time reached after the last step.
    pub fn time_grid(&self) -> Vec<f64> {
        let mut grid: Vec<f64> = self.times.clone();
        if let Some(time) = self.final_time {
            grid.push(time);
        }
        grid
    }

    /// Projections of all restarts, zero padded to the largest Krylov dimension.
    pub fn padded_projections(&self) -> Array2<c64> {
        let m_max: usize = self.krylov_dims().into_iter().max().unwrap_or(0);
        let mut padded: Array2<c64> = Array2::zeros((self.len(), m_max));
        for (mut row, p) in padded.outer_iter_mut().zip(self.projections.iter()) {
            row.slice_mut(s![..p.len()]).assign(p);
        }
        padded
    }

    /// Reduced Hamiltonians of all restarts, zero padded to the largest Krylov dimension.
    pub fn padded_reduced_hamiltonians(&self) -> Array3<c64> {
        let m_max: usize = self.krylov_dims().into_iter().max().unwrap_or(0);
        let mut padded: Array3<c64> = Array3::zeros((self.len(), m_max, m_max));
        for (mut block, ht) in padded
            .outer_iter_mut()
            .zip(self.reduced_hamiltonians.iter())
        {
            let m: usize = ht.dim();
            block.slice_mut(s![..m, ..m]).assign(&ht.to_complex());
        }
        padded
    }

    /// Index of the restart interval that contains `time`.
    fn interval(&self, time: f64) -> Option<usize> {
        let end: f64 = self.final_time?;
        if self.is_empty() || time < self.times[0] || time > end {
            return None;
        }
        // times are non-decreasing, so the last start time below `time` marks the interval
        Some(self.times.partition_point(|t| *t <= time).saturating_sub(1))
    }

    /// Reconstruct C(t) from the stored snapshots:
    /// exp(i E0 t) * p_k . exp(-i Ht_k (t - t_k)) e_0
    pub fn evaluate(&self, time: f64) -> Result<Option<c64>, PropagationError> {
        let k: usize = match self.interval(time) {
            Some(k) => k,
            None => return Ok(None),
        };
        let u: Array2<c64> = self.reduced_hamiltonians[k].propagator(time - self.times[k])?;
        let amplitude: c64 = self.projections[k].dot(&u.column(0));
        Ok(Some(c64::new(0.0, self.e0 * time).exp() * amplitude))
    }

    /// C(t) on the uniform grid mintime, mintime + stepsize, ... below maxtime. Points outside
    /// of the propagated time range are skipped.
    pub fn resample(
        &self,
        mintime: f64,
        maxtime: f64,
        stepsize: f64,
    ) -> Result<(Vec<f64>, Vec<c64>), PropagationError> {
        let mut grid: Vec<f64> = Vec::new();
        let mut values: Vec<c64> = Vec::new();
        if !(stepsize > 0.0) {
            return Ok((grid, values));
        }
        let n_points: usize = ((maxtime - mintime) / stepsize).ceil().max(0.0) as usize;
        for i in 0..n_points {
            let time: f64 = mintime + i as f64 * stepsize;
            if time >= maxtime {
                break;
            }
            if let Some(value) = self.evaluate(time)? {
                grid.push(time);
                values.push(value);
            }
        }
        Ok((grid, values))
    }
}
