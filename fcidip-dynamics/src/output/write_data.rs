use crate::correlation::CorrelationAccumulator;
use anyhow::{Context, Result};
use itertools::Itertools;
use ndarray_linalg::c64;
use ndarray_npy::write_npy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Short description of the propagation of one axis, written to the result summary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AxisSummary {
    pub axis: usize,
    pub samples: usize,
    pub final_time: Option<f64>,
    pub krylov_dims: Vec<usize>,
    pub permanent_dipole: f64,
    pub seed_energy: Option<f64>,
    pub error: Option<String>,
}

impl AxisSummary {
    pub fn new(
        accumulator: &CorrelationAccumulator,
        permanent_dipole: f64,
        seed_energy: Option<f64>,
        error: Option<String>,
    ) -> Self {
        Self {
            axis: accumulator.axis(),
            samples: accumulator.len(),
            final_time: accumulator.final_time(),
            krylov_dims: accumulator.krylov_dims(),
            permanent_dipole,
            seed_energy,
            error,
        }
    }
}

fn write_lines(path: &Path, lines: String) -> Result<()> {
    fs::write(path, lines + "\n")
        .with_context(|| format!("Unable to write to {} file", path.display()))
}

/// Write the snapshots of one axis to `directory`:
/// - `dip_{axis}.npy`: projections of mu0 on the Krylov vectors of every restart
/// - `Ht_{axis}.npy`: reduced Hamiltonians of every restart
/// - `lan_nodes_{axis}.txt`: time nodes (restart times and the final time)
/// - `krylov_dims_{axis}.txt`: Krylov dimension of every restart, needed to undo the padding
/// - `corr_{axis}.txt`: time, Re C(t), Im C(t) at the restart times
pub fn write_axis_data(directory: &Path, accumulator: &CorrelationAccumulator) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Unable to create directory {}", directory.display()))?;
    let axis: usize = accumulator.axis();

    let dip_path = directory.join(format!("dip_{}.npy", axis));
    write_npy(&dip_path, &accumulator.padded_projections())
        .with_context(|| format!("Unable to write {}", dip_path.display()))?;

    let ht_path = directory.join(format!("Ht_{}.npy", axis));
    write_npy(&ht_path, &accumulator.padded_reduced_hamiltonians())
        .with_context(|| format!("Unable to write {}", ht_path.display()))?;

    let nodes: String = accumulator
        .time_grid()
        .iter()
        .map(|t| format!("{:.18e}", t))
        .join("\n");
    write_lines(&directory.join(format!("lan_nodes_{}.txt", axis)), nodes)?;

    let dims: String = accumulator.krylov_dims().iter().join("\n");
    write_lines(&directory.join(format!("krylov_dims_{}.txt", axis)), dims)?;

    write_correlation(
        &directory.join(format!("corr_{}.txt", axis)),
        accumulator.times(),
        accumulator.samples(),
    )
}

/// Three column text file: time, real and imaginary part of the correlation function.
pub fn write_correlation(path: &Path, times: &[f64], values: &[c64]) -> Result<()> {
    let mut string: String = String::from("# time Re(C) Im(C)");
    for (time, value) in times.iter().zip(values.iter()) {
        string.push_str(&format!(
            "\n{:.18e} {:.18e} {:.18e}",
            time, value.re, value.im
        ));
    }
    write_lines(path, string)
}

/// Write any serializable summary as pretty printed json.
pub fn write_summary<T: Serialize>(path: &Path, summary: &T) -> Result<()> {
    let json: String =
        serde_json::to_string_pretty(summary).context("Unable to serialize the summary")?;
    fs::write(path, json).with_context(|| format!("Unable to write {}", path.display()))
}
