use crate::defaults::*;
use crate::fci::{FciError, FciSolver, FciSolverBuilder};
use anyhow::{Context, Result};
use fcidip_dynamics::defaults as propagation_defaults;
use fcidip_dynamics::{LanczosPropagator, LanczosPropagatorBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_verbose() -> i8 {
    VERBOSE
}
fn default_nelec() -> (usize, usize) {
    NELEC
}
fn default_ecore() -> f64 {
    ECORE
}
fn default_h1e_file() -> String {
    String::from(H1E_FILE)
}
fn default_eri_file() -> String {
    String::from(ERI_FILE)
}
fn default_dipole_file() -> String {
    String::from(DIPOLE_FILE)
}
fn default_nroots() -> usize {
    NROOTS
}
fn default_conv_tol() -> f64 {
    CONV_TOL
}
fn default_lindep() -> f64 {
    LINDEP
}
fn default_max_cycle() -> usize {
    MAX_CYCLE
}
fn default_max_space() -> usize {
    MAX_SPACE
}
fn default_pspace_size() -> usize {
    PSPACE_SIZE
}
fn default_level_shift() -> f64 {
    LEVEL_SHIFT
}
fn default_davidson_only() -> bool {
    DAVIDSON_ONLY
}
fn default_threads() -> usize {
    THREADS
}
fn default_mintime() -> f64 {
    propagation_defaults::MINTIME
}
fn default_maxtime() -> f64 {
    propagation_defaults::MAXTIME
}
fn default_stepsize() -> f64 {
    propagation_defaults::STEPSIZE
}
fn default_max_krylov() -> usize {
    propagation_defaults::MAX_KRYLOV
}
fn default_krylov_lindep() -> f64 {
    propagation_defaults::LINDEP
}
fn default_time_step_threshold() -> f64 {
    propagation_defaults::TIME_STEP_THRESHOLD
}
fn default_max_restarts() -> usize {
    propagation_defaults::MAX_RESTARTS
}
fn default_min_time_step() -> f64 {
    propagation_defaults::MIN_TIME_STEP
}
fn default_axes() -> Vec<usize> {
    AXES.to_vec()
}
fn default_resample() -> bool {
    RESAMPLE
}
fn default_directory() -> String {
    String::from(OUTPUT_DIR)
}
fn default_result_file() -> String {
    String::from(RESULT_FILE)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    #[serde(default = "default_verbose")]
    pub verbose: i8,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub fci: FciConfig,
    #[serde(default)]
    pub propagation: PropagationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
            system: SystemConfig::default(),
            fci: FciConfig::default(),
            propagation: PropagationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Configuration {
    /// Read the configuration file from the working directory. If it does not exist, the
    /// default settings are used and written to the directory, so that the user can see all
    /// the used options.
    pub fn new() -> Result<Self> {
        Self::from_file(Path::new(CONFIG_FILE_NAME))
    }

    pub fn from_file(config_file_path: &Path) -> Result<Self> {
        let config_string: String = if config_file_path.exists() {
            fs::read_to_string(config_file_path).with_context(|| {
                format!("Unable to read config file {}", config_file_path.display())
            })?
        } else {
            String::new()
        };
        let config: Self = Self::from_toml(&config_string)?;
        if !config_file_path.exists() {
            let config_string: String =
                toml::to_string(&config).context("Unable to serialize the configuration")?;
            fs::write(config_file_path, config_string).with_context(|| {
                format!("Unable to write config file {}", config_file_path.display())
            })?;
        }
        Ok(config)
    }

    pub fn from_toml(config_string: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(config_string).context("Unable to parse the configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that cannot be expressed by the types alone.
    pub fn validate(&self) -> Result<(), FciError> {
        self.system.validate()?;
        self.fci.validate()?;
        self.propagation.validate()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// Number of alpha and beta electrons.
    #[serde(default = "default_nelec")]
    pub nelec: (usize, usize),
    #[serde(default = "default_ecore")]
    pub ecore: f64,
    #[serde(default = "default_h1e_file")]
    pub h1e_file: String,
    #[serde(default = "default_eri_file")]
    pub eri_file: String,
    #[serde(default = "default_dipole_file")]
    pub dipole_file: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            nelec: default_nelec(),
            ecore: default_ecore(),
            h1e_file: default_h1e_file(),
            eri_file: default_eri_file(),
            dipole_file: default_dipole_file(),
        }
    }
}

impl SystemConfig {
    fn validate(&self) -> Result<(), FciError> {
        if !self.ecore.is_finite() {
            return Err(FciError::InvalidConfig(format!(
                "ecore = {} is not a finite number",
                self.ecore
            )));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FciConfig {
    #[serde(default = "default_nroots")]
    pub nroots: usize,
    #[serde(default = "default_conv_tol")]
    pub conv_tol: f64,
    /// sqrt(conv_tol) if not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conv_tol_residual: Option<f64>,
    #[serde(default = "default_lindep")]
    pub lindep: f64,
    #[serde(default = "default_max_cycle")]
    pub max_cycle: usize,
    #[serde(default = "default_max_space")]
    pub max_space: usize,
    #[serde(default = "default_pspace_size")]
    pub pspace_size: usize,
    #[serde(default = "default_level_shift")]
    pub level_shift: f64,
    #[serde(default = "default_davidson_only")]
    pub davidson_only: bool,
    /// Number of threads of the CI operator, 0 lets rayon decide.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for FciConfig {
    fn default() -> Self {
        Self {
            nroots: default_nroots(),
            conv_tol: default_conv_tol(),
            conv_tol_residual: None,
            lindep: default_lindep(),
            max_cycle: default_max_cycle(),
            max_space: default_max_space(),
            pspace_size: default_pspace_size(),
            level_shift: default_level_shift(),
            davidson_only: default_davidson_only(),
            threads: default_threads(),
        }
    }
}

impl FciConfig {
    fn validate(&self) -> Result<(), FciError> {
        if self.nroots == 0 {
            return Err(FciError::InvalidConfig(String::from(
                "fci.nroots has to be at least 1",
            )));
        }
        if self.max_space < self.nroots {
            return Err(FciError::InvalidConfig(format!(
                "fci.max_space = {} is smaller than fci.nroots = {}",
                self.max_space, self.nroots
            )));
        }
        if self.max_cycle == 0 {
            return Err(FciError::InvalidConfig(String::from(
                "fci.max_cycle has to be at least 1",
            )));
        }
        for (name, value) in [
            ("fci.conv_tol", Some(self.conv_tol)),
            ("fci.conv_tol_residual", self.conv_tol_residual),
            ("fci.lindep", Some(self.lindep)),
        ] {
            if let Some(value) = value {
                if !(value > 0.0) || !value.is_finite() {
                    return Err(FciError::InvalidConfig(format!(
                        "{} = {} has to be a positive number",
                        name, value
                    )));
                }
            }
        }
        if !self.level_shift.is_finite() {
            return Err(FciError::InvalidConfig(format!(
                "fci.level_shift = {} is not a finite number",
                self.level_shift
            )));
        }
        Ok(())
    }

    pub fn solver(&self) -> Result<FciSolver, FciError> {
        FciSolverBuilder::default()
            .nroots(self.nroots)
            .conv_tol(self.conv_tol)
            .conv_tol_residual(self.conv_tol_residual)
            .lindep(self.lindep)
            .max_cycle(self.max_cycle)
            .max_space(self.max_space)
            .pspace_size(self.pspace_size)
            .level_shift(self.level_shift)
            .davidson_only(self.davidson_only)
            .build()
            .map_err(|err| FciError::InvalidConfig(err.to_string()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PropagationConfig {
    /// Start of the uniform time grid of the resampled correlation function.
    #[serde(default = "default_mintime")]
    pub mintime: f64,
    #[serde(default = "default_maxtime")]
    pub maxtime: f64,
    /// Spacing of the uniform time grid of the resampled correlation function.
    #[serde(default = "default_stepsize")]
    pub stepsize: f64,
    #[serde(default = "default_max_krylov")]
    pub max_krylov: usize,
    #[serde(default = "default_krylov_lindep")]
    pub lindep: f64,
    #[serde(default = "default_time_step_threshold")]
    pub time_step_threshold: f64,
    #[serde(default = "default_max_restarts")]
    pub max_restarts: usize,
    #[serde(default = "default_min_time_step")]
    pub min_time_step: f64,
    /// Cartesian components of the dipole operator that are propagated.
    #[serde(default = "default_axes")]
    pub axes: Vec<usize>,
    /// Write C(t) on the uniform grid mintime, mintime + stepsize, ... as well.
    #[serde(default = "default_resample")]
    pub resample: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            mintime: default_mintime(),
            maxtime: default_maxtime(),
            stepsize: default_stepsize(),
            max_krylov: default_max_krylov(),
            lindep: default_krylov_lindep(),
            time_step_threshold: default_time_step_threshold(),
            max_restarts: default_max_restarts(),
            min_time_step: default_min_time_step(),
            axes: default_axes(),
            resample: default_resample(),
        }
    }
}

impl PropagationConfig {
    fn validate(&self) -> Result<(), FciError> {
        if self.axes.is_empty() {
            return Err(FciError::NoDipoleAxes);
        }
        for (idx, axis) in self.axes.iter().enumerate() {
            if *axis > 2 {
                return Err(FciError::InvalidConfig(format!(
                    "propagation.axes contains {}, only 0, 1 and 2 are Cartesian axes",
                    axis
                )));
            }
            if self.axes[..idx].contains(axis) {
                return Err(FciError::InvalidConfig(format!(
                    "propagation.axes contains {} twice",
                    axis
                )));
            }
        }
        if !(self.maxtime > 0.0) || !self.maxtime.is_finite() {
            return Err(FciError::InvalidConfig(format!(
                "propagation.maxtime = {} has to be a positive number",
                self.maxtime
            )));
        }
        if !(self.stepsize > 0.0) || !(self.mintime <= self.maxtime) {
            return Err(FciError::InvalidConfig(format!(
                "the time grid from {} to {} with step {} is empty",
                self.mintime, self.maxtime, self.stepsize
            )));
        }
        if self.max_krylov < 2 {
            return Err(FciError::InvalidConfig(String::from(
                "propagation.max_krylov has to be at least 2",
            )));
        }
        if !(self.time_step_threshold > 0.0 && self.time_step_threshold < 1.0) {
            return Err(FciError::InvalidConfig(format!(
                "propagation.time_step_threshold = {} has to be between 0 and 1",
                self.time_step_threshold
            )));
        }
        Ok(())
    }

    pub fn propagator(&self) -> Result<LanczosPropagator, FciError> {
        LanczosPropagatorBuilder::default()
            .maxtime(self.maxtime)
            .max_krylov(self.max_krylov)
            .lindep(self.lindep)
            .threshold(self.time_step_threshold)
            .max_restarts(self.max_restarts)
            .min_time_step(self.min_time_step)
            .build()
            .map_err(|err| FciError::InvalidConfig(err.to_string()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_result_file")]
    pub result_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            result_file: default_result_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Configuration::from_toml("").unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.propagation.axes, vec![0, 1, 2]);
        assert_eq!(config.fci.conv_tol_residual, None);
        assert_abs_diff_eq!(
            config.fci.solver().unwrap().tolerance_residual(),
            1e-5,
            epsilon = 1e-18
        );
    }

    #[test]
    fn settings_are_read() {
        let config = Configuration::from_toml(
            "verbose = 1\n\
             [system]\n\
             nelec = [3, 2]\n\
             [fci]\n\
             pspace_size = 0\n\
             conv_tol_residual = 1e-6\n\
             [propagation]\n\
             axes = [2]\n\
             maxtime = 5.0\n",
        )
        .unwrap();
        assert_eq!(config.verbose, 1);
        assert_eq!(config.system.nelec, (3, 2));
        assert_eq!(config.fci.pspace_size, 0);
        assert_eq!(config.fci.solver().unwrap().tolerance_residual(), 1e-6);
        assert_eq!(config.propagation.axes, vec![2]);
        assert_eq!(config.propagation.propagator().unwrap().maxtime(), 5.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Configuration::from_toml("[fci]\nconv_tolerance = 1e-8\n").is_err());
        assert!(Configuration::from_toml("[lanczos]\nmaxtime = 1.0\n").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Configuration::from_toml("[propagation]\naxes = []\n").unwrap_err();
        assert_eq!(err.downcast_ref::<FciError>(), Some(&FciError::NoDipoleAxes));
        assert!(Configuration::from_toml("[propagation]\naxes = [0, 3]\n").is_err());
        assert!(Configuration::from_toml("[propagation]\naxes = [1, 1]\n").is_err());
        assert!(Configuration::from_toml("[fci]\nnroots = 0\n").is_err());
        assert!(Configuration::from_toml("[propagation]\nmax_krylov = 1\n").is_err());
    }

    #[test]
    fn defaults_survive_a_round_trip() {
        let config = Configuration::default();
        let string: String = toml::to_string(&config).unwrap();
        assert_eq!(Configuration::from_toml(&string).unwrap(), config);
    }
}
