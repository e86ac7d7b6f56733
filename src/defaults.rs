// config file
pub const CONFIG_FILE_NAME: &str = "fcidip.toml";

// SYSTEM SPECIFICATION
// number of alpha and beta electrons
pub const NELEC: (usize, usize) = (1, 1);
// constant energy (nuclear repulsion and frozen core) added to the electronic energies
pub const ECORE: f64 = 0.0;

// integral files inside of the input directory
pub const H1E_FILE: &str = "h1e.npy";
pub const ERI_FILE: &str = "eri.npy";
pub const DIPOLE_FILE: &str = "dipole.npy";

// GROUND STATE SOLVER
pub const NROOTS: usize = 1;
pub const CONV_TOL: f64 = 1e-10;
pub const LINDEP: f64 = 1e-14;
pub const MAX_CYCLE: usize = 100;
pub const MAX_SPACE: usize = 12;
pub const PSPACE_SIZE: usize = 400;
pub const LEVEL_SHIFT: f64 = 1e-3;
pub const DAVIDSON_ONLY: bool = false;
// 0 uses the default number of threads of rayon
pub const THREADS: usize = 0;

// reciprocals in the preconditioner are limited to this magnitude
pub const PRECOND_CAP: f64 = 1e8;
// smallest denominator of the diagonal preconditioner
pub const DIAG_FLOOR: f64 = 1e-8;
// integrals with a larger asymmetry are treated as non-Hermitian
pub const HERMITIAN_THRESHOLD: f64 = 1e-10;
// two pspace eigenvalues closer than this are considered degenerate
pub const DEGENERACY_THRESHOLD: f64 = 1e-12;

// determinants with larger coefficients are listed for the ground state
pub const LARGE_CI_TOL: f64 = 0.1;

// PROPAGATION
pub const AXES: [usize; 3] = [0, 1, 2];
pub const RESAMPLE: bool = false;

// OUTPUT
pub const OUTPUT_DIR: &str = "fcidip_output";
pub const RESULT_FILE: &str = "result.json";

pub const VERBOSE: i8 = 0;
