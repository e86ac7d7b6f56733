// maximal dimension of the Krylov space that is built at every restart
pub const MAX_KRYLOV: usize = 12;
// linear dependence threshold of the Lanczos recursion (squared norm)
pub const LINDEP: f64 = 1.0e-14;
// truncation threshold that enters the estimate of the safe time step
pub const TIME_STEP_THRESHOLD: f64 = 1.0e-6;
// the propagation is aborted after this number of Krylov restarts
pub const MAX_RESTARTS: usize = 100_000;
// time steps (a.u.) below this value are treated as a stalled propagation
pub const MIN_TIME_STEP: f64 = 1.0e-8;
// norms below this value are treated as a vanishing vector
pub const NORM_FLOOR: f64 = 1.0e-14;
// start, end and stepsize (a.u.) of the time grid
pub const MINTIME: f64 = 0.0;
pub const MAXTIME: f64 = 100.0;
pub const STEPSIZE: f64 = 0.1;
// tolerance of the hermiticity check of the reduced Hamiltonian
pub const HERMITIAN_THRESHOLD: f64 = 1.0e-10;
