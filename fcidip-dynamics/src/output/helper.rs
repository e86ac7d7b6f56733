use log::{info, warn};
use ndarray_linalg::c64;
use std::time::Instant;

pub fn print_propagation_init(maxtime: f64, max_krylov: usize, threshold: f64) {
    info!("{:^80}", "");
    info!("{: ^80}", "Restarted Lanczos Propagation");
    info!("{:-^80}", "");
    info!("{: <40} {:>12.4} a.u.", "total propagation time:", maxtime);
    info!("{: <40} {:>12}", "maximal Krylov dimension:", max_krylov);
    info!("{: <40} {:>12.2e}", "truncation threshold:", threshold);
    info!("{:-^80}", "");
    info!(
        "{: >7} {: >14} {: >14} {: >6} {: >17} {: >17}",
        "Restart", "time", "step", "dim", "Re C(t)", "Im C(t)"
    );
    info!("{:-^80}", "");
}

pub fn print_restart(restart: usize, time: f64, step: f64, dim: usize, sample: c64) {
    info!(
        "{: >7} {:>14.6} {:>14.6e} {:>6} {:>17.10} {:>17.10}",
        restart + 1,
        time,
        step,
        dim,
        sample.re,
        sample.im
    );
}

pub fn print_propagation_end(timer: Instant) {
    info!("{:-^80}", "");
    info!(
        "{:>68} {:>8.2} s",
        "elapsed time:",
        timer.elapsed().as_secs_f32()
    );
    info!("{:^80}", "");
}

pub fn print_propagation_failure(axis: usize, message: &str) {
    warn!("{:-<80}", "");
    warn!("Propagation of axis {} stopped: {}", axis, message);
    warn!("{:-<80}", "");
}
