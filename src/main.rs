use anyhow::{Context, Result};
use clap::{crate_name, crate_version, Arg, Command};
use env_logger::Builder;
use fcidip::fci::kernel_lanczos;
use fcidip::io::{read_integrals, write_footer, write_header, Configuration};
use fcidip::utils::Timer;
use fcidip_dynamics::output::{write_axis_data, write_correlation, write_summary};
use log::{info, LevelFilter};
use ndarray_linalg::c64;
use std::io::Write;
use std::path::Path;

fn main() -> Result<()> {
    // Input.
    let matches = Command::new(crate_name!())
        .version(crate_version!())
        .about("full CI dipole correlation functions from restarted Lanczos propagation")
        .arg(
            Arg::new("integrals")
                .help("Directory with the integral and dipole files")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .help("Configuration file, fcidip.toml in the working directory if not given")
                .long("config")
                .short('c')
                .takes_value(true),
        )
        .get_matches();
    // The directory with the integrals is the only mandatory argument.
    let directory: &Path = Path::new(
        matches
            .value_of("integrals")
            .context("no integral directory given")?,
    );
    let config: Configuration = match matches.value_of("config") {
        Some(path) => Configuration::from_file(Path::new(path))?,
        None => Configuration::new()?,
    };

    // Logging.
    // The log level is set.
    let log_level: LevelFilter = match config.verbose {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    // and the logger is build.
    Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level)
        .init();

    // The program header is written to the command line.
    write_header();
    // and the total wall-time timer is started.
    let timer: Timer = Timer::start();

    // Computations.
    // ................................................................
    let (integrals, dipoles) = read_integrals(directory, &config.system)?;
    let result = kernel_lanczos(&integrals, dipoles.view(), None, &config)?;

    // Output.
    let output: &Path = Path::new(&config.output.directory);
    for axis in result.axes.iter() {
        write_axis_data(output, &axis.accumulator)?;
        if config.propagation.resample && axis.accumulator.final_time().is_some() {
            let (grid, values): (Vec<f64>, Vec<c64>) = axis.accumulator.resample(
                config.propagation.mintime,
                config.propagation.maxtime,
                config.propagation.stepsize,
            )?;
            write_correlation(
                &output.join(format!("corr_grid_{}.txt", axis.axis)),
                &grid,
                &values,
            )?;
        }
    }
    write_summary(&output.join(&config.output.result_file), &result.summary())?;
    info!("results are written to {}", output.display());
    // ................................................................

    // Finished.
    // The total wall-time is printed together with the end statement.
    write_footer(timer);
    Ok(())
}
