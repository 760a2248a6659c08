//! Calibrate a `time,raw,flag` file against its interleaved standards

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use drift_calibration::io::{read_series, write_calibrated, WriteOptions};
use drift_calibration::{calibrate, Config};

#[derive(Parser, Debug)]
#[command(name = "calibrate")]
#[command(version)]
#[command(about = "Correct sensor drift against interleaved reference gas measurements", long_about = None)]
struct Cli {
    /// Headed CSV with `time`, `raw` and `flag` columns
    input: PathBuf,

    /// TOML file with tolerances and flag sentinels
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Destination file, standard output if omitted
    #[arg(short, long, value_name = "PATH", default_value = "")]
    output: String,

    /// Largest allowed percent deviation of a corrected standard from its known value
    #[arg(long = "er-tol", value_name = "PCT")]
    er_tol: Option<f64>,

    /// Largest allowed time since the last real reference measurement
    #[arg(long = "dt-tol", value_name = "T")]
    dt_tol: Option<f64>,

    /// Output field separator
    #[arg(short, long, default_value = ",")]
    separator: String,

    /// Written in place of undefined values
    #[arg(long, default_value = "")]
    missing: String,

    /// Do not write a header line
    #[arg(long = "no-header")]
    no_header: bool,
}

fn run(cli: Cli) -> drift_calibration::Result<()> {
    let mut config: Config<f64> = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(er_tol) = cli.er_tol {
        config = config.with_er_tol(er_tol);
    }
    if let Some(dt_tol) = cli.dt_tol {
        config = config.with_dt_tol(dt_tol);
    }

    let series = read_series(&cli.input)?;
    let calibrated = calibrate(&series, &config)?;

    let options = WriteOptions {
        separator: cli.separator,
        header: !cli.no_header,
        missing: cli.missing,
    };
    write_calibrated(&calibrated, &cli.output, &options)
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("calibration failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
