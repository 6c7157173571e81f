/// This module governs the high-level implementation of the simulation
mod calculations;
mod configuration;
mod error;
mod output;
mod styles;
mod telemetry;

pub(crate) use configuration::Configuration;

use crate::{constants::PhysicalConstants, input::Input, workers::WorkerPool};
use clap::{ArgEnum, Parser};
use color_eyre::eyre::eyre;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct App {
    /// The material and band structure input
    file_path: Option<PathBuf>,
    #[clap(arg_enum, short, long, default_value = "info")]
    log_level: LogLevel,
    /// Directory receiving the results and the log file
    #[clap(short, long, default_value = "../results")]
    output: PathBuf,
    /// Also write the solution of every state
    #[clap(long)]
    dump_state: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
enum LogLevel {
    Trace,
    Info,
    Debug,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Parses the command line, solves every configured condition and writes the results
pub fn run() -> color_eyre::Result<()> {
    let cli = App::parse();

    std::fs::create_dir_all(&cli.output)?;
    let (subscriber, _guard) = telemetry::get_subscriber(cli.log_level, &cli.output);
    telemetry::init_subscriber(subscriber)?;

    let config = Configuration::build()?;
    let path = cli
        .file_path
        .ok_or(eyre!("A file path needs to be passed."))?;
    let input = Input::build(&path)?;

    let constants = PhysicalConstants::default();
    let pool = WorkerPool::new(
        config.performance.parallel,
        config.performance.parallel_threshold,
    )?;

    let setup = calculations::Setup::build(&config, &input, &constants, &pool)?;
    let outcome = setup.solve(&config, &constants, &pool, cli.dump_state)?;

    output::write_reports(&cli.output, &path, &outcome.reports)?;
    if let Some(state) = &outcome.state {
        output::write_state(&cli.output, state)?;
    }
    output::print_summary(&outcome.reports, &styles::Styles::for_stdout());
    Ok(())
}
