//! trueno-report CLI
//!
//! # Usage
//!
//! ```bash
//! # Every plot of experiments/sweep.yml, configured by experiments/plot.yml
//! trueno-report report sweep.yml
//!
//! # Seeds grouped by "/seed", min/max band, Parquet export
//! trueno-report report sweep.yml --stats-key /seed --statistic min-max --export
//!
//! # One tag across two log roots
//! trueno-report plot logs/a logs/b --key eval/success --output success.png
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG`; `-v` and `-q` pick the
//! default level when it is unset.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trueno_report::cli::{run_command, Cli, Command};

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trueno_report={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let what = match &cli.command {
        Command::Report(args) => format!("report {}", args.experiment.display()),
        Command::Plot(args) => format!("plot of '{}'", args.key),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(cli, &mut out).with_context(|| format!("Failed to produce {what}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
