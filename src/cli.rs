//! Command-line interface
//!
//! ```bash
//! # Every plot of an experiment document (experiments/sweep.yml)
//! trueno-report report sweep.yml --stats-key /seed --statistic min-max
//!
//! # One ad-hoc plot
//! trueno-report plot logs/sweep_lr --key eval/success --output success.png --smooth 0.6
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::align::Statistic;
use crate::event::OnMissingKey;
use crate::plot::{LegendPosition, PlotOptions, XAxis};
use crate::report::config::validate_plot_options;
use crate::report::{
    load_experiment, load_plot_config, plot_logs, resolve_experiment, AnalysisSettings,
    ColorMode, ExperimentConfig, PlotConfig, PlotRequest, ReportDriver, SummaryMode,
    PLOT_CONFIG_FILE,
};
use crate::{Error, Result};

/// Aggregate and plot TensorBoard scalars across repeated runs
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "trueno-report")]
#[command(version)]
#[command(about = "Aggregate and plot TensorBoard scalar logs across repeated experiment runs")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress everything but errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Render every plot of an experiment document
    Report(ReportArgs),

    /// Plot one scalar tag across log directories
    Plot(PlotArgs),
}

/// Settings shared by both commands; each overrides `plot.yml`.
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct AnalysisArgs {
    /// Grid points per aligned series
    #[arg(short = 'n', long)]
    pub resolution: Option<usize>,

    /// Separator of repeated trials in run names, e.g. /seed
    #[arg(long)]
    pub stats_key: Option<String>,

    /// Separator of distributed workers in run names, e.g. /rank
    #[arg(long)]
    pub worker_key: Option<String>,

    /// Spread statistic
    #[arg(long, value_enum)]
    pub statistic: Option<Statistic>,

    /// Missing tag policy
    #[arg(long, value_enum)]
    pub on_missing_key: Option<OnMissingKey>,

    /// Which grid point the summary reports
    #[arg(long, value_enum)]
    pub summary: Option<SummaryMode>,

    /// First step to plot
    #[arg(short, long)]
    pub start: Option<f64>,

    /// Plot steps strictly below this one
    #[arg(short, long)]
    pub limit: Option<f64>,
}

/// Arguments for the report command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ReportArgs {
    /// Experiment document, as a path or a name inside the config directory
    #[arg(value_name = "EXPERIMENT")]
    pub experiment: PathBuf,

    /// Directory holding plot.yml and experiment documents
    #[arg(long, default_value = "experiments")]
    pub config_dir: PathBuf,

    /// Also write aggregated statistics as Parquet
    #[arg(long)]
    pub export: bool,

    /// Loading and aggregation overrides
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Arguments for the plot command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct PlotArgs {
    /// Log root directories
    #[arg(value_name = "LOGS", required = true)]
    pub logs: Vec<PathBuf>,

    /// Scalar tag to plot
    #[arg(short, long)]
    pub key: String,

    /// Output PNG path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Substring event file paths must contain
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Loading and aggregation overrides
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Chart caption
    #[arg(long)]
    pub title: Option<String>,

    /// X axis description
    #[arg(long)]
    pub xlabel: Option<String>,

    /// Y axis description
    #[arg(long)]
    pub ylabel: Option<String>,

    /// Steps or wall-clock hours on the x axis
    #[arg(long, value_enum, default_value_t = XAxis::Steps)]
    pub xaxis: XAxis,

    /// Factor applied to every value
    #[arg(long, default_value_t = 1.0)]
    pub yscale: f64,

    /// EMA smoothing weight in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    pub smooth: f64,

    /// Lower clipping bound
    #[arg(long)]
    pub vmin: Option<f64>,

    /// Upper clipping bound
    #[arg(long)]
    pub vmax: Option<f64>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 900)]
    pub height: u32,

    /// Logarithmic x axis
    #[arg(long)]
    pub logx: bool,

    /// Logarithmic y axis
    #[arg(long)]
    pub logy: bool,

    /// Hide the background mesh
    #[arg(long)]
    pub no_grid: bool,

    /// Legend placement
    #[arg(long, value_enum, default_value_t = LegendPosition::UpperRight)]
    pub legend: LegendPosition,
}

/// Parse CLI arguments from a string slice (for testing)
///
/// # Errors
///
/// Returns the clap error for invalid arguments.
pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to analysis settings and plot options.
pub fn apply_overrides(
    settings: &mut AnalysisSettings,
    options: &mut PlotOptions,
    args: &AnalysisArgs,
) {
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }
    if let Some(key) = &args.stats_key {
        settings.stats_key = Some(key.clone()).filter(|k| !k.is_empty());
    }
    if let Some(key) = &args.worker_key {
        settings.worker_key = Some(key.clone()).filter(|k| !k.is_empty());
    }
    if let Some(statistic) = args.statistic {
        settings.statistic = statistic;
    }
    if let Some(policy) = args.on_missing_key {
        settings.on_missing_key = policy;
    }
    if let Some(summary) = args.summary {
        settings.summary = summary;
    }
    if args.start.is_some() {
        options.start = args.start;
    }
    if args.limit.is_some() {
        options.limit = args.limit;
    }
}

impl PlotArgs {
    /// Plot options described by the flags.
    #[must_use]
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            title: self.title.clone(),
            xlabel: self.xlabel.clone(),
            ylabel: self.ylabel.clone(),
            figsize: (self.width, self.height),
            xaxis: self.xaxis,
            yscale: self.yscale,
            vmin: self.vmin,
            vmax: self.vmax,
            smooth: self.smooth,
            start: None,
            limit: None,
            logx: self.logx,
            logy: self.logy,
            grid: !self.no_grid,
            legend: self.legend,
        }
    }
}

/// Load configuration for a report run with CLI overrides applied.
///
/// # Errors
///
/// Returns `Error::Config` if a document is missing or invalid.
pub fn load_report_config(args: &ReportArgs) -> Result<(PlotConfig, ExperimentConfig)> {
    let mut plot_config = load_plot_config(args.config_dir.join(PLOT_CONFIG_FILE))?;
    apply_overrides(&mut plot_config.analysis, &mut plot_config.plot, &args.analysis);
    plot_config.validate()?;
    let experiment = load_experiment(resolve_experiment(&args.config_dir, &args.experiment))?;
    Ok((plot_config, experiment))
}

/// Execute a parsed command, writing summaries to `out`.
///
/// # Errors
///
/// Returns any configuration, reader, rendering or export error.
pub fn run_command<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let color = ColorMode::detect();
    match &cli.command {
        Command::Report(args) => {
            let (plot_config, experiment) = load_report_config(args)?;
            let outcome = ReportDriver::new(&plot_config)
                .export(args.export)
                .color(color)
                .run(&experiment, out)?;
            info!(
                plots = outcome.plots.len(),
                exports = outcome.exports.len(),
                missing_metrics = outcome.missing_metrics,
                degenerate_groups = outcome.degenerate_groups,
                "Report finished"
            );
            Ok(())
        }
        Command::Plot(args) => {
            let mut settings = AnalysisSettings::default();
            let mut options = args.plot_options();
            apply_overrides(&mut settings, &mut options, &args.analysis);
            settings.validate()?;
            validate_plot_options(&options)?;
            let request = PlotRequest {
                logs: args.logs.clone(),
                key: args.key.clone(),
                output: args.output.clone(),
                prefix: args.prefix.clone(),
                settings,
                options,
            };
            match plot_logs(&request, color, out)? {
                Some(_) => Ok(()),
                None => Err(Error::InvalidInput(format!(
                    "No run under {} contains scalar '{}'",
                    args.logs
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    args.key
                ))),
            }
        }
    }
}
