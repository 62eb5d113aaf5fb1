//! Report driver
//!
//! Reads `plot.yml` and an experiment document, then for every
//! (path group, plot name) and metric: loads the runs, aligns them, prints
//! a summary and renders `<savedir>/<plot_name>_<file>.png`.

pub mod config;
mod driver;
mod summary;

pub use config::{
    load_experiment, load_plot_config, resolve_experiment, AnalysisSettings, ExperimentConfig,
    MetricEntry, MetricOverrides, PlotConfig, PLOT_CONFIG_FILE,
};
pub use driver::{aggregate_metric, plot_logs, write_summary, PlotRequest, ReportDriver, ReportOutcome};
pub use summary::{summary_index, summary_line, ColorMode, SummaryMode};
