//! Report orchestration

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::config::{AnalysisSettings, ExperimentConfig, MetricEntry, PlotConfig};
use super::summary::{summary_line, ColorMode, SummaryMode};
use crate::align::Aggregation;
use crate::discovery::{discover, load_runs, FileFilter};
use crate::export::write_parquet;
use crate::plot::{plot_series, Palette, PlotOptions};
use crate::Result;

/// What a report run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    /// PNG files written.
    pub plots: Vec<PathBuf>,
    /// Parquet files written.
    pub exports: Vec<PathBuf>,
    /// Metrics no run contained.
    pub missing_metrics: usize,
    /// Groups that could not be aligned.
    pub degenerate_groups: usize,
}

/// Load, align and summarize one metric across `roots`.
///
/// Returns `None` when no discovered run contains the tag.
///
/// # Errors
///
/// Propagates discovery, reader and configuration errors.
pub fn aggregate_metric<P: AsRef<Path>>(
    roots: &[P],
    filter: &FileFilter,
    key: &str,
    settings: &AnalysisSettings,
) -> Result<Option<Aggregation>> {
    let entries = discover(roots, filter)?;
    let store = load_runs(&entries, &[key], &settings.reader_options())?;
    let runs = store.series_for_tag(key);
    if runs.is_empty() {
        warn!(key, files = entries.len(), "No run contains scalar");
        return Ok(None);
    }
    let aggregation = settings.aggregator().aggregate(&runs)?;
    info!(
        key,
        runs = runs.len(),
        groups = aggregation.series.len(),
        degenerate = aggregation.degenerate.len(),
        "Aggregated metric"
    );
    Ok(Some(aggregation))
}

/// Write the summary block of one metric.
///
/// # Errors
///
/// Returns `Error::Io` if `out` cannot be written.
pub fn write_summary<W: Write>(
    out: &mut W,
    title: &str,
    aggregation: &Aggregation,
    entry_summary: Option<SummaryMode>,
    settings: &AnalysisSettings,
    color: ColorMode,
) -> Result<()> {
    let mode = entry_summary.unwrap_or(settings.summary);
    writeln!(out, "{title}")?;
    for (group, series) in &aggregation.series {
        if let Some(line) = summary_line(group, series, mode, color) {
            writeln!(out, "  {line}")?;
        }
    }
    for degenerate in &aggregation.degenerate {
        writeln!(out, "  skipped: {degenerate}")?;
    }
    Ok(())
}

/// Runs every (path group, plot name) and metric of an experiment.
pub struct ReportDriver<'a> {
    plot_config: &'a PlotConfig,
    export: bool,
    color: ColorMode,
    palette: Palette,
}

impl<'a> ReportDriver<'a> {
    /// Driver for `plot_config`; summaries use [`ColorMode::detect`].
    #[must_use]
    pub fn new(plot_config: &'a PlotConfig) -> Self {
        Self {
            plot_config,
            export: false,
            color: ColorMode::detect(),
            palette: plot_config.palette(),
        }
    }

    /// Also write `<plot_name>_<file>.parquet` next to every plot.
    #[must_use]
    pub const fn export(mut self, export: bool) -> Self {
        self.export = export;
        self
    }

    /// Override color detection.
    #[must_use]
    pub const fn color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Run the whole experiment, writing summaries to `out`.
    ///
    /// A metric no run contains is skipped; degenerate groups are reported
    /// and the remaining groups are still plotted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `savedir` is unset, plus any discovery,
    /// reader, rendering or export error.
    pub fn run<W: Write>(&self, experiment: &ExperimentConfig, out: &mut W) -> Result<ReportOutcome> {
        let savedir = self.plot_config.savedir()?;
        fs::create_dir_all(savedir)?;
        let mut outcome = ReportOutcome::default();

        for (roots, plot_name) in experiment.experiments() {
            writeln!(out, "Processing {plot_name} ...")?;
            info!(plot_name, roots = roots.len(), "Processing experiment");
            for entry in &experiment.keys {
                let filter = FileFilter::new(entry.prefix.clone(), experiment.filters.clone());
                self.run_metric(roots, &filter, entry, plot_name, savedir, out, &mut outcome)?;
            }
            writeln!(
                out,
                "Plots saved in {}",
                savedir.join(format!("{plot_name}_*.png")).display()
            )?;
        }
        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_metric<W: Write>(
        &self,
        roots: &[PathBuf],
        filter: &FileFilter,
        entry: &MetricEntry,
        plot_name: &str,
        savedir: &Path,
        out: &mut W,
        outcome: &mut ReportOutcome,
    ) -> Result<()> {
        let settings = &self.plot_config.analysis;
        let Some(aggregation) = aggregate_metric(roots, filter, &entry.key, settings)? else {
            outcome.missing_metrics += 1;
            return Ok(());
        };
        outcome.degenerate_groups += aggregation.degenerate.len();

        let title = if entry.prefix.is_empty() {
            entry.label().to_string()
        } else {
            format!("{}/{}", entry.prefix, entry.label())
        };
        write_summary(
            out,
            &title,
            &aggregation,
            entry.overrides.summary,
            settings,
            self.color,
        )?;
        if aggregation.series.is_empty() {
            warn!(key = %entry.key, "Every group is degenerate, nothing to plot");
            return Ok(());
        }

        let options = self.plot_config.plot.merged(&entry.overrides.plot);
        let stem = format!("{plot_name}_{}", entry.file);
        let png = savedir.join(format!("{stem}.png"));
        plot_series(&aggregation.series, &options, &self.palette, entry.label(), &png)?;
        outcome.plots.push(png);

        if self.export {
            let parquet = savedir.join(format!("{stem}.parquet"));
            write_parquet(&aggregation.series, &parquet)?;
            outcome.exports.push(parquet);
        }
        Ok(())
    }
}

/// One ad-hoc plot of a single tag, as run by the `plot` command.
#[derive(Debug, Clone)]
pub struct PlotRequest {
    /// Log roots.
    pub logs: Vec<PathBuf>,
    /// Scalar tag.
    pub key: String,
    /// PNG path.
    pub output: PathBuf,
    /// Substring event file paths must contain.
    pub prefix: String,
    /// Loading and aggregation settings.
    pub settings: AnalysisSettings,
    /// Plot options.
    pub options: PlotOptions,
}

/// Plot one tag across `request.logs`, printing its summary to `out`.
///
/// Returns the aggregation that was drawn, or `None` if no run contains
/// the tag.
///
/// # Errors
///
/// Propagates discovery, reader and rendering errors.
pub fn plot_logs<W: Write>(
    request: &PlotRequest,
    color: ColorMode,
    out: &mut W,
) -> Result<Option<Aggregation>> {
    let filter = FileFilter::new(request.prefix.clone(), Vec::new());
    let Some(aggregation) =
        aggregate_metric(request.logs.as_slice(), &filter, &request.key, &request.settings)?
    else {
        return Ok(None);
    };
    write_summary(out, &request.key, &aggregation, None, &request.settings, color)?;
    if aggregation.series.is_empty() {
        warn!(key = %request.key, "Every group is degenerate, nothing to plot");
        return Ok(Some(aggregation));
    }
    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    plot_series(
        &aggregation.series,
        &request.options,
        &Palette::default(),
        &request.key,
        &request.output,
    )?;
    Ok(Some(aggregation))
}
