//! YAML configuration documents
//!
//! `plot.yml` carries the output directory, analysis settings and default
//! plot options in one flat mapping:
//!
//! ```yaml
//! savedir: plots
//! resolution: 100
//! stats_key: /seed
//! statistic: min-max
//! smooth: 0.6
//! xaxis: steps
//! ```
//!
//! An experiment document lists the log roots to compare and the metrics
//! to plot:
//!
//! ```yaml
//! paths:
//!   - [logs/sweep_lr, logs/baseline]
//! plot_name: [lr_sweep]
//! filters: [seed]
//! keys:
//!   - [eval, eval/success, success, {ylabel: success rate}]
//!   - key: train/loss
//!     file: loss
//!     label: Training loss
//!     summary: min
//!     plot: {logy: true}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::summary::SummaryMode;
use crate::align::{Aggregator, Statistic, DEFAULT_WORKER_KEY};
use crate::event::{OnMissingKey, ReaderOptions};
use crate::plot::{Palette, PlotOptions, PlotOverrides};
use crate::{Error, Result};

/// File name of the shared plot configuration inside the config directory.
pub const PLOT_CONFIG_FILE: &str = "plot.yml";

/// Default number of grid points per aligned series.
pub const DEFAULT_RESOLUTION: usize = 50;

/// How runs are loaded, grouped and reduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Grid points per aligned series.
    pub resolution: usize,
    /// Separator of repeated trials, e.g. `/seed`.
    pub stats_key: Option<String>,
    /// Separator of distributed workers, e.g. `/rank`.
    pub worker_key: Option<String>,
    /// Spread statistic.
    pub statistic: Statistic,
    /// Missing tag policy.
    pub on_missing_key: OnMissingKey,
    /// Drop samples orphaned by restarts.
    pub purge_orphaned: bool,
    /// Which grid point the console summary reports.
    pub summary: SummaryMode,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            stats_key: None,
            worker_key: Some(DEFAULT_WORKER_KEY.to_string()),
            statistic: Statistic::Std,
            on_missing_key: OnMissingKey::Skip,
            purge_orphaned: true,
            summary: SummaryMode::Final,
        }
    }
}

impl AnalysisSettings {
    /// Aggregator configured from these settings.
    #[must_use]
    pub fn aggregator(&self) -> Aggregator {
        let mut aggregator = Aggregator::new(self.resolution).statistic(self.statistic);
        if let Some(key) = &self.worker_key {
            aggregator = aggregator.worker_key(key.as_str());
        }
        if let Some(key) = &self.stats_key {
            aggregator = aggregator.stats_key(key.as_str());
        }
        aggregator
    }

    /// Reader options configured from these settings.
    #[must_use]
    pub const fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            purge_orphaned: self.purge_orphaned,
            on_missing_key: self.on_missing_key,
        }
    }

    /// Check settings that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero resolution.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(Error::Config(
                "resolution must be at least 1 grid point".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contents of `plot.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Directory plots and exports are written to.
    pub savedir: Option<PathBuf>,
    /// Line colors as `#rrggbb`; empty uses the default palette.
    pub colors: Vec<String>,
    /// Loading and aggregation settings.
    #[serde(flatten)]
    pub analysis: AnalysisSettings,
    /// Default plot options for every metric.
    #[serde(flatten)]
    pub plot: PlotOptions,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            savedir: None,
            colors: Vec::new(),
            analysis: AnalysisSettings::default(),
            plot: PlotOptions::default(),
        }
    }
}

impl PlotConfig {
    /// Parse and validate a `plot.yml` document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is malformed or invalid.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| Error::Config(format!("Invalid plot configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        validate_plot_options(&self.plot)?;
        if let Some(bad) = self.colors.iter().find(|c| Palette::parse_hex(c).is_none()) {
            return Err(Error::Config(format!(
                "Invalid color '{bad}', expected #rrggbb"
            )));
        }
        Ok(())
    }

    /// Output directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `savedir` is not set.
    pub fn savedir(&self) -> Result<&Path> {
        self.savedir
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{PLOT_CONFIG_FILE} must set 'savedir'")))
    }

    /// Palette built from `colors`.
    #[must_use]
    pub fn palette(&self) -> Palette {
        Palette::new(
            self.colors
                .iter()
                .filter_map(|c| Palette::parse_hex(c))
                .collect(),
        )
    }
}

/// Check plot options that serde cannot.
///
/// # Errors
///
/// Returns `Error::Config` for a smoothing weight outside `[0, 1]`, an
/// empty figure or `vmin > vmax`.
pub fn validate_plot_options(options: &PlotOptions) -> Result<()> {
    if !(0.0..=1.0).contains(&options.smooth) {
        return Err(Error::Config(format!(
            "smooth must lie in [0, 1], got {}",
            options.smooth
        )));
    }
    if options.figsize.0 == 0 || options.figsize.1 == 0 {
        return Err(Error::Config(format!(
            "figsize must be positive, got {:?}",
            options.figsize
        )));
    }
    if let (Some(lo), Some(hi)) = (options.vmin, options.vmax) {
        if lo > hi {
            return Err(Error::Config(format!("vmin ({lo}) exceeds vmax ({hi})")));
        }
    }
    Ok(())
}

/// Per-metric overrides: plot options plus the summary mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricOverrides {
    /// Summary mode for this metric.
    pub summary: Option<SummaryMode>,
    /// Plot option changes.
    #[serde(flatten)]
    pub plot: PlotOverrides,
}

/// One metric to plot for every experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetricEntryDoc")]
pub struct MetricEntry {
    /// Substring event file paths must contain.
    pub prefix: String,
    /// Scalar tag.
    pub key: String,
    /// Output file suffix.
    pub file: String,
    /// Display name; defaults to the tag.
    pub label: Option<String>,
    /// Overrides layered on `plot.yml`.
    pub overrides: MetricOverrides,
}

impl MetricEntry {
    /// Display name of the metric.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// Both accepted spellings of a metric entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetricEntryDoc {
    /// `[prefix, key, file, overrides|null]`
    Tuple(String, String, String, Option<MetricOverrides>),
    Mapping {
        #[serde(default)]
        prefix: String,
        key: String,
        file: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        summary: Option<SummaryMode>,
        #[serde(default)]
        plot: PlotOverrides,
    },
}

impl From<MetricEntryDoc> for MetricEntry {
    fn from(doc: MetricEntryDoc) -> Self {
        match doc {
            MetricEntryDoc::Tuple(prefix, key, file, overrides) => Self {
                prefix,
                key,
                file,
                label: None,
                overrides: overrides.unwrap_or_default(),
            },
            MetricEntryDoc::Mapping {
                prefix,
                key,
                file,
                label,
                summary,
                plot,
            } => Self {
                prefix,
                key,
                file,
                label,
                overrides: MetricOverrides { summary, plot },
            },
        }
    }
}

/// An experiment document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Log roots, one list per plot.
    pub paths: Vec<Vec<PathBuf>>,
    /// Plot name per entry of `paths`.
    pub plot_name: Vec<String>,
    /// Metrics plotted for every experiment.
    pub keys: Vec<MetricEntry>,
    /// Event file paths must contain one of these; empty keeps all.
    #[serde(default)]
    pub filters: Vec<String>,
}

impl ExperimentConfig {
    /// Parse and validate an experiment document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is malformed, `paths` is
    /// not a list of lists, or the lists are inconsistent.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source).map_err(experiment_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the inconsistency.
    pub fn validate(&self) -> Result<()> {
        if self.paths.len() != self.plot_name.len() {
            return Err(Error::Config(format!(
                "'paths' has {} entries but 'plot_name' has {}",
                self.paths.len(),
                self.plot_name.len()
            )));
        }
        if let Some(idx) = self.paths.iter().position(Vec::is_empty) {
            return Err(Error::Config(format!("'paths' entry {idx} lists no log roots")));
        }
        if self.keys.is_empty() {
            return Err(Error::Config("'keys' lists no metrics".to_string()));
        }
        for entry in &self.keys {
            if let Some(smooth) = entry.overrides.plot.smooth {
                if !(0.0..=1.0).contains(&smooth) {
                    return Err(Error::Config(format!(
                        "smooth for '{}' must lie in [0, 1], got {smooth}",
                        entry.key
                    )));
                }
            }
        }
        Ok(())
    }

    /// `(roots, plot name)` pairs in document order.
    pub fn experiments(&self) -> impl Iterator<Item = (&[PathBuf], &str)> {
        self.paths
            .iter()
            .map(Vec::as_slice)
            .zip(self.plot_name.iter().map(String::as_str))
    }
}

/// Name the accepted metric entry forms instead of serde's untagged enum message.
#[allow(clippy::needless_pass_by_value)]
fn experiment_error(err: serde_yaml::Error) -> Error {
    let message = err.to_string();
    if !message.contains("untagged enum") {
        return Error::Config(format!("Invalid experiment configuration: {message}"));
    }
    let at = err
        .location()
        .map(|l| format!(" at line {} column {}", l.line(), l.column()))
        .unwrap_or_default();
    Error::Config(format!(
        "Invalid entry in 'keys'{at}: expected [prefix, key, file, overrides|null] \
         or a mapping with 'key', 'file' and optional 'prefix', 'label', 'summary', 'plot'"
    ))
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {e}", path.display())))
}

/// Load `plot.yml`.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be read or is invalid.
pub fn load_plot_config(path: impl AsRef<Path>) -> Result<PlotConfig> {
    let path = path.as_ref();
    PlotConfig::from_yaml(&read_document(path)?)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// Load an experiment document.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be read or is invalid.
pub fn load_experiment(path: impl AsRef<Path>) -> Result<ExperimentConfig> {
    let path = path.as_ref();
    ExperimentConfig::from_yaml(&read_document(path)?)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// Locate an experiment document: `name` itself if it exists, otherwise
/// `name` inside `config_dir`.
#[must_use]
pub fn resolve_experiment(config_dir: &Path, name: &Path) -> PathBuf {
    if name.is_file() {
        name.to_path_buf()
    } else {
        config_dir.join(name)
    }
}
