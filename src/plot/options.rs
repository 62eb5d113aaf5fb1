//! Plot options and per-metric overrides

use serde::{Deserialize, Serialize};

/// Quantity on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum XAxis {
    /// Training steps of the aligned grid.
    #[default]
    Steps,
    /// Hours of wall time since the first grid point.
    Time,
}

impl XAxis {
    /// Axis description used when no label is configured.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Time => "hours",
        }
    }
}

/// Where the legend box goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LegendPosition {
    /// Top left corner.
    UpperLeft,
    /// Top right corner.
    #[default]
    UpperRight,
    /// Bottom left corner.
    LowerLeft,
    /// Bottom right corner.
    LowerRight,
    /// No legend.
    Hidden,
}

/// Everything that controls how one metric is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Caption above the chart.
    pub title: Option<String>,
    /// X axis description; defaults to the x quantity.
    pub xlabel: Option<String>,
    /// Y axis description; defaults to the metric tag.
    pub ylabel: Option<String>,
    /// Image size in pixels, `[width, height]`.
    pub figsize: (u32, u32),
    /// Steps or wall time on the x axis.
    pub xaxis: XAxis,
    /// Factor applied to every value before plotting.
    pub yscale: f64,
    /// Lower clipping bound for values.
    pub vmin: Option<f64>,
    /// Upper clipping bound for values.
    pub vmax: Option<f64>,
    /// EMA weight in `[0, 1]`; 0 disables smoothing.
    pub smooth: f64,
    /// Drop grid points before this step.
    pub start: Option<f64>,
    /// Drop grid points at or after this step.
    pub limit: Option<f64>,
    /// Logarithmic x axis.
    pub logx: bool,
    /// Logarithmic y axis.
    pub logy: bool,
    /// Draw the background mesh.
    pub grid: bool,
    /// Legend placement.
    pub legend: LegendPosition,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: None,
            xlabel: None,
            ylabel: None,
            figsize: (1200, 900),
            xaxis: XAxis::Steps,
            yscale: 1.0,
            vmin: None,
            vmax: None,
            smooth: 0.0,
            start: None,
            limit: None,
            logx: false,
            logy: false,
            grid: true,
            legend: LegendPosition::UpperRight,
        }
    }
}

/// Sparse per-metric changes on top of [`PlotOptions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOverrides {
    /// See [`PlotOptions::title`].
    pub title: Option<String>,
    /// See [`PlotOptions::xlabel`].
    pub xlabel: Option<String>,
    /// See [`PlotOptions::ylabel`].
    pub ylabel: Option<String>,
    /// See [`PlotOptions::figsize`].
    pub figsize: Option<(u32, u32)>,
    /// See [`PlotOptions::xaxis`].
    pub xaxis: Option<XAxis>,
    /// See [`PlotOptions::yscale`].
    pub yscale: Option<f64>,
    /// See [`PlotOptions::vmin`].
    pub vmin: Option<f64>,
    /// See [`PlotOptions::vmax`].
    pub vmax: Option<f64>,
    /// See [`PlotOptions::smooth`].
    pub smooth: Option<f64>,
    /// See [`PlotOptions::start`].
    pub start: Option<f64>,
    /// See [`PlotOptions::limit`].
    pub limit: Option<f64>,
    /// See [`PlotOptions::logx`].
    pub logx: Option<bool>,
    /// See [`PlotOptions::logy`].
    pub logy: Option<bool>,
    /// See [`PlotOptions::grid`].
    pub grid: Option<bool>,
    /// See [`PlotOptions::legend`].
    pub legend: Option<LegendPosition>,
}

impl PlotOptions {
    /// Copy of `self` with every field set in `overrides` replaced.
    #[must_use]
    pub fn merged(&self, overrides: &PlotOverrides) -> Self {
        let o = overrides.clone();
        Self {
            title: o.title.or_else(|| self.title.clone()),
            xlabel: o.xlabel.or_else(|| self.xlabel.clone()),
            ylabel: o.ylabel.or_else(|| self.ylabel.clone()),
            figsize: o.figsize.unwrap_or(self.figsize),
            xaxis: o.xaxis.unwrap_or(self.xaxis),
            yscale: o.yscale.unwrap_or(self.yscale),
            vmin: o.vmin.or(self.vmin),
            vmax: o.vmax.or(self.vmax),
            smooth: o.smooth.unwrap_or(self.smooth),
            start: o.start.or(self.start),
            limit: o.limit.or(self.limit),
            logx: o.logx.unwrap_or(self.logx),
            logy: o.logy.unwrap_or(self.logy),
            grid: o.grid.unwrap_or(self.grid),
            legend: o.legend.unwrap_or(self.legend),
        }
    }

    /// Clamp a value to `[vmin, vmax]` where set.
    #[must_use]
    pub fn clip(&self, value: f64) -> f64 {
        let value = self.vmin.map_or(value, |lo| value.max(lo));
        self.vmax.map_or(value, |hi| value.min(hi))
    }
}
