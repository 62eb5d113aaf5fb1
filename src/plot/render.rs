//! PNG rendering of aligned series

use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use super::options::{LegendPosition, PlotOptions, XAxis};
use super::palette::Palette;
use super::smoothing::smooth;
use crate::align::{AlignedSeries, Spread};
use crate::{Error, Result};

/// Smallest value shown on a logarithmic axis.
pub const LOG_FLOOR: f64 = 1e-6;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// One labeled line with its shaded band, in plot coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    /// Legend entry.
    pub label: String,
    /// X coordinates.
    pub x: Vec<f64>,
    /// Center line.
    pub mean: Vec<f64>,
    /// Lower band edge.
    pub lower: Vec<f64>,
    /// Upper band edge.
    pub upper: Vec<f64>,
}

impl PlotLine {
    fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x
            .iter()
            .copied()
            .zip(self.mean.iter().copied())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    }

    fn band(&self) -> Vec<(f64, f64)> {
        let upper = self.x.iter().copied().zip(self.upper.iter().copied());
        let lower = self.x.iter().copied().zip(self.lower.iter().copied()).rev();
        upper
            .chain(lower)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.points().next().is_none()
    }
}

/// Turn aligned series into drawable lines.
///
/// Per series: trim to `[start, limit)`, scale by `yscale`, clip to
/// `[vmin, vmax]`, smooth every statistic column, then derive the band and
/// map steps or wall time onto the x axis. Series left without points are
/// dropped.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for a smoothing weight outside `[0, 1]`.
pub fn prepare_lines(
    series: &BTreeMap<String, AlignedSeries>,
    options: &PlotOptions,
) -> Result<Vec<PlotLine>> {
    let mut lines = Vec::with_capacity(series.len());
    for (label, aligned) in series {
        // elapsed time counts from the first grid point, not the trimmed one
        let origin = aligned.timestamps().first().copied().unwrap_or_default();
        let aligned = aligned
            .clone()
            .trim(options.start, options.limit)
            .scale(options.yscale)
            .map_values(|v| options.clip(v));
        if aligned.is_empty() {
            debug!(label = %label, "No grid points left after trimming");
            continue;
        }

        let mean = smooth(aligned.mean(), options.smooth)?;
        let (lower, upper) = match aligned.spread() {
            Spread::Std(std) => {
                let std = smooth(std, options.smooth)?;
                (
                    mean.iter().zip(&std).map(|(m, s)| m - s).collect(),
                    mean.iter().zip(&std).map(|(m, s)| m + s).collect(),
                )
            }
            Spread::MinMax { min, max } => {
                (smooth(min, options.smooth)?, smooth(max, options.smooth)?)
            }
        };

        let x = match options.xaxis {
            XAxis::Steps => aligned.steps().to_vec(),
            XAxis::Time => aligned
                .timestamps()
                .iter()
                .map(|t| (t - origin) / SECONDS_PER_HOUR)
                .collect(),
        };

        let mut line = PlotLine {
            label: label.clone(),
            x,
            mean,
            lower,
            upper,
        };
        if options.logx {
            line.x.iter_mut().for_each(|v| *v = v.max(LOG_FLOOR));
        }
        if options.logy {
            for column in [&mut line.mean, &mut line.lower, &mut line.upper] {
                column.iter_mut().for_each(|v| *v = v.max(LOG_FLOOR));
            }
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Axis bounds covering every point and band edge.
///
/// A flat range is widened so the chart has a non-empty extent; log axes
/// never go below [`LOG_FLOOR`].
#[must_use]
pub fn data_bounds(lines: &[PlotLine], logx: bool, logy: bool) -> ((f64, f64), (f64, f64)) {
    let finite = |v: &&f64| v.is_finite();
    let xs = lines.iter().flat_map(|l| l.x.iter()).filter(finite);
    let ys = lines
        .iter()
        .flat_map(|l| l.lower.iter().chain(&l.upper).chain(&l.mean))
        .filter(finite);
    (pad_range(min_max(xs), logx, 0.0), pad_range(min_max(ys), logy, 0.05))
}

fn min_max<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

fn pad_range((lo, hi): (f64, f64), log: bool, margin: f64) -> (f64, f64) {
    let (lo, hi) = if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    };
    if log {
        let lo = lo.max(LOG_FLOOR);
        let hi = hi.max(lo * 10.0);
        return (lo, hi);
    }
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * margin;
    (lo - pad, hi + pad)
}

const fn label_position(legend: LegendPosition) -> Option<SeriesLabelPosition> {
    match legend {
        LegendPosition::UpperLeft => Some(SeriesLabelPosition::UpperLeft),
        LegendPosition::UpperRight => Some(SeriesLabelPosition::UpperRight),
        LegendPosition::LowerLeft => Some(SeriesLabelPosition::LowerLeft),
        LegendPosition::LowerRight => Some(SeriesLabelPosition::LowerRight),
        LegendPosition::Hidden => None,
    }
}

#[allow(clippy::needless_pass_by_value)]
fn plot_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Plot(err.to_string())
}

macro_rules! draw_chart {
    ($root:expr, $x_spec:expr, $y_spec:expr, $lines:expr, $options:expr, $palette:expr, $labels:expr) => {{
        let mut builder = ChartBuilder::on($root);
        builder
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70);
        if let Some(title) = $options.title.as_deref() {
            builder.caption(title, ("sans-serif", 28));
        }
        let mut chart = builder
            .build_cartesian_2d($x_spec, $y_spec)
            .map_err(plot_error)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc($labels.0).y_desc($labels.1);
        if !$options.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(plot_error)?;

        for (index, line) in $lines.iter().filter(|l| !l.is_empty()).enumerate() {
            let color = $palette.color(index);
            chart
                .draw_series(std::iter::once(Polygon::new(
                    line.band(),
                    color.mix(0.2).filled(),
                )))
                .map_err(plot_error)?;
            chart
                .draw_series(LineSeries::new(line.points(), color.stroke_width(2)))
                .map_err(plot_error)?
                .label(line.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        if let Some(position) = label_position($options.legend) {
            chart
                .configure_series_labels()
                .position(position)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(plot_error)?;
        }
    }};
}

/// Draw `lines` onto one chart and save it as a PNG at `output`.
///
/// `ylabel` is used when the options carry none.
///
/// # Errors
///
/// Returns `Error::Plot` if there is nothing to draw or the drawing backend
/// fails.
pub fn render(
    lines: &[PlotLine],
    options: &PlotOptions,
    palette: &Palette,
    ylabel: &str,
    output: &Path,
) -> Result<()> {
    if lines.iter().all(PlotLine::is_empty) {
        return Err(Error::Plot(format!(
            "No data points to draw for {}",
            output.display()
        )));
    }

    let ((x_lo, x_hi), (y_lo, y_hi)) = data_bounds(lines, options.logx, options.logy);
    let labels = (
        options
            .xlabel
            .clone()
            .unwrap_or_else(|| options.xaxis.default_label().to_string()),
        options.ylabel.clone().unwrap_or_else(|| ylabel.to_string()),
    );

    let root = BitMapBackend::new(output, options.figsize).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    match (options.logx, options.logy) {
        (false, false) => draw_chart!(&root, x_lo..x_hi, y_lo..y_hi, lines, options, palette, labels),
        (true, false) => draw_chart!(
            &root,
            (x_lo..x_hi).log_scale(),
            y_lo..y_hi,
            lines,
            options,
            palette,
            labels
        ),
        (false, true) => draw_chart!(
            &root,
            x_lo..x_hi,
            (y_lo..y_hi).log_scale(),
            lines,
            options,
            palette,
            labels
        ),
        (true, true) => draw_chart!(
            &root,
            (x_lo..x_hi).log_scale(),
            (y_lo..y_hi).log_scale(),
            lines,
            options,
            palette,
            labels
        ),
    }
    root.present().map_err(plot_error)?;
    debug!(path = %output.display(), lines = lines.len(), "Saved plot");
    Ok(())
}
