//! Plot renderer
//!
//! Draws aligned series as one line per group with a shaded spread band
//! (`mean ± std` or `[min, max]`) on a shared axis and writes a PNG.

mod options;
mod palette;
mod render;
mod smoothing;

use std::collections::BTreeMap;
use std::path::Path;

pub use options::{LegendPosition, PlotOptions, PlotOverrides, XAxis};
pub use palette::{Palette, DEFAULT_COLORS};
pub use render::{data_bounds, prepare_lines, render, PlotLine, LOG_FLOOR};
pub use smoothing::smooth;

use crate::align::AlignedSeries;
use crate::Result;

/// Prepare and render `series` in one call.
///
/// # Errors
///
/// See [`prepare_lines`] and [`render`].
pub fn plot_series(
    series: &BTreeMap<String, AlignedSeries>,
    options: &PlotOptions,
    palette: &Palette,
    ylabel: &str,
    output: &Path,
) -> Result<()> {
    let lines = prepare_lines(series, options)?;
    render(&lines, options, palette, ylabel, output)
}
