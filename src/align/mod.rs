//! Alignment & statistics engine
//!
//! Runs of one metric rarely log at the same steps. To compare repeated
//! trials the engine
//!
//! 1. groups run names by the prefix before a separator (e.g. `/seed`),
//! 2. builds an N-point grid over the intersection of the members' step
//!    ranges `[max(min steps), min(max steps)]`,
//! 3. linearly interpolates every member onto that grid,
//! 4. reduces each grid column to `[mean, std]` or `[mean, min, max]`.
//!
//! Groups whose members never overlap are reported, never extrapolated.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use trueno_report::align::{Aggregator, Statistic};
//! use trueno_report::experiment::ScalarSeries;
//!
//! let mut runs = BTreeMap::new();
//! runs.insert("exp/seed0".to_string(), ScalarSeries::from_steps_values(&[0, 10, 20], &[1.0, 2.0, 3.0]));
//! runs.insert("exp/seed1".to_string(), ScalarSeries::from_steps_values(&[0, 5, 15, 20], &[2.0, 2.0, 4.0, 6.0]));
//!
//! let aggregation = Aggregator::new(3)
//!     .stats_key("/seed")
//!     .statistic(Statistic::Std)
//!     .aggregate(&runs)?;
//!
//! let exp = &aggregation.series["exp"];
//! assert_eq!(exp.steps(), &[0.0, 10.0, 20.0]);
//! assert_eq!(exp.mean(), &[1.5, 2.5, 4.5]);
//! # Ok::<(), trueno_report::Error>(())
//! ```

mod group;
mod interp;
mod stats;

use std::collections::BTreeMap;

use tracing::{debug, warn};

pub use group::{group_by_key, group_name};
pub use interp::{interp, interp_one, linspace};
pub use stats::{ColumnStats, Statistic};

use crate::experiment::ScalarSeries;
use crate::{Error, Result};

/// Separator between a run and its worker index in distributed runs.
pub const DEFAULT_WORKER_KEY: &str = "/rank";

/// A series with real-valued steps, sorted by step.
///
/// Input of the engine: either a raw [`ScalarSeries`] or the mean curve of
/// an earlier aggregation stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    steps: Vec<f64>,
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl Curve {
    /// Build a curve from parallel columns, stably sorted by step.
    ///
    /// Columns are truncated to the shortest length.
    #[must_use]
    pub fn new(steps: Vec<f64>, timestamps: Vec<f64>, values: Vec<f64>) -> Self {
        let len = steps.len().min(timestamps.len()).min(values.len());
        let sorted = steps[..len].windows(2).all(|w| w[0] <= w[1]);
        if sorted {
            return Self {
                steps: steps[..len].to_vec(),
                timestamps: timestamps[..len].to_vec(),
                values: values[..len].to_vec(),
            };
        }
        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by(|&a, &b| steps[a].total_cmp(&steps[b]));
        Self {
            steps: order.iter().map(|&i| steps[i]).collect(),
            timestamps: order.iter().map(|&i| timestamps[i]).collect(),
            values: order.iter().map(|&i| values[i]).collect(),
        }
    }

    /// Steps, non-decreasing.
    #[must_use]
    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    /// Wall times.
    #[must_use]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether the curve has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn step_range(&self) -> Option<(f64, f64)> {
        Some((*self.steps.first()?, *self.steps.last()?))
    }
}

impl From<&ScalarSeries> for Curve {
    #[allow(clippy::cast_precision_loss)]
    fn from(series: &ScalarSeries) -> Self {
        Self::new(
            series.steps().iter().map(|&s| s as f64).collect(),
            series.timestamps().to_vec(),
            series.values().to_vec(),
        )
    }
}

/// Spread columns of an aligned series.
#[derive(Debug, Clone, PartialEq)]
pub enum Spread {
    /// Population standard deviation per grid point.
    Std(Vec<f64>),
    /// Member extremes per grid point.
    MinMax {
        /// Smallest member value.
        min: Vec<f64>,
        /// Largest member value.
        max: Vec<f64>,
    },
}

/// A group resampled onto its common step grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    steps: Vec<f64>,
    timestamps: Vec<f64>,
    mean: Vec<f64>,
    spread: Spread,
    members: Vec<String>,
}

impl AlignedSeries {
    /// Grid steps, N points.
    #[must_use]
    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    /// Mean member wall time at every grid step.
    #[must_use]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Mean value at every grid step.
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Spread columns.
    #[must_use]
    pub const fn spread(&self) -> &Spread {
        &self.spread
    }

    /// Names of the runs merged into this series.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Statistic variant of the spread columns.
    #[must_use]
    pub const fn statistic(&self) -> Statistic {
        match self.spread {
            Spread::Std(_) => Statistic::Std,
            Spread::MinMax { .. } => Statistic::MinMax,
        }
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the grid is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Row `i` as `[mean, std]` or `[mean, min, max]`.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        let mean = *self.mean.get(i)?;
        Some(match &self.spread {
            Spread::Std(std) => vec![mean, std[i]],
            Spread::MinMax { min, max } => vec![mean, min[i], max[i]],
        })
    }

    /// Every row, i.e. the `(N, 2)` or `(N, 3)` value matrix.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }

    /// Lower and upper band edges: `mean ± std` or `[min, max]`.
    #[must_use]
    pub fn band(&self) -> (Vec<f64>, Vec<f64>) {
        match &self.spread {
            Spread::Std(std) => (
                self.mean.iter().zip(std).map(|(m, s)| m - s).collect(),
                self.mean.iter().zip(std).map(|(m, s)| m + s).collect(),
            ),
            Spread::MinMax { min, max } => (min.clone(), max.clone()),
        }
    }

    /// The mean as a curve, input for a further aggregation stage.
    #[must_use]
    pub fn mean_curve(&self) -> Curve {
        Curve::new(self.steps.clone(), self.timestamps.clone(), self.mean.clone())
    }

    /// Apply `f` to every value column (mean and spread).
    ///
    /// Used for scaling and clipping before plotting; a standard deviation
    /// is only scaled, never clipped, so callers pass the matching closure
    /// through [`AlignedSeries::map_values`] or [`AlignedSeries::scale`].
    #[must_use]
    pub fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        self.mean.iter_mut().for_each(|v| *v = f(*v));
        if let Spread::MinMax { min, max } = &mut self.spread {
            min.iter_mut().for_each(|v| *v = f(*v));
            max.iter_mut().for_each(|v| *v = f(*v));
        }
        self
    }

    /// Multiply every value column by `factor`.
    #[must_use]
    pub fn scale(mut self, factor: f64) -> Self {
        if let Spread::Std(std) = &mut self.spread {
            std.iter_mut().for_each(|v| *v *= factor.abs());
        }
        self.map_values(|v| v * factor)
    }

    /// Keep grid points whose step lies in `[start, limit)`.
    #[must_use]
    pub fn trim(mut self, start: Option<f64>, limit: Option<f64>) -> Self {
        let lo = self
            .steps
            .partition_point(|&s| start.is_some_and(|start| s < start));
        let hi = self
            .steps
            .partition_point(|&s| limit.map_or(true, |limit| s < limit))
            .max(lo);
        let cut = |v: &mut Vec<f64>| {
            v.truncate(hi);
            v.drain(..lo);
        };
        cut(&mut self.steps);
        cut(&mut self.timestamps);
        cut(&mut self.mean);
        match &mut self.spread {
            Spread::Std(std) => cut(std),
            Spread::MinMax { min, max } => {
                cut(min);
                cut(max);
            }
        }
        self
    }
}

/// Result of aggregating one metric.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Aligned statistics per group, ordered by group name.
    pub series: BTreeMap<String, AlignedSeries>,
    /// Groups that could not be aligned.
    pub degenerate: Vec<Error>,
}

/// Resample one group onto its common grid and reduce it.
///
/// # Errors
///
/// Returns `Error::EmptySeries` if a member has no samples and
/// `Error::DisjointStepRanges` if the members share no step.
pub fn align_group(
    group: &str,
    members: &[(&str, &Curve)],
    resolution: usize,
    statistic: Statistic,
) -> Result<AlignedSeries> {
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    for (run, curve) in members {
        let (first, last) = curve.step_range().ok_or_else(|| Error::EmptySeries {
            group: group.to_string(),
            run: (*run).to_string(),
        })?;
        lo = lo.max(first);
        hi = hi.min(last);
    }
    if members.is_empty() || lo > hi {
        return Err(Error::DisjointStepRanges {
            group: group.to_string(),
            lo,
            hi,
        });
    }

    let grid = linspace(lo, hi, resolution);
    let values: Vec<Vec<f64>> = members
        .iter()
        .map(|(_, c)| interp(&grid, c.steps(), c.values()))
        .collect();
    let times: Vec<Vec<f64>> = members
        .iter()
        .map(|(_, c)| interp(&grid, c.steps(), c.timestamps()))
        .collect();

    let mut mean = Vec::with_capacity(resolution);
    let mut timestamps = Vec::with_capacity(resolution);
    let mut std = Vec::new();
    let mut min = Vec::new();
    let mut max = Vec::new();
    let mut column = Vec::with_capacity(members.len());
    for i in 0..grid.len() {
        column.clear();
        column.extend(values.iter().map(|row| row[i]));
        let stats = ColumnStats::of(&column);
        mean.push(stats.mean);
        match statistic {
            Statistic::Std => std.push(stats.std),
            Statistic::MinMax => {
                min.push(stats.min);
                max.push(stats.max);
            }
        }
        column.clear();
        column.extend(times.iter().map(|row| row[i]));
        timestamps.push(ColumnStats::of(&column).mean);
    }

    let spread = match statistic {
        Statistic::Std => Spread::Std(std),
        Statistic::MinMax => Spread::MinMax { min, max },
    };
    Ok(AlignedSeries {
        steps: grid,
        timestamps,
        mean,
        spread,
        members: members.iter().map(|(run, _)| (*run).to_string()).collect(),
    })
}

/// Group curves by `group_key` and align every group.
///
/// This is the single aggregation contract of the crate: one call per
/// grouping stage. Degenerate groups are collected in
/// [`Aggregation::degenerate`] rather than failing the whole metric.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if `resolution` is zero.
pub fn compute_statistics(
    curves: &BTreeMap<String, Curve>,
    group_key: Option<&str>,
    resolution: usize,
    statistic: Statistic,
) -> Result<Aggregation> {
    if resolution == 0 {
        return Err(Error::InvalidInput(
            "resolution must be at least 1 grid point".to_string(),
        ));
    }
    let mut aggregation = Aggregation::default();
    for (group, members) in group_by_key(curves.iter().map(|(k, v)| (k.as_str(), v)), group_key) {
        match align_group(&group, &members, resolution, statistic) {
            Ok(series) => {
                debug!(group = %group, members = members.len(), "Aligned group");
                aggregation.series.insert(group, series);
            }
            Err(e) if e.is_degenerate_group() => {
                warn!(group = %group, "{e}");
                aggregation.degenerate.push(e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(aggregation)
}

/// Two-stage aggregation: workers first, then repeated trials.
///
/// Stage one averages runs that differ only by `worker_key` (distributed
/// workers of one job); stage two computes the requested statistic over
/// runs that differ only by `stats_key` (seeds). A stage without a key is
/// skipped; with no stats key every run keeps a zero spread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    resolution: usize,
    statistic: Statistic,
    worker_key: Option<String>,
    stats_key: Option<String>,
}

impl Aggregator {
    /// Aggregator producing `resolution` grid points, std spread, no keys.
    #[must_use]
    pub const fn new(resolution: usize) -> Self {
        Self {
            resolution,
            statistic: Statistic::Std,
            worker_key: None,
            stats_key: None,
        }
    }

    /// Set the spread statistic.
    #[must_use]
    pub const fn statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    /// Set the worker separator, e.g. [`DEFAULT_WORKER_KEY`].
    #[must_use]
    pub fn worker_key(mut self, key: impl Into<String>) -> Self {
        self.worker_key = Some(key.into()).filter(|k: &String| !k.is_empty());
        self
    }

    /// Set the trial separator, e.g. `/seed`.
    #[must_use]
    pub fn stats_key(mut self, key: impl Into<String>) -> Self {
        self.stats_key = Some(key.into()).filter(|k: &String| !k.is_empty());
        self
    }

    /// Grid size.
    #[must_use]
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    /// Aggregate the per-run series of one metric.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the resolution is zero.
    pub fn aggregate(&self, runs: &BTreeMap<String, ScalarSeries>) -> Result<Aggregation> {
        let mut curves: BTreeMap<String, Curve> = runs
            .iter()
            .map(|(name, series)| (name.clone(), Curve::from(series)))
            .collect();
        let mut degenerate = Vec::new();

        if let Some(worker_key) = self.worker_key.as_deref() {
            let workers =
                compute_statistics(&curves, Some(worker_key), self.resolution, Statistic::Std)?;
            degenerate.extend(workers.degenerate);
            curves = workers
                .series
                .into_iter()
                .map(|(name, series)| (name, series.mean_curve()))
                .collect();
        }

        let mut aggregation = compute_statistics(
            &curves,
            self.stats_key.as_deref(),
            self.resolution,
            self.statistic,
        )?;
        degenerate.append(&mut aggregation.degenerate);
        aggregation.degenerate = degenerate;
        Ok(aggregation)
    }
}
