//! Cross-run statistics per grid point

use serde::{Deserialize, Serialize};

/// Spread statistic reported next to the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Statistic {
    /// `[mean, std]` with population standard deviation
    #[default]
    Std,
    /// `[mean, min, max]`
    MinMax,
}

impl Statistic {
    /// Number of columns per row, mean included.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Std => 2,
            Self::MinMax => 3,
        }
    }
}

/// Statistics of one grid column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest member value.
    pub min: f64,
    /// Largest member value.
    pub max: f64,
}

impl ColumnStats {
    /// Compute statistics of `values`.
    ///
    /// Values are sorted before summation so the result does not depend on
    /// member order. An empty column yields `NaN` everywhere.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}
