//! Scalar Series - columnar samples of one tag from one run

use serde::{Deserialize, Serialize};

use super::ScalarRecord;

/// Columnar scalar series: three equal-length columns in log order.
///
/// Steps are non-decreasing as recorded by a well-behaved writer, but
/// neither ordering nor uniqueness is enforced here; consumers that need
/// a range use [`ScalarSeries::step_range`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScalarSeries {
    steps: Vec<i64>,
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl ScalarSeries {
    /// Create an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from parallel columns.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the columns differ in length.
    pub fn from_columns(
        steps: Vec<i64>,
        timestamps: Vec<f64>,
        values: Vec<f64>,
    ) -> crate::Result<Self> {
        if steps.len() != timestamps.len() || steps.len() != values.len() {
            return Err(crate::Error::InvalidInput(format!(
                "Series columns differ in length: steps={}, timestamps={}, values={}",
                steps.len(),
                timestamps.len(),
                values.len()
            )));
        }
        Ok(Self {
            steps,
            timestamps,
            values,
        })
    }

    /// Build a series from `(step, value)` pairs with zero wall times.
    ///
    /// Handy for synthetic data where only the curve shape matters.
    #[must_use]
    pub fn from_steps_values(steps: &[i64], values: &[f64]) -> Self {
        let len = steps.len().min(values.len());
        Self {
            steps: steps[..len].to_vec(),
            timestamps: vec![0.0; len],
            values: values[..len].to_vec(),
        }
    }

    /// Append one sample.
    pub fn push(&mut self, step: i64, wall_time: f64, value: f64) {
        self.steps.push(step);
        self.timestamps.push(wall_time);
        self.values.push(value);
    }

    /// Append one record, ignoring its tag.
    pub fn push_record(&mut self, record: &ScalarRecord) {
        self.push(record.step(), record.wall_time(), record.value());
    }

    /// Append every sample of `other`.
    pub fn extend(&mut self, other: &Self) {
        self.steps.extend_from_slice(&other.steps);
        self.timestamps.extend_from_slice(&other.timestamps);
        self.values.extend_from_slice(&other.values);
    }

    /// Drop every sample whose step is `>= step`.
    ///
    /// Used when a writer restarted from an earlier checkpoint and the
    /// samples logged past that point are orphaned.
    pub fn purge_from_step(&mut self, step: i64) {
        let mask: Vec<bool> = self.steps.iter().map(|&s| s < step).collect();
        retain_mask(&mut self.steps, &mask);
        retain_mask(&mut self.timestamps, &mask);
        retain_mask(&mut self.values, &mask);
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the series has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step column.
    #[must_use]
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Wall-time column (seconds since the Unix epoch).
    #[must_use]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Value column.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last logged step, if any.
    #[must_use]
    pub fn last_step(&self) -> Option<i64> {
        self.steps.last().copied()
    }

    /// `(min, max)` over the step column, `None` for an empty series.
    #[must_use]
    pub fn step_range(&self) -> Option<(i64, i64)> {
        let min = self.steps.iter().copied().min()?;
        let max = self.steps.iter().copied().max()?;
        Some((min, max))
    }

    /// Materialize the samples as records under the given tag.
    #[must_use]
    pub fn records(&self, tag: &str) -> Vec<ScalarRecord> {
        self.steps
            .iter()
            .zip(&self.timestamps)
            .zip(&self.values)
            .map(|((&step, &wall_time), &value)| ScalarRecord::new(tag, step, wall_time, value))
            .collect()
    }
}

fn retain_mask<T>(column: &mut Vec<T>, mask: &[bool]) {
    let mut flags = mask.iter();
    column.retain(|_| flags.next().copied().unwrap_or(false));
}

impl FromIterator<ScalarRecord> for ScalarSeries {
    fn from_iter<I: IntoIterator<Item = ScalarRecord>>(iter: I) -> Self {
        let mut series = Self::new();
        for record in iter {
            series.push_record(&record);
        }
        series
    }
}
