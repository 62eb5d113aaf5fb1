//! Run Store - in-memory collection of runs for one report pass

use std::collections::BTreeMap;

use super::{RunLogs, ScalarSeries};

/// In-memory store of runs read during one report pass.
///
/// ## Design
///
/// Runs are kept in a `BTreeMap` keyed by run name so that every
/// downstream iteration (grouping, plotting order, summaries) is
/// deterministic. Adding a run under an existing name merges the two.
#[derive(Debug, Default)]
pub struct RunStore {
    runs: BTreeMap<String, RunLogs>,
}

impl RunStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Add a run, merging it into an existing run of the same name.
    pub fn add_run(&mut self, run: RunLogs) {
        match self.runs.get_mut(run.name()) {
            Some(existing) => existing.merge(run),
            None => {
                self.runs.insert(run.name().to_string(), run);
            }
        }
    }

    /// Get a run by name.
    #[must_use]
    pub fn get_run(&self, name: &str) -> Option<&RunLogs> {
        self.runs.get(name)
    }

    /// Iterate over runs in name order.
    pub fn runs(&self) -> impl Iterator<Item = &RunLogs> {
        self.runs.values()
    }

    /// Collect the series of one tag across runs, keyed by run name.
    ///
    /// Runs that did not log the tag are absent from the result.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use trueno_report::experiment::{RunLogs, RunStore, ScalarSeries};
    ///
    /// let mut store = RunStore::new();
    /// let mut a = RunLogs::new("exp/seed0");
    /// a.insert("loss", ScalarSeries::from_steps_values(&[0, 1], &[1.0, 0.5]));
    /// store.add_run(a);
    /// store.add_run(RunLogs::new("exp/seed1"));
    ///
    /// let loss = store.series_for_tag("loss");
    /// assert_eq!(loss.len(), 1);
    /// assert!(loss.contains_key("exp/seed0"));
    /// ```
    #[must_use]
    pub fn series_for_tag(&self, tag: &str) -> BTreeMap<String, ScalarSeries> {
        self.runs
            .values()
            .filter_map(|run| {
                run.series(tag)
                    .map(|series| (run.name().to_string(), series.clone()))
            })
            .collect()
    }
}
