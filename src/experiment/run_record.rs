//! Run Logs - scalar series read from one run directory

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ScalarSeries;

/// Scalar series of one run, keyed by tag.
///
/// A run is identified by the name derived from its location on disk
/// (see [`crate::discovery`]). Several event files can belong to one run
/// when a job was restarted; their series are merged with [`RunLogs::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunLogs {
    name: String,
    series: BTreeMap<String, ScalarSeries>,
}

impl RunLogs {
    /// Create an empty run.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: BTreeMap::new(),
        }
    }

    /// Run name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert (or replace) the series of a tag.
    pub fn insert(&mut self, tag: impl Into<String>, series: ScalarSeries) {
        self.series.insert(tag.into(), series);
    }

    /// Series of a tag, if the run logged it.
    #[must_use]
    pub fn series(&self, tag: &str) -> Option<&ScalarSeries> {
        self.series.get(tag)
    }

    /// Whether the run logged the tag.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.series.contains_key(tag)
    }

    /// Tags present in this run, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Whether no tag was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Append every series of `other` to this run, tag by tag.
    pub fn merge(&mut self, other: Self) {
        for (tag, series) in other.series {
            self.series
                .entry(tag)
                .and_modify(|existing| existing.extend(&series))
                .or_insert(series);
        }
    }
}
