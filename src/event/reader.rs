//! Scalar extraction from one event file

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use prost::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::proto::{event, Event};
use super::record::RecordReader;
use crate::experiment::ScalarSeries;
use crate::{Error, Result};

/// What to do when a requested tag is absent from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnMissingKey {
    /// Warn and leave the tag out of the result
    #[default]
    Skip,
    /// Fail with `Error::MissingKey`
    Raise,
}

/// Options for reading event files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Drop samples orphaned by a restart from an earlier checkpoint.
    pub purge_orphaned: bool,
    /// Missing tag policy.
    pub on_missing_key: OnMissingKey,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            purge_orphaned: true,
            on_missing_key: OnMissingKey::Skip,
        }
    }
}

/// All scalars of one event file, decoded eagerly.
#[derive(Debug, Clone)]
pub struct EventFile {
    path: PathBuf,
    file_version: Option<String>,
    scalars: BTreeMap<String, ScalarSeries>,
    purged: usize,
}

impl EventFile {
    /// Open, read fully and close an event file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened, `Error::Corrupt`
    /// on framing errors and `Error::Decode` on invalid protobuf payloads.
    pub fn open(path: impl AsRef<Path>, options: &ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut event_file = Self {
            path: path.to_path_buf(),
            file_version: None,
            scalars: BTreeMap::new(),
            purged: 0,
        };
        // last step seen per tag, for orphan detection
        let mut last_step: HashMap<String, i64> = HashMap::new();

        let mut records = RecordReader::new(BufReader::new(file), path);
        while let Some(bytes) = records.read_record()? {
            let event = Event::decode(bytes.as_slice()).map_err(|source| Error::Decode {
                path: path.to_path_buf(),
                source,
            })?;
            match event.what {
                Some(event::What::FileVersion(version)) => event_file.file_version = Some(version),
                Some(event::What::Summary(summary)) => {
                    for value in &summary.value {
                        let Some(scalar) = value.scalar() else {
                            continue;
                        };
                        let series = event_file.scalars.entry(value.tag.clone()).or_default();
                        if options.purge_orphaned {
                            if let Some(&last) = last_step.get(&value.tag) {
                                if event.step < last {
                                    let before = series.len();
                                    series.purge_from_step(event.step);
                                    event_file.purged += before - series.len();
                                }
                            }
                        }
                        series.push(event.step, event.wall_time, scalar);
                        last_step.insert(value.tag.clone(), event.step);
                    }
                }
                None => {}
            }
        }

        if event_file.purged > 0 {
            debug!(
                path = %path.display(),
                purged = event_file.purged,
                "Purged orphaned samples after step rollback"
            );
        }
        debug!(
            path = %path.display(),
            records = records.records_read(),
            tags = event_file.scalars.len(),
            "Read event file"
        );
        Ok(event_file)
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version string of the leading record, e.g. `brain.Event:2`.
    #[must_use]
    pub fn file_version(&self) -> Option<&str> {
        self.file_version.as_deref()
    }

    /// Scalar tags present in the file, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.scalars.keys().map(String::as_str).collect()
    }

    /// Number of samples dropped by orphan purging.
    #[must_use]
    pub const fn purged(&self) -> usize {
        self.purged
    }

    /// Series of one tag.
    #[must_use]
    pub fn series(&self, tag: &str) -> Option<&ScalarSeries> {
        self.scalars.get(tag)
    }

    /// Select the requested tags, applying the missing-key policy.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingKey` for the first absent tag under
    /// `OnMissingKey::Raise`.
    pub fn select<S: AsRef<str>>(
        mut self,
        keys: &[S],
        on_missing_key: OnMissingKey,
    ) -> Result<BTreeMap<String, ScalarSeries>> {
        let mut selected = BTreeMap::new();
        for key in keys {
            let key = key.as_ref();
            if let Some(series) = self.scalars.remove(key) {
                selected.insert(key.to_string(), series);
                continue;
            }
            let available: Vec<String> = self
                .scalars
                .keys()
                .chain(selected.keys())
                .cloned()
                .collect();
            match on_missing_key {
                OnMissingKey::Skip => warn!(
                    key,
                    path = %self.path.display(),
                    available = %available.join(", "),
                    "Scalar not found in event file, skipping"
                ),
                OnMissingKey::Raise => {
                    return Err(Error::MissingKey {
                        key: key.to_string(),
                        path: self.path,
                        available,
                    })
                }
            }
        }
        Ok(selected)
    }
}

/// Read the requested scalar tags of one event file.
///
/// Each present tag maps to its series in log order. Absent tags are
/// skipped with a warning or raised, depending on `options`.
///
/// # Errors
///
/// See [`EventFile::open`] and [`EventFile::select`].
pub fn read_scalars<S: AsRef<str>>(
    path: impl AsRef<Path>,
    keys: &[S],
    options: &ReaderOptions,
) -> Result<BTreeMap<String, ScalarSeries>> {
    EventFile::open(path, options)?.select(keys, options.on_missing_key)
}

/// List the scalar tags of one event file.
///
/// # Errors
///
/// See [`EventFile::open`].
pub fn available_tags(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let file = EventFile::open(path, &ReaderOptions::default())?;
    Ok(file.tags().into_iter().map(str::to_string).collect())
}
