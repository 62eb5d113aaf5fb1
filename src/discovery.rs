//! Event file discovery and run naming
//!
//! Walks log roots for `*tfevents*` files, filters them by substrings of
//! their path and names each file's run after its location:
//!
//! ```text
//! root:  /data/logs/sweep_lr
//! file:  /data/logs/sweep_lr/lr0.1/seed2/events.out.tfevents.1700000000.host
//! run:   sweep_lr/lr0.1/seed2
//! ```
//!
//! A file sitting directly in the root is named after the root alone.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::event::{read_scalars, ReaderOptions};
use crate::experiment::{RunLogs, RunStore};
use crate::{Error, Result};

/// Substring every event file name contains.
pub const EVENT_FILE_MARKER: &str = "tfevents";

/// Which event files to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Substring the path must contain; empty keeps everything.
    pub prefix: String,
    /// The path must contain at least one of these; empty keeps everything.
    pub include: Vec<String>,
}

impl FileFilter {
    /// Filter with a required prefix substring and inclusion substrings.
    #[must_use]
    pub fn new(prefix: impl Into<String>, include: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            include,
        }
    }

    /// Whether `path` passes the filter.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let has_prefix = path.contains(&self.prefix);
        let included = self.include.is_empty() || self.include.iter().any(|f| path.contains(f));
        has_prefix && included
    }
}

/// One discovered event file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFileEntry {
    /// Path of the event file.
    pub path: PathBuf,
    /// Root directory it was found under.
    pub root: PathBuf,
    /// Run name derived from `root` and `path`.
    pub run_name: String,
}

/// Find event files under every root, filtered and sorted by path.
///
/// # Errors
///
/// Returns `Error::Config` if a root does not exist and `Error::Io` if a
/// directory cannot be read.
pub fn discover<P: AsRef<Path>>(roots: &[P], filter: &FileFilter) -> Result<Vec<EventFileEntry>> {
    let mut entries = Vec::new();
    for root in roots {
        let root = root.as_ref();
        if !root.exists() {
            return Err(Error::Config(format!(
                "Log root does not exist: {}",
                root.display()
            )));
        }
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file()
                || !entry.file_name().to_string_lossy().contains(EVENT_FILE_MARKER)
            {
                continue;
            }
            let path = entry.into_path();
            if !filter.matches(&path.to_string_lossy()) {
                continue;
            }
            entries.push(EventFileEntry {
                run_name: run_name(root, &path),
                root: root.to_path_buf(),
                path,
            });
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(files = entries.len(), roots = roots.len(), "Discovered event files");
    Ok(entries)
}

/// `<root name>/<parent of file relative to root>`, or the root name alone
/// when the file sits directly in the root.
#[must_use]
pub fn run_name(root: &Path, file: &Path) -> String {
    let root_name = root_name(root);
    let relative: Vec<String> = file
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    if relative.is_empty() {
        root_name
    } else {
        format!("{root_name}/{}", relative.join("/"))
    }
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| root.display().to_string())
}

/// Read the requested tags of every discovered file into a [`RunStore`].
///
/// Files of the same run are merged in path order. Files that contain none
/// of the requested tags contribute nothing.
///
/// # Errors
///
/// Propagates reader errors; see [`crate::event::read_scalars`].
pub fn load_runs<S: AsRef<str>>(
    entries: &[EventFileEntry],
    keys: &[S],
    options: &ReaderOptions,
) -> Result<RunStore> {
    let mut store = RunStore::new();
    for entry in entries {
        let scalars = read_scalars(&entry.path, keys, options)?;
        if scalars.is_empty() {
            debug!(path = %entry.path.display(), "No requested scalars in file");
            continue;
        }
        let mut run = RunLogs::new(entry.run_name.clone());
        for (tag, series) in scalars {
            run.insert(tag, series);
        }
        store.add_run(run);
    }
    info!(runs = store.run_count(), files = entries.len(), "Loaded runs");
    Ok(store)
}
