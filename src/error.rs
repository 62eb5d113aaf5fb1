//! Error types for trueno-report
//!
//! Every variant names the file, tag or group it concerns so a failed
//! report can be fixed without re-running under a debugger.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-report error types
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration document is malformed or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument passed to an API
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested scalar tag is not present in an event file
    #[error("Scalar '{key}' not found in {}\nAvailable scalars: {}", .path.display(), .available.join(", "))]
    MissingKey {
        /// Requested tag
        key: String,
        /// Event file that was searched
        path: PathBuf,
        /// Scalar tags the file does contain
        available: Vec<String>,
    },

    /// Event file framing is broken (bad length or checksum)
    #[error("Corrupt event file {}: {reason}", .path.display())]
    Corrupt {
        /// Event file
        path: PathBuf,
        /// What failed
        reason: String,
    },

    /// Event payload is not a valid protobuf `Event`
    #[error("Failed to decode event in {}: {source}", .path.display())]
    Decode {
        /// Event file
        path: PathBuf,
        /// Underlying protobuf error
        #[source]
        source: prost::DecodeError,
    },

    /// Group members share no common step range
    #[error("Group '{group}' has disjoint step ranges (lo={lo} > hi={hi})\nMembers never overlap; nothing to align")]
    DisjointStepRanges {
        /// Group name
        group: String,
        /// Largest first step among members
        lo: f64,
        /// Smallest last step among members
        hi: f64,
    },

    /// A group member has no samples
    #[error("Group '{group}' contains run '{run}' with no samples")]
    EmptySeries {
        /// Group name
        group: String,
        /// Run with the empty series
        run: String,
    },

    /// Rendering backend failure
    #[error("Plot error: {0}")]
    Plot(String),

    /// Statistics export error (Parquet/Arrow)
    #[error("Export error: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error only invalidates one group of an aggregation.
    ///
    /// Degenerate groups are reported and skipped; everything else is fatal
    /// for the file or configuration it came from.
    #[must_use]
    pub const fn is_degenerate_group(&self) -> bool {
        matches!(self, Self::DisjointStepRanges { .. } | Self::EmptySeries { .. })
    }
}
