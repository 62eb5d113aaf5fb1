//! Scalar data model
//!
//! Data structures for scalars read back from experiment event logs.
//!
//! ## Schema Overview
//!
//! ```text
//! RunStore (1) ──< RunLogs (N) [one per run directory]
//!                      │
//!                      └──< ScalarSeries (N) [one per tag, columnar]
//!                               │
//!                               └── ScalarRecord (N) [step, wall_time, value]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_report::experiment::{RunLogs, RunStore, ScalarRecord, ScalarSeries};
//!
//! let series: ScalarSeries = (0..10)
//!     .map(|step| ScalarRecord::new("loss", step, 1_700_000_000.0 + step as f64, 1.0 / (step as f64 + 1.0)))
//!     .collect();
//!
//! let mut run = RunLogs::new("baseline/seed0");
//! run.insert("loss", series);
//!
//! let mut store = RunStore::new();
//! store.add_run(run);
//! assert_eq!(store.series_for_tag("loss").len(), 1);
//! ```

mod run_record;
mod scalar_record;
mod series;
mod store;

pub use run_record::RunLogs;
pub use scalar_record::{utc_to_wall_time, wall_time_to_utc, ScalarRecord, ScalarRecordBuilder};
pub use series::ScalarSeries;
pub use store::RunStore;
