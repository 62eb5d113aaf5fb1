//! # trueno-report: Aggregate TensorBoard scalars across repeated runs
//!
//! Reads scalar summaries from TensorBoard event files, groups runs that
//! are repeated trials of one configuration, resamples every group onto a
//! common step grid and reduces it to mean plus spread. The result is
//! printed as a console summary, drawn as PNG plots and optionally
//! exported as Parquet.
//!
//! ## Pipeline
//!
//! ```text
//! discovery ──> event reader ──> RunStore ──> align (workers, then seeds)
//!                                                 │
//!                                   summary <─────┼─────> plot (PNG)
//!                                                 └─────> export (Parquet)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trueno_report::align::{Aggregator, Statistic};
//! use trueno_report::discovery::{discover, load_runs, FileFilter};
//! use trueno_report::event::ReaderOptions;
//!
//! let files = discover(&["logs/sweep_lr"], &FileFilter::default())?;
//! let store = load_runs(&files, &["eval/success"], &ReaderOptions::default())?;
//!
//! let aggregation = Aggregator::new(100)
//!     .stats_key("/seed")
//!     .statistic(Statistic::MinMax)
//!     .aggregate(&store.series_for_tag("eval/success"))?;
//!
//! for (group, series) in &aggregation.series {
//!     println!("{group}: final mean {:?}", series.mean().last());
//! }
//! # Ok::<(), trueno_report::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod align;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod event;
pub mod experiment;
pub mod export;
pub mod plot;
pub mod report;

pub use error::{Error, Result};
