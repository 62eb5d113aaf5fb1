//! Event-log reading and writing
//!
//! Event files are sequences of TFRecord-framed protobuf `Event`
//! messages. Only scalar summaries are decoded: TF1 `simple_value`s and
//! TF2 rank-0 tensors owned by the `scalars` plugin.
//!
//! ```rust,no_run
//! use trueno_report::event::{read_scalars, ReaderOptions};
//!
//! let series = read_scalars(
//!     "runs/baseline/seed0/events.out.tfevents.1700000000.host",
//!     &["train/loss", "eval/success"],
//!     &ReaderOptions::default(),
//! )?;
//! for (tag, s) in &series {
//!     println!("{tag}: {} samples", s.len());
//! }
//! # Ok::<(), trueno_report::Error>(())
//! ```

pub mod proto;
pub mod record;
mod reader;
mod writer;

pub use reader::{available_tags, read_scalars, EventFile, OnMissingKey, ReaderOptions};
pub use writer::{EventWriter, FILE_VERSION};
