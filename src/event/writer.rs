//! Scalar event file writer

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use prost::Message;

use super::proto::{
    event, summary, summary_metadata, Event, Summary, SummaryMetadata, TensorProto, SCALARS_PLUGIN,
};
use super::record::write_record;
use crate::experiment::utc_to_wall_time;
use crate::Result;

/// Version string written as the first record of every file.
pub const FILE_VERSION: &str = "brain.Event:2";

/// Writes scalar summaries to a TensorBoard-readable event file.
///
/// ```rust,no_run
/// use trueno_report::event::EventWriter;
///
/// let mut writer = EventWriter::create("runs/baseline/seed0")?;
/// for step in 0..100 {
///     writer.add_scalar("train/loss", step, 1.0 / (step as f64 + 1.0))?;
/// }
/// writer.flush()?;
/// # Ok::<(), trueno_report::Error>(())
/// ```
pub struct EventWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl EventWriter {
    /// Create `dir` if needed and open a new
    /// `events.out.tfevents.<epoch>.<host>` file inside it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the directory or file cannot be created.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let name = format!("events.out.tfevents.{}.{host}", Utc::now().timestamp());
        Self::create_file(dir.as_ref().join(name))
    }

    /// Open a new event file at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be created.
    pub fn create_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = Self {
            out: BufWriter::new(File::create(&path)?),
            path,
        };
        writer.write_event(&Event {
            wall_time: utc_to_wall_time(Utc::now()),
            step: 0,
            what: Some(event::What::FileVersion(FILE_VERSION.to_string())),
        })?;
        Ok(writer)
    }

    /// Path of the file being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log a scalar stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` on write failure.
    pub fn add_scalar(&mut self, tag: &str, step: i64, value: f64) -> Result<()> {
        self.add_scalar_at(tag, step, utc_to_wall_time(Utc::now()), value)
    }

    /// Log a TF1 style `simple_value` scalar with an explicit wall time.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` on write failure.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_scalar_at(&mut self, tag: &str, step: i64, wall_time: f64, value: f64) -> Result<()> {
        let value = summary::Value {
            tag: tag.to_string(),
            kind: Some(summary::Kind::SimpleValue(value as f32)),
            ..summary::Value::default()
        };
        self.write_summary(step, wall_time, value)
    }

    /// Log a TF2 style scalar tensor tagged with the `scalars` plugin.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` on write failure.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_tensor_scalar_at(
        &mut self,
        tag: &str,
        step: i64,
        wall_time: f64,
        value: f64,
    ) -> Result<()> {
        let value = summary::Value {
            tag: tag.to_string(),
            metadata: Some(SummaryMetadata {
                plugin_data: Some(summary_metadata::PluginData {
                    plugin_name: SCALARS_PLUGIN.to_string(),
                    content: Vec::new(),
                }),
                ..SummaryMetadata::default()
            }),
            kind: Some(summary::Kind::Tensor(TensorProto::scalar_f32(value as f32))),
            ..summary::Value::default()
        };
        self.write_summary(step, wall_time, value)
    }

    /// Flush buffered records to disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` on write failure.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn write_summary(&mut self, step: i64, wall_time: f64, value: summary::Value) -> Result<()> {
        self.write_event(&Event {
            wall_time,
            step,
            what: Some(event::What::Summary(Summary { value: vec![value] })),
        })
    }

    fn write_event(&mut self, event: &Event) -> Result<()> {
        write_record(&mut self.out, &event.encode_to_vec())?;
        Ok(())
    }
}
