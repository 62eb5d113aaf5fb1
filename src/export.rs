//! Statistics export (Arrow/Parquet)
//!
//! Aggregated series are written as one flat table, one row per grid point:
//!
//! | column      | type    | nullable |
//! |-------------|---------|----------|
//! | `group`     | Utf8    | no       |
//! | `step`      | Float64 | no       |
//! | `timestamp` | Float64 | no       |
//! | `mean`      | Float64 | no       |
//! | `std`       | Float64 | yes      |
//! | `min`       | Float64 | yes      |
//! | `max`       | Float64 | yes      |
//!
//! `std` is set for `Statistic::Std` series, `min`/`max` for
//! `Statistic::MinMax` ones.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tracing::debug;

use crate::align::{AlignedSeries, Spread};
use crate::{Error, Result};

/// Schema of exported statistics.
#[must_use]
pub fn statistics_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("group", DataType::Utf8, false),
        Field::new("step", DataType::Float64, false),
        Field::new("timestamp", DataType::Float64, false),
        Field::new("mean", DataType::Float64, false),
        Field::new("std", DataType::Float64, true),
        Field::new("min", DataType::Float64, true),
        Field::new("max", DataType::Float64, true),
    ]))
}

/// Flatten aligned series into one record batch, groups in name order.
///
/// # Errors
///
/// Returns `Error::Arrow` if the batch cannot be assembled.
pub fn statistics_batch(series: &BTreeMap<String, AlignedSeries>) -> Result<RecordBatch> {
    let rows: usize = series.values().map(AlignedSeries::len).sum();
    let mut group = Vec::with_capacity(rows);
    let mut step = Vec::with_capacity(rows);
    let mut timestamp = Vec::with_capacity(rows);
    let mut mean = Vec::with_capacity(rows);
    let mut std_dev: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut min: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut max: Vec<Option<f64>> = Vec::with_capacity(rows);

    for (name, aligned) in series {
        let n = aligned.len();
        group.extend(std::iter::repeat(name.as_str()).take(n));
        step.extend_from_slice(aligned.steps());
        timestamp.extend_from_slice(aligned.timestamps());
        mean.extend_from_slice(aligned.mean());
        match aligned.spread() {
            Spread::Std(values) => {
                std_dev.extend(values.iter().copied().map(Some));
                min.extend(std::iter::repeat(None).take(n));
                max.extend(std::iter::repeat(None).take(n));
            }
            Spread::MinMax { min: lo, max: hi } => {
                std_dev.extend(std::iter::repeat(None).take(n));
                min.extend(lo.iter().copied().map(Some));
                max.extend(hi.iter().copied().map(Some));
            }
        }
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(group)),
        Arc::new(Float64Array::from(step)),
        Arc::new(Float64Array::from(timestamp)),
        Arc::new(Float64Array::from(mean)),
        Arc::new(Float64Array::from(std_dev)),
        Arc::new(Float64Array::from(min)),
        Arc::new(Float64Array::from(max)),
    ];
    Ok(RecordBatch::try_new(statistics_schema(), columns)?)
}

/// Write aligned series to a Parquet file; returns the number of rows.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be created and `Error::Export`
/// if Parquet encoding fails.
pub fn write_parquet(
    series: &BTreeMap<String, AlignedSeries>,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let batch = statistics_batch(series)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::Export(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::Export(format!("Failed to write record batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::Export(format!("Failed to finish Parquet file: {e}")))?;
    debug!(path = %path.display(), rows = batch.num_rows(), "Exported statistics");
    Ok(batch.num_rows())
}

/// Exported statistics read back into memory.
pub struct StatisticsTable {
    batches: Vec<RecordBatch>,
}

impl StatisticsTable {
    /// Load a table written by [`write_parquet`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened and `Error::Export`
    /// if it is not valid Parquet.
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| Error::Export(format!("Failed to parse Parquet file: {e}")))?;

        let reader = builder
            .build()
            .map_err(|e| Error::Export(format!("Failed to create Parquet reader: {e}")))?;

        let mut batches = Vec::new();
        for batch in reader {
            batches.push(batch?);
        }

        Ok(Self { batches })
    }

    /// Record batches in file order.
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}
