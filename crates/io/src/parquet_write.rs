//! Low-level Parquet column building.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::IoError;
use crate::series::{EnsembleSeries, SiteSeries};

/// Builds the Arrow schema for flow tables.
///
/// Always includes `site`, `time` (seconds since the Unix epoch) and
/// `value`. When `with_member` is true, `member` is appended.
pub(crate) fn build_schema(with_member: bool) -> Schema {
    let mut fields = vec![
        Field::new("site", DataType::Utf8, false),
        Field::new("time", DataType::Int64, false),
        Field::new("value", DataType::Float64, false),
    ];
    if with_member {
        fields.push(Field::new("member", DataType::UInt32, false));
    }
    Schema::new(fields)
}

pub(crate) fn epoch_seconds(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp()
}

/// Converts one site's series into a [`RecordBatch`].
pub(crate) fn site_to_record_batch(
    site: &str,
    series: &SiteSeries,
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    let n = series.len();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![site; n])),
        Arc::new(Int64Array::from(
            series.times().iter().map(|&t| epoch_seconds(t)).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(series.values().to_vec())),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// Converts one site's ensemble into a [`RecordBatch`], time-major.
pub(crate) fn ensemble_to_record_batch(
    site: &str,
    series: &EnsembleSeries,
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    let nm = series.n_members();
    let n = series.len() * nm;
    let mut times = Vec::with_capacity(n);
    let mut values = Vec::with_capacity(n);
    let mut members = Vec::with_capacity(n);
    for (t, &time) in series.times().iter().enumerate() {
        for (m, &v) in series.row(t).iter().enumerate() {
            times.push(epoch_seconds(time));
            values.push(v);
            members.push(m as u32);
        }
    }
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![site; n])),
        Arc::new(Int64Array::from(times)),
        Arc::new(Float64Array::from(values)),
        Arc::new(UInt32Array::from(members)),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// Builds one batch per site, in site-name order.
pub(crate) fn site_batches(
    tables: &BTreeMap<String, SiteSeries>,
    schema: &Schema,
) -> Result<Vec<RecordBatch>, IoError> {
    tables
        .iter()
        .map(|(site, s)| site_to_record_batch(site, s, schema))
        .collect()
}

/// Builds one batch per site, in site-name order.
pub(crate) fn ensemble_batches(
    tables: &BTreeMap<String, EnsembleSeries>,
    schema: &Schema,
) -> Result<Vec<RecordBatch>, IoError> {
    tables
        .iter()
        .map(|(site, s)| ensemble_to_record_batch(site, s, schema))
        .collect()
}

/// Writes a sequence of [`RecordBatch`]es to a Parquet file at `path`.
///
/// # Errors
///
/// Returns [`IoError::Parquet`] if file creation, batch writing, or file
/// finalisation fails.
pub(crate) fn write_batches(
    path: &Path,
    batches: &[RecordBatch],
    schema: &Schema,
    props: WriterProperties,
) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::Parquet {
        reason: e.to_string(),
    })?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))?;

    for batch in batches {
        writer.write(batch)?;
    }

    writer.close()?;
    Ok(())
}
