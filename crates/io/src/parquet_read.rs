//! Low-level Parquet reading and column extraction.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use arrow::array::{AsArray, RecordBatch};
use arrow::datatypes::{DataType, Float64Type, Int64Type, UInt32Type};
use chrono::{DateTime, NaiveDateTime};
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

use crate::error::IoError;
use crate::series::{EnsembleSeries, SiteSeries};

/// Expected columns of a flow table, with the member column last.
const COLUMNS: [(&str, DataType); 4] = [
    ("site", DataType::Utf8),
    ("time", DataType::Int64),
    ("value", DataType::Float64),
    ("member", DataType::UInt32),
];

/// Reads all record batches from a Parquet file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Parquet`] if the file cannot be opened or read.
pub(crate) fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path).map_err(|e| IoError::Parquet {
        reason: e.to_string(),
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let batches: Vec<RecordBatch> =
        reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| IoError::Parquet {
                reason: e.to_string(),
            })?;

    Ok(batches)
}

/// Checks column names and types, so the typed column accessors below
/// cannot panic.
pub(crate) fn validate_schema(batch: &RecordBatch, with_member: bool) -> Result<(), IoError> {
    let expected = if with_member { 4 } else { 3 };
    let schema = batch.schema();
    if schema.fields().len() != expected {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "expected {expected} columns, got {}",
                schema.fields().len()
            ),
        });
    }

    let mismatches: Vec<String> = COLUMNS[..expected]
        .iter()
        .enumerate()
        .filter_map(|(i, (name, dtype))| {
            let f = schema.field(i);
            (f.name() != name || f.data_type() != dtype).then(|| {
                format!(
                    "column {i}: expected '{name}' {dtype}, got '{}' {}",
                    f.name(),
                    f.data_type()
                )
            })
        })
        .collect();

    if !mismatches.is_empty() {
        return Err(IoError::Validation {
            count: mismatches.len(),
            details: mismatches.join("; "),
        });
    }
    Ok(())
}

fn from_epoch(secs: i64) -> Result<NaiveDateTime, IoError> {
    DateTime::from_timestamp(secs, 0)
        .map(|d| d.naive_utc())
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("epoch seconds {secs} out of range"),
        })
}

/// Reads a flow table without member column into one series per site.
///
/// Rows may come in any order; each site's rows are sorted by time.
///
/// # Errors
///
/// Returns [`IoError::Validation`] on a schema mismatch or a repeated
/// (site, time) row.
pub fn read_site_table(path: &Path) -> Result<BTreeMap<String, SiteSeries>, IoError> {
    let batches = read_batches(path)?;
    let mut rows: BTreeMap<String, Vec<(i64, f64)>> = BTreeMap::new();

    for batch in &batches {
        validate_schema(batch, false)?;
        let site_col = batch.column(0).as_string::<i32>();
        let time_col = batch.column(1).as_primitive::<Int64Type>();
        let value_col = batch.column(2).as_primitive::<Float64Type>();
        for row in 0..batch.num_rows() {
            rows.entry(site_col.value(row).to_string())
                .or_default()
                .push((time_col.value(row), value_col.value(row)));
        }
    }

    let mut out = BTreeMap::new();
    for (site, mut r) in rows {
        r.sort_by_key(|(t, _)| *t);
        let times = r
            .iter()
            .map(|(t, _)| from_epoch(*t))
            .collect::<Result<Vec<_>, _>>()?;
        let values = r.into_iter().map(|(_, v)| v).collect();
        let series = SiteSeries::new(times, values).map_err(|e| IoError::Validation {
            count: 1,
            details: format!("site '{site}': {e}"),
        })?;
        out.insert(site, series);
    }
    debug!(path = %path.display(), sites = out.len(), "read site table");
    Ok(out)
}

/// Reads a flow table with member column into one ensemble per site.
///
/// The time axis of a site is the union of its row times; members are the
/// distinct member ids in ascending order. A (time, member) pair with no row
/// is NaN.
///
/// # Errors
///
/// Returns [`IoError::Validation`] on a schema mismatch or a repeated
/// (site, time, member) row.
pub fn read_ensemble_table(path: &Path) -> Result<BTreeMap<String, EnsembleSeries>, IoError> {
    let batches = read_batches(path)?;
    let mut rows: BTreeMap<String, Vec<(i64, u32, f64)>> = BTreeMap::new();

    for batch in &batches {
        validate_schema(batch, true)?;
        let site_col = batch.column(0).as_string::<i32>();
        let time_col = batch.column(1).as_primitive::<Int64Type>();
        let value_col = batch.column(2).as_primitive::<Float64Type>();
        let member_col = batch.column(3).as_primitive::<UInt32Type>();
        for row in 0..batch.num_rows() {
            rows.entry(site_col.value(row).to_string())
                .or_default()
                .push((
                    time_col.value(row),
                    member_col.value(row),
                    value_col.value(row),
                ));
        }
    }

    let mut out = BTreeMap::new();
    for (site, r) in rows {
        let times: Vec<i64> = r
            .iter()
            .map(|(t, _, _)| *t)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let members: Vec<u32> = r
            .iter()
            .map(|(_, m, _)| *m)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut values = Array2::from_elem((times.len(), members.len()), f64::NAN);
        let mut seen = Array2::from_elem((times.len(), members.len()), false);
        for (t, m, v) in r {
            // Both searches succeed: the index lists were built from these rows.
            let ti = times.binary_search(&t).unwrap_or_default();
            let mi = members.binary_search(&m).unwrap_or_default();
            if seen[[ti, mi]] {
                return Err(IoError::Validation {
                    count: 1,
                    details: format!("site '{site}': duplicate row for time {t}, member {m}"),
                });
            }
            seen[[ti, mi]] = true;
            values[[ti, mi]] = v;
        }

        let times = times
            .into_iter()
            .map(from_epoch)
            .collect::<Result<Vec<_>, _>>()?;
        out.insert(site, EnsembleSeries::new(times, values)?);
    }
    debug!(path = %path.display(), sites = out.len(), "read ensemble table");
    Ok(out)
}
