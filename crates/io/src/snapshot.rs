//! State snapshots: one NetCDF file per model instant.
//!
//! The file name carries the instant as `YYYYMMDD_SSSSS`, so writer and
//! reader agree on names without an index file. Snapshots are never
//! modified once written; a corrected state is always a new file.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tellus_calendar::{parse_state_stamp, state_stamp};
use tellus_field::{Axis, Field};
use tracing::{debug, info};

use crate::error::IoError;
use crate::netcdf_read::{numeric_attribute, read_field};

/// Path of the snapshot for `time`: `{dir}/{prefix}.state.{YYYYMMDD}_{SSSSS}.nc`.
pub fn snapshot_path(dir: &Path, prefix: &str, time: NaiveDateTime) -> PathBuf {
    dir.join(format!("{prefix}.state.{}.nc", state_stamp(time)))
}

/// Recovers the instant from a snapshot path written by [`snapshot_path`].
pub fn snapshot_time(path: &Path, prefix: &str) -> Result<NaiveDateTime, IoError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stamp = name
        .strip_prefix(&format!("{prefix}.state."))
        .and_then(|s| s.strip_suffix(".nc"))
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("'{name}' is not a '{prefix}' state snapshot name"),
        })?;
    Ok(parse_state_stamp(stamp)?)
}

/// Reads variable `var` from each snapshot and stacks them along a new
/// leading `time` axis labelled with the given instants.
///
/// All snapshots must share the same grid.
pub fn read_state_series(
    snapshots: &[(NaiveDateTime, PathBuf)],
    var: &str,
) -> Result<Field, IoError> {
    let fields = snapshots
        .iter()
        .map(|(_, p)| read_field(p, var))
        .collect::<Result<Vec<_>, _>>()?;
    let times = snapshots.iter().map(|(t, _)| *t).collect();
    let series = Field::stack(&fields, Axis::time("time", times))?;
    info!(var, snapshots = snapshots.len(), shape = ?series.shape(), "read state series");
    Ok(series)
}

/// Writes a new snapshot at `out`: a copy of `template` with variable `var`
/// replaced by `field`.
///
/// `field` must carry the variable's dimensions by name (any order) with
/// matching lengths; it is transposed to the file's order before writing.
/// Every other variable and attribute is carried over unchanged. NaN is
/// written back as the variable's `_FillValue` (or `missing_value`) when it
/// declares one.
///
/// # Errors
///
/// - [`IoError::SnapshotExists`] if `out` already exists.
/// - [`IoError::MissingVariable`] if the template lacks `var`.
/// - [`IoError::DimensionMismatch`] if a dimension length differs.
pub fn save_updated_state(
    template: &Path,
    field: &Field,
    var: &str,
    out: &Path,
) -> Result<(), IoError> {
    if out.exists() {
        return Err(IoError::SnapshotExists {
            path: out.to_path_buf(),
        });
    }
    if !template.exists() {
        return Err(IoError::FileNotFound {
            path: template.to_path_buf(),
        });
    }
    std::fs::copy(template, out).map_err(|e| IoError::Filesystem {
        path: out.to_path_buf(),
        reason: e.to_string(),
    })?;

    let written = overwrite_variable(field, var, out);
    if written.is_err() {
        // A half-written snapshot must not be mistaken for a finished one.
        let _ = std::fs::remove_file(out);
    }
    written?;
    debug!(var, path = %out.display(), "saved updated state");
    Ok(())
}

fn overwrite_variable(field: &Field, var: &str, path: &Path) -> Result<(), IoError> {
    let mut file = netcdf::append(path)?;
    let mut variable = file
        .variable_mut(var)
        .ok_or_else(|| IoError::MissingVariable {
            name: var.to_string(),
            path: path.to_path_buf(),
        })?;

    let dims: Vec<(String, usize)> = variable
        .dimensions()
        .iter()
        .map(|d| (d.name(), d.len()))
        .collect();
    for (name, len) in &dims {
        let got = field.axis(name)?.len();
        if got != *len {
            return Err(IoError::DimensionMismatch {
                name: name.clone(),
                expected: *len,
                got,
            });
        }
    }
    let order: Vec<&str> = dims.iter().map(|(n, _)| n.as_str()).collect();
    let mut values = field.transpose_to(&order)?.values();
    let fill = numeric_attribute(&variable, "_FillValue")
        .or_else(|| numeric_attribute(&variable, "missing_value"));
    if let Some(fill) = fill {
        values
            .iter_mut()
            .filter(|v| v.is_nan())
            .for_each(|v| *v = fill);
    }
    variable.put_values(&values, ..)?;
    Ok(())
}
