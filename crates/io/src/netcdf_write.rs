//! NetCDF writing of one or more fields sharing dimensions.

use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};
use tellus_field::{Axis, Coords, Field};
use tracing::debug;

use crate::error::IoError;

/// Writes `fields` as variables of a new NetCDF file at `path`.
///
/// Each distinct axis becomes a dimension. Time axes are written as a
/// coordinate variable in `seconds since <first day> 00:00:00`
/// (proleptic Gregorian); float axes as plain coordinate variables; integer
/// axes as bare dimensions, which read back labelled `0..len`. Fields that
/// share an axis name must agree on its labels.
///
/// # Errors
///
/// - [`IoError::Validation`] if two fields disagree on a shared axis or an
///   axis is empty.
/// - [`IoError::Netcdf`] on any write failure.
pub fn write_fields(path: &Path, fields: &[(&str, &Field)]) -> Result<(), IoError> {
    let axes = collect_axes(fields)?;

    let mut file = netcdf::create(path)?;
    for axis in &axes {
        file.add_dimension(axis.name(), axis.len())?;
    }

    for axis in &axes {
        match axis.coords() {
            Coords::Time(times) => {
                let (units, offsets) = encode_times(times);
                let mut var = file.add_variable::<f64>(axis.name(), &[axis.name()])?;
                var.put_values(&offsets, ..)?;
                var.put_attribute("units", units)?;
                var.put_attribute("calendar", "proleptic_gregorian")?;
            }
            Coords::Float(values) => {
                let mut var = file.add_variable::<f64>(axis.name(), &[axis.name()])?;
                var.put_values(values, ..)?;
            }
            Coords::Int(_) => {}
        }
    }

    for (name, field) in fields {
        let dims = field.names();
        let mut var = file.add_variable::<f64>(name, &dims)?;
        var.put_values(&field.values(), ..)?;
        debug!(var = *name, dims = ?dims, path = %path.display(), "wrote netcdf variable");
    }
    Ok(())
}

fn collect_axes<'a>(fields: &[(&str, &'a Field)]) -> Result<Vec<&'a Axis>, IoError> {
    let mut axes: Vec<&Axis> = Vec::new();
    let mut problems = Vec::new();
    for (name, field) in fields {
        for axis in field.axes() {
            if axis.is_empty() {
                problems.push(format!("{name}: axis '{}' is empty", axis.name()));
                continue;
            }
            match axes.iter().find(|a| a.name() == axis.name()) {
                Some(existing) if existing.coords() != axis.coords() => {
                    problems.push(format!(
                        "{name}: axis '{}' disagrees with an earlier variable",
                        axis.name()
                    ));
                }
                Some(_) => {}
                None => axes.push(axis),
            }
        }
    }
    if !problems.is_empty() {
        return Err(IoError::Validation {
            count: problems.len(),
            details: problems.join("; "),
        });
    }
    Ok(axes)
}

/// Encodes timestamps as seconds since midnight of the first timestamp.
pub(crate) fn encode_times(times: &[NaiveDateTime]) -> (String, Vec<f64>) {
    let base = times
        .first()
        .map(|t| t.date().and_time(NaiveTime::MIN))
        .unwrap_or_default();
    let offsets = times
        .iter()
        .map(|&t| (t - base).num_milliseconds() as f64 / 1000.0)
        .collect();
    (
        format!("seconds since {}", base.format("%Y-%m-%d %H:%M:%S")),
        offsets,
    )
}
