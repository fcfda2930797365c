//! NetCDF reading: variables become [`Field`]s, CF time axes become
//! timestamps.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use netcdf::AttributeValue;
use tellus_field::{Axis, Field};
use tracing::debug;

use crate::error::IoError;

/// Calendars whose day arithmetic matches chrono's proleptic Gregorian.
const SUPPORTED_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Reads variable `var` from `path` as a [`Field`].
///
/// Dimension names become axis names. A dimension with a 1-D coordinate
/// variable of the same name gets that variable's values as labels:
/// timestamps if it carries CF `"<unit> since <datetime>"` units, floats
/// otherwise. Dimensions without a coordinate variable are labelled
/// `0..len`. Values equal to `_FillValue` or `missing_value` become NaN.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] / [`IoError::Netcdf`] on open or read failure.
/// - [`IoError::MissingVariable`] if `var` is absent.
/// - [`IoError::InvalidTime`] if a time axis cannot be decoded.
pub fn read_field(path: &Path, var: &str) -> Result<Field, IoError> {
    let file = open_file(path)?;
    let variable = file
        .variable(var)
        .ok_or_else(|| IoError::MissingVariable {
            name: var.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut axes = Vec::new();
    for dim in variable.dimensions() {
        let name = dim.name();
        axes.push(coordinate_axis(&file, &name, dim.len(), path)?);
    }

    let mut values = variable.get_values::<f64, _>(..)?;
    let fills: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|a| numeric_attribute(&variable, a))
        .collect();
    let mut masked = 0usize;
    if !fills.is_empty() {
        for v in values.iter_mut() {
            if fills.contains(v) {
                *v = f64::NAN;
                masked += 1;
            }
        }
    }
    debug!(var, path = %path.display(), masked, "read netcdf variable");

    Ok(Field::from_vec(axes, values)?)
}

/// Reads the CF time coordinate variable `name` from `path`.
pub fn read_times(path: &Path, name: &str) -> Result<Vec<NaiveDateTime>, IoError> {
    let file = open_file(path)?;
    let variable = file
        .variable(name)
        .ok_or_else(|| IoError::MissingVariable {
            name: name.to_string(),
            path: path.to_path_buf(),
        })?;
    decode_times(&variable)
}

fn coordinate_axis(
    file: &netcdf::File,
    name: &str,
    len: usize,
    path: &Path,
) -> Result<Axis, IoError> {
    let Some(cv) = file.variable(name) else {
        return Ok(Axis::range(name, len));
    };
    let dims = cv.dimensions();
    if dims.len() != 1 || dims[0].name() != name {
        return Ok(Axis::range(name, len));
    }
    if dims[0].len() != len {
        return Err(IoError::DimensionMismatch {
            name: name.to_string(),
            expected: len,
            got: dims[0].len(),
        });
    }
    if string_attribute(&cv, "units").is_some_and(|u| u.contains(" since ")) {
        debug!(axis = name, path = %path.display(), "decoding CF time axis");
        return Ok(Axis::time(name, decode_times(&cv)?));
    }
    Ok(Axis::float(name, cv.get_values::<f64, _>(..)?))
}

fn string_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

pub(crate) fn numeric_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Longlong(v) => Some(v as f64),
        _ => None,
    }
}

fn decode_times(var: &netcdf::Variable<'_>) -> Result<Vec<NaiveDateTime>, IoError> {
    let var_name = var.name();
    let units = string_attribute(var, "units").ok_or_else(|| IoError::InvalidTime {
        reason: format!("time variable '{var_name}' has no string 'units' attribute"),
    })?;
    let calendar = string_attribute(var, "calendar").unwrap_or_else(|| "standard".to_string());
    if !SUPPORTED_CALENDARS.contains(&calendar.to_lowercase().as_str()) {
        return Err(IoError::InvalidTime {
            reason: format!("unsupported calendar '{calendar}' on '{var_name}'"),
        });
    }
    let (unit_seconds, base) = parse_time_units(&units)?;
    let offsets = var.get_values::<f64, _>(..)?;
    offsets_to_times(base, unit_seconds, &offsets)
}

/// Parses CF units like `"hours since 2017-01-01 00:00:00"` into the
/// length of one unit in seconds and the reference datetime.
pub(crate) fn parse_time_units(units: &str) -> Result<(f64, NaiveDateTime), IoError> {
    let invalid = || IoError::InvalidTime {
        reason: format!("unexpected time units format: '{units}'"),
    };
    let (unit, reference) = units.split_once(" since ").ok_or_else(invalid)?;
    let unit_seconds = match unit.trim().to_lowercase().as_str() {
        "days" | "day" => 86_400.0,
        "hours" | "hour" => 3_600.0,
        "minutes" | "minute" => 60.0,
        "seconds" | "second" => 1.0,
        _ => return Err(invalid()),
    };

    let reference = reference.trim();
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    let base = formats
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(reference, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(reference, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("failed to parse reference datetime '{reference}'"),
        })?;
    Ok((unit_seconds, base))
}

/// Converts numeric offsets to timestamps, rounding to the millisecond.
pub(crate) fn offsets_to_times(
    base: NaiveDateTime,
    unit_seconds: f64,
    offsets: &[f64],
) -> Result<Vec<NaiveDateTime>, IoError> {
    offsets
        .iter()
        .map(|&offset| {
            if !offset.is_finite() {
                return Err(IoError::InvalidTime {
                    reason: format!("non-finite time offset {offset}"),
                });
            }
            let ms = (offset * unit_seconds * 1000.0).round() as i64;
            base.checked_add_signed(TimeDelta::milliseconds(ms))
                .ok_or_else(|| IoError::InvalidTime {
                    reason: format!("date overflow adding {offset} units to {base}"),
                })
        })
        .collect()
}
