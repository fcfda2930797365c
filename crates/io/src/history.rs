//! Simulator history products.

use std::path::PathBuf;

use tellus_field::Field;
use tracing::info;

use crate::error::IoError;
use crate::netcdf_read::read_field;

/// Reads `var` from each history file and joins them along `time`.
///
/// Files must be given in chronological order; the joined time axis must
/// be strictly increasing.
pub fn read_history(paths: &[PathBuf], var: &str) -> Result<Field, IoError> {
    let parts = paths
        .iter()
        .map(|p| read_field(p, var))
        .collect::<Result<Vec<_>, _>>()?;
    let joined = Field::concat(&parts, "time")?;

    let times = joined.times("time")?;
    if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "history time axis not strictly increasing: {} then {}",
                w[0], w[1]
            ),
        });
    }
    info!(var, files = paths.len(), steps = times.len(), "read history");
    Ok(joined)
}
