//! Gauge metadata CSV: one row per site, as exported from the gauge
//! network's site service.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::IoError;

#[derive(Debug, Deserialize)]
struct SiteInfoRow {
    short_name: String,
    drain_area_va: Option<f64>,
}

/// Reads the observed drainage area of each site, keyed by `short_name`.
///
/// Areas are returned as recorded (`drain_area_va`, square miles). Rows with
/// an empty or non-finite area are left out. Extra columns are ignored.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::Csv`] if a required column is missing or a value is not a
///   number.
/// - [`IoError::Validation`] if a site appears more than once.
pub fn read_drainage_areas(path: &Path) -> Result<BTreeMap<String, f64>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut areas = BTreeMap::new();
    let mut duplicates = Vec::new();
    for row in reader.deserialize::<SiteInfoRow>() {
        let row = row?;
        let Some(area) = row.drain_area_va.filter(|a| a.is_finite()) else {
            warn!(site = row.short_name.as_str(), "site has no drainage area");
            continue;
        };
        if areas.insert(row.short_name.clone(), area).is_some() {
            duplicates.push(format!("site {}: listed more than once", row.short_name));
        }
    }
    if !duplicates.is_empty() {
        return Err(IoError::Validation {
            count: duplicates.len(),
            details: duplicates.join("; "),
        });
    }
    debug!(path = %path.display(), sites = areas.len(), "read drainage areas");
    Ok(areas)
}
