//! Synthetic observation product.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tellus_field::Field;
use tracing::info;

use crate::error::IoError;
use crate::netcdf_write::write_fields;

const PRODUCT_AXES: [&str; 3] = ["time", "lat", "lon"];

/// Path of the product for one analysis period:
/// `{dir}/synthetic_meas.{tag}.{YYYYMMDD}_{YYYYMMDD}.nc`.
pub fn synthetic_product_path(dir: &Path, tag: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
    dir.join(format!(
        "synthetic_meas.{tag}.{}_{}.nc",
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    ))
}

/// Writes `field` as variable `var` of a synthetic observation product.
///
/// `field` must have exactly the axes `time`, `lat`, `lon` (any order);
/// it is stored in that order.
pub fn write_synthetic_product(path: &Path, var: &str, field: &Field) -> Result<(), IoError> {
    let ordered = field.transpose_to(&PRODUCT_AXES)?;
    write_fields(path, &[(var, &ordered)])?;
    info!(var, path = %path.display(), shape = ?ordered.shape(), "wrote synthetic product");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_name_encodes_period() {
        let p = synthetic_product_path(
            Path::new("/out"),
            "rescaled_v1",
            NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2017, 12, 31).unwrap(),
        );
        assert_eq!(
            p,
            PathBuf::from("/out/synthetic_meas.rescaled_v1.20170101_20171231.nc")
        );
    }
}
