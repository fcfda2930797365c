//! NaN-aware reductions along named axes.
//!
//! Each lane is copied out in index order and reduced with the slice
//! functions from `tellus-stats`, so results do not depend on memory layout.

use crate::error::FieldError;
use crate::field::Field;

impl Field {
    /// Mean along `name`, skipping NaN. All-missing lanes give NaN.
    pub fn nanmean_along(&self, name: &str) -> Result<Field, FieldError> {
        self.reduce_along(name, tellus_stats::nanmean)
    }

    /// Population standard deviation along `name`, skipping NaN.
    /// All-missing lanes give NaN.
    pub fn nanstd_along(&self, name: &str) -> Result<Field, FieldError> {
        self.reduce_along(name, tellus_stats::nanstd)
    }

    /// Means over several axes, one axis at a time in the given order.
    ///
    /// The result is a mean of means, so a lane that is partly missing
    /// weights the surviving groups equally.
    pub fn nanmean_over(&self, names: &[&str]) -> Result<Field, FieldError> {
        let mut out = self.clone();
        for name in names {
            out = out.nanmean_along(name)?;
        }
        Ok(out)
    }

    fn reduce_along(&self, name: &str, f: fn(&[f64]) -> f64) -> Result<Field, FieldError> {
        let k = self.axis_index(name)?;
        let data = self
            .data()
            .map_axis(ndarray::Axis(k), |lane| f(&lane.to_vec()));
        let axes = self
            .axes()
            .iter()
            .filter(|a| a.name() != name)
            .cloned()
            .collect();
        Field::new(axes, data)
    }

    /// Number of non-NaN values along `name`.
    pub fn count_valid_along(&self, name: &str) -> Result<Field, FieldError> {
        self.reduce_along(name, |lane| tellus_stats::count_valid(lane) as f64)
    }
}
