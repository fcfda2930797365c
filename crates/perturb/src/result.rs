//! Result type for the noise injector.

use tellus_field::Field;

/// Output of [`add_gaussian_noise`](crate::add_gaussian_noise).
#[derive(Debug, Clone)]
pub struct NoiseResult {
    field: Field,
    n_reflected: usize,
}

impl NoiseResult {
    pub(crate) fn new(field: Field, n_reflected: usize) -> Self {
        Self { field, n_reflected }
    }

    /// Perturbed field.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Number of negative values mirrored to positive.
    pub fn n_reflected(&self) -> usize {
        self.n_reflected
    }

    /// Consumes the result, returning the perturbed field.
    pub fn into_field(self) -> Field {
        self.field
    }
}
