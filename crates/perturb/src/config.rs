//! Noise configuration.

use tellus_field::Field;

use crate::error::PerturbError;

/// Standard deviation of the added noise.
#[derive(Debug, Clone, PartialEq)]
pub enum Sigma {
    /// Same sigma everywhere.
    Constant(f64),
    /// Sigma per location, broadcast over the field's other axes
    /// (typically `{lat, lon}` over `{time, lat, lon}`). NaN entries give
    /// NaN output at that location.
    PerCell(Field),
}

/// Noise injector configuration.
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    sigma: Sigma,
    adjust_negative: bool,
}

impl NoiseConfig {
    /// Creates a configuration with the given sigma and no reflection.
    pub fn new(sigma: Sigma) -> Self {
        Self {
            sigma,
            adjust_negative: false,
        }
    }

    /// Enables or disables reflection of negative results.
    pub fn with_adjust_negative(mut self, enabled: bool) -> Self {
        self.adjust_negative = enabled;
        self
    }

    /// Returns the sigma.
    pub fn sigma(&self) -> &Sigma {
        &self.sigma
    }

    /// Returns whether negative results are reflected.
    pub fn adjust_negative(&self) -> bool {
        self.adjust_negative
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), PerturbError> {
        let bad = |s: f64| s < 0.0 || s.is_infinite();
        match &self.sigma {
            Sigma::Constant(s) if s.is_nan() || bad(*s) => {
                Err(PerturbError::InvalidSigma { value: *s })
            }
            Sigma::PerCell(f) => match f.data().iter().find(|&&s| bad(s)) {
                Some(&s) => Err(PerturbError::InvalidSigma { value: s }),
                None => Ok(()),
            },
            Sigma::Constant(_) => Ok(()),
        }
    }
}
