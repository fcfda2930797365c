//! Configuration for the two-level rescaler.

use crate::error::RescaleError;

/// What to do when a truth cell has no temporal spread.
///
/// The cell-level ratio `ref_std / truth_std` is undefined when `truth_std`
/// is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroSpreadPolicy {
    /// Use a ratio of 1: the cell is shifted to the reference mean but its
    /// (flat) anomalies are not stretched.
    #[default]
    UnitRatio,
    /// Fail with [`RescaleError::ZeroSpread`].
    Reject,
}

/// Rescaler configuration.
#[derive(Debug, Clone)]
pub struct RescaleConfig {
    time_axis: String,
    subunit_axes: Vec<String>,
    zero_spread: ZeroSpreadPolicy,
    spread_tolerance: f64,
}

impl Default for RescaleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RescaleConfig {
    /// Default configuration: `time` axis, `veg_class` and `snow_band`
    /// sub-unit axes, unit-ratio fallback, tolerance `1e-12`.
    pub fn new() -> Self {
        Self {
            time_axis: "time".to_string(),
            subunit_axes: vec!["veg_class".to_string(), "snow_band".to_string()],
            zero_spread: ZeroSpreadPolicy::default(),
            spread_tolerance: 1e-12,
        }
    }

    /// Sets the name of the time axis.
    pub fn with_time_axis(mut self, name: impl Into<String>) -> Self {
        self.time_axis = name.into();
        self
    }

    /// Sets the sub-unit axes, collapsed in the given order.
    pub fn with_subunit_axes(mut self, names: Vec<String>) -> Self {
        self.subunit_axes = names;
        self
    }

    /// Sets the zero-spread policy.
    pub fn with_zero_spread(mut self, policy: ZeroSpreadPolicy) -> Self {
        self.zero_spread = policy;
        self
    }

    /// Sets the spread below which a cell counts as zero-spread.
    pub fn with_spread_tolerance(mut self, tol: f64) -> Self {
        self.spread_tolerance = tol;
        self
    }

    /// Returns the time axis name.
    pub fn time_axis(&self) -> &str {
        &self.time_axis
    }

    /// Returns the sub-unit axis names.
    pub fn subunit_axes(&self) -> &[String] {
        &self.subunit_axes
    }

    /// Returns the zero-spread policy.
    pub fn zero_spread(&self) -> ZeroSpreadPolicy {
        self.zero_spread
    }

    /// Returns the zero-spread tolerance.
    pub fn spread_tolerance(&self) -> f64 {
        self.spread_tolerance
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RescaleError> {
        if self.time_axis.is_empty() {
            return Err(RescaleError::InvalidConfig {
                reason: "time axis name is empty".to_string(),
            });
        }
        if self.subunit_axes.iter().any(|s| s == &self.time_axis) {
            return Err(RescaleError::InvalidConfig {
                reason: format!("'{}' cannot be both time and sub-unit axis", self.time_axis),
            });
        }
        for (i, a) in self.subunit_axes.iter().enumerate() {
            if self.subunit_axes[..i].contains(a) {
                return Err(RescaleError::InvalidConfig {
                    reason: format!("sub-unit axis '{a}' listed twice"),
                });
            }
        }
        if !self.spread_tolerance.is_finite() || self.spread_tolerance < 0.0 {
            return Err(RescaleError::InvalidConfig {
                reason: format!(
                    "spread_tolerance must be finite and >= 0, got {}",
                    self.spread_tolerance
                ),
            });
        }
        Ok(())
    }
}
