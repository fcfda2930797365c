//! Evaluation configuration.

use chrono::NaiveDateTime;

use crate::basin::Weighting;
use crate::error::EvaluateError;

/// Configuration for the evaluation pipeline.
#[derive(Debug, Clone, Default)]
pub struct EvaluateConfig {
    time_lag_hours: i64,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    weighting: Weighting,
}

impl EvaluateConfig {
    /// Hours local time lags the routed output's clock (6 for UTC-6).
    pub fn with_time_lag_hours(mut self, hours: i64) -> Self {
        self.time_lag_hours = hours;
        self
    }

    /// Restricts scoring to `start <= t <= end` (local time).
    pub fn with_window(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Sets how basin masks weight grid cells.
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn time_lag_hours(&self) -> i64 {
        self.time_lag_hours
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluateError::Validation`] if the window is empty or the
    /// lag exceeds a day.
    pub fn validate(&self) -> Result<(), EvaluateError> {
        let mut problems = Vec::new();
        if let (Some(s), Some(e)) = (self.start, self.end)
            && s > e
        {
            problems.push(format!("window start {s} is after end {e}"));
        }
        if self.time_lag_hours.abs() > 24 {
            problems.push(format!(
                "time lag {}h exceeds one day",
                self.time_lag_hours
            ));
        }
        if !problems.is_empty() {
            return Err(EvaluateError::Validation {
                count: problems.len(),
                details: problems.join("; "),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_default_values() {
        let config = EvaluateConfig::default();
        assert_eq!(config.time_lag_hours(), 0);
        assert!(config.start().is_none());
        assert_eq!(config.weighting(), Weighting::Membership);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EvaluateConfig::default()
            .with_time_lag_hours(6)
            .with_window(at(1980), at(1989))
            .with_weighting(Weighting::Fractional);
        assert_eq!(config.time_lag_hours(), 6);
        assert_eq!(config.end(), Some(at(1989)));
        assert_eq!(config.weighting(), Weighting::Fractional);
    }

    #[test]
    fn test_invalid_window_and_lag() {
        let config = EvaluateConfig::default()
            .with_window(at(1990), at(1980))
            .with_time_lag_hours(30);
        assert!(matches!(
            config.validate(),
            Err(EvaluateError::Validation { count: 2, .. })
        ));
    }
}
