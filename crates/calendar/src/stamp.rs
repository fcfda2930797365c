//! Date + seconds-of-day stamps used in state snapshot file names.
//!
//! Producer and consumer of a snapshot derive the same name from the same
//! timestamp, so no side index is needed.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::error::CalendarError;

/// Seconds elapsed since midnight.
pub fn seconds_of_day(t: NaiveDateTime) -> u32 {
    t.hour() * 3600 + t.minute() * 60 + t.second()
}

/// Formats `t` as `YYYYMMDD_SSSSS`.
///
/// # Example
///
/// ```ignore
/// let t = NaiveDate::from_ymd_opt(2017, 3, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
/// assert_eq!(state_stamp(t), "20170301_21600");
/// ```
pub fn state_stamp(t: NaiveDateTime) -> String {
    format!("{}_{:05}", t.format("%Y%m%d"), seconds_of_day(t))
}

/// Parses a `YYYYMMDD_SSSSS` stamp back into a timestamp.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidStamp`] if the date part is not a valid
/// calendar date or the seconds part is not below 86400.
pub fn parse_state_stamp(stamp: &str) -> Result<NaiveDateTime, CalendarError> {
    let invalid = |reason: &str| CalendarError::InvalidStamp {
        stamp: stamp.to_string(),
        reason: reason.to_string(),
    };

    let (date_part, secs_part) = stamp
        .split_once('_')
        .ok_or_else(|| invalid("missing '_' separator"))?;
    if date_part.len() != 8 || secs_part.len() != 5 {
        return Err(invalid("expected YYYYMMDD_SSSSS"));
    }

    let date = NaiveDate::parse_from_str(date_part, "%Y%m%d")
        .map_err(|e| invalid(&format!("bad date: {e}")))?;
    let secs: u32 = secs_part
        .parse()
        .map_err(|_| invalid("seconds are not a number"))?;
    if secs >= 86_400 {
        return Err(invalid("seconds of day must be below 86400"));
    }

    Ok(date.and_time(chrono::NaiveTime::MIN) + TimeDelta::seconds(i64::from(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn midnight_is_zero_padded() {
        assert_eq!(state_stamp(at(2017, 1, 2, 0, 0, 0)), "20170102_00000");
    }

    #[test]
    fn minutes_count_toward_seconds_of_day() {
        assert_eq!(seconds_of_day(at(2017, 1, 2, 1, 30, 15)), 5415);
        assert_eq!(state_stamp(at(2017, 1, 2, 1, 30, 15)), "20170102_05415");
    }

    #[test]
    fn parse_inverts_format() {
        let t = at(2016, 2, 29, 18, 0, 0);
        assert_eq!(parse_state_stamp(&state_stamp(t)).unwrap(), t);
    }

    #[test]
    fn parse_rejects_bad_seconds() {
        assert!(parse_state_stamp("20170101_86400").is_err());
    }

    #[test]
    fn parse_rejects_bad_date() {
        assert!(parse_state_stamp("20170230_00000").is_err());
        assert!(parse_state_stamp("2017023_00000").is_err());
        assert!(parse_state_stamp("20170203").is_err());
    }
}
