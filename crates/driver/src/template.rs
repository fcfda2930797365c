//! `{{name}}` placeholder substitution for simulator parameter files.

use chrono::{Datelike, NaiveDateTime};
use tellus_calendar::seconds_of_day;

use crate::error::DriverError;

/// Replaces every `{{key}}` with its value.
///
/// # Errors
///
/// Returns [`DriverError::Template`] naming the first placeholder left
/// after substitution.
pub(crate) fn render(template: &str, vars: &[(String, String)]) -> Result<String, DriverError> {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    if let Some(open) = out.find("{{") {
        let rest = &out[open..];
        let placeholder = rest
            .find("}}")
            .map_or(rest, |close| &rest[..close + 2])
            .to_string();
        return Err(DriverError::Template { placeholder });
    }
    Ok(out)
}

/// `{prefix}_year`, `{prefix}_month`, `{prefix}_day`, `{prefix}_sec`.
pub(crate) fn time_vars(prefix: &str, t: NaiveDateTime) -> [(String, String); 4] {
    [
        (format!("{prefix}_year"), t.year().to_string()),
        (format!("{prefix}_month"), format!("{:02}", t.month())),
        (format!("{prefix}_day"), format!("{:02}", t.day())),
        (format!("{prefix}_sec"), format!("{:05}", seconds_of_day(t))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_every_occurrence() {
        let out = render("A {{x}} B {{x}} {{y}}", &vars(&[("x", "1"), ("y", "2")])).unwrap();
        assert_eq!(out, "A 1 B 1 2");
    }

    #[test]
    fn leftover_placeholder_is_an_error() {
        let err = render("STARTYEAR {{start_year}}\nX {{oops}}", &vars(&[("start_year", "2017")]))
            .unwrap_err();
        assert!(matches!(err, DriverError::Template { placeholder } if placeholder == "{{oops}}"));
    }

    #[test]
    fn time_vars_are_padded() {
        let t = NaiveDate::from_ymd_opt(2017, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let v = time_vars("end", t);
        assert_eq!(v[0], ("end_year".to_string(), "2017".to_string()));
        assert_eq!(v[1].1, "03");
        assert_eq!(v[2].1, "01");
        assert_eq!(v[3].1, "21600");
    }
}
