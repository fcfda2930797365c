use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tellus_calendar::{align_history_times, parse_state_stamp, state_stamp, step_length};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 12, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn stamps_parse_back_across_year_boundary() {
    let step = step_length(8).unwrap();
    let mut t = start();
    for _ in 0..24 {
        let stamp = state_stamp(t);
        assert_eq!(
            parse_state_stamp(&stamp).unwrap(),
            t,
            "stamp {stamp} did not parse back to {t}"
        );
        t += step;
    }
}

#[test]
fn stamps_sort_chronologically_within_a_day() {
    let step = step_length(24).unwrap();
    let stamps: Vec<String> = (0..24).map(|i| state_stamp(start() + step * i)).collect();
    let mut sorted = stamps.clone();
    sorted.sort();
    assert_eq!(stamps, sorted);
}

#[test]
fn aligned_history_matches_state_times() {
    // History labels sit one step after the matching snapshot.
    let steps_per_day = 4;
    let step = step_length(steps_per_day).unwrap();
    let history: Vec<NaiveDateTime> = (1..=4).map(|i| start() + step * i).collect();
    let aligned = align_history_times(&history, steps_per_day).unwrap();
    let expected: Vec<NaiveDateTime> = (0..4).map(|i| start() + step * i).collect();
    assert_eq!(aligned, expected);
    assert_eq!(aligned[1] - aligned[0], TimeDelta::hours(6));
}
