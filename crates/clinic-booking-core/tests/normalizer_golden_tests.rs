//! Golden tests for date and time normalization.
//!
//! "Today" is Friday 2026-10-16. Inputs that match no known form come back
//! unchanged.

use chrono::NaiveDate;
use clinic_booking_core::resolver::{normalize_time, Normalizer};

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    input: &'static str,
    expected: &'static str,
}

fn date_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase { id: "iso", input: "2026-10-22", expected: "2026-10-22" },
        GoldenCase { id: "iso-slashes", input: "2026/1/5", expected: "2026-01-05" },
        GoldenCase { id: "day-month-abbrev", input: "22 Oct", expected: "2026-10-22" },
        GoldenCase { id: "ordinal-full-year", input: "22nd October 2026", expected: "2026-10-22" },
        GoldenCase { id: "month-first", input: "Sept 22", expected: "2026-09-22" },
        GoldenCase { id: "month-first-comma-year", input: "November 3rd, 2027", expected: "2027-11-03" },
        GoldenCase { id: "numeric-dmy", input: "20/10/2026", expected: "2026-10-20" },
        GoldenCase { id: "numeric-two-digit-year", input: "20.10.26", expected: "2026-10-20" },
        GoldenCase { id: "numeric-no-year", input: "5/11", expected: "2026-11-05" },
        GoldenCase { id: "weekday-prefixed", input: "fri 23 oct", expected: "2026-10-23" },
        GoldenCase { id: "today", input: "today", expected: "2026-10-16" },
        GoldenCase { id: "tomorrow", input: "Tomorrow", expected: "2026-10-17" },
        GoldenCase { id: "day-after-tomorrow", input: "day after tomorrow", expected: "2026-10-18" },
        GoldenCase { id: "next-weekday", input: "next monday", expected: "2026-10-19" },
        GoldenCase { id: "same-weekday-is-next-week", input: "friday", expected: "2026-10-23" },
        GoldenCase { id: "next-week", input: "next week", expected: "2026-10-23" },
        GoldenCase { id: "impossible-date", input: "30 feb", expected: "30 feb" },
        GoldenCase { id: "bad-month", input: "2026-13-01", expected: "2026-13-01" },
        GoldenCase { id: "unknown", input: "someday soon", expected: "someday soon" },
    ]
}

fn time_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase { id: "hour-am", input: "10 am", expected: "10:00" },
        GoldenCase { id: "minutes-upper", input: "10:30 AM", expected: "10:30" },
        GoldenCase { id: "dotted-pm", input: "2.15pm", expected: "14:15" },
        GoldenCase { id: "periods", input: "9 a.m.", expected: "09:00" },
        GoldenCase { id: "midnight-am", input: "12 am", expected: "00:00" },
        GoldenCase { id: "noon-pm", input: "12 pm", expected: "12:00" },
        GoldenCase { id: "oclock-afternoon", input: "4 o'clock", expected: "16:00" },
        GoldenCase { id: "oclock-morning", input: "9 o'clock", expected: "09:00" },
        GoldenCase { id: "oclock-explicit-am", input: "7 o'clock am", expected: "07:00" },
        GoldenCase { id: "twenty-four-hour", input: "14:30", expected: "14:30" },
        GoldenCase { id: "single-digit-hour", input: "9:05", expected: "09:05" },
        GoldenCase { id: "noon-word", input: "noon", expected: "12:00" },
        GoldenCase { id: "bad-meridiem-hour", input: "13 pm", expected: "13 pm" },
        GoldenCase { id: "bad-hour", input: "25:00", expected: "25:00" },
        GoldenCase { id: "words", input: "around ten", expected: "around ten" },
    ]
}

#[test]
fn test_golden_dates() {
    let normalizer = Normalizer::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());

    for case in date_cases() {
        assert_eq!(
            normalizer.normalize_date(case.input),
            case.expected,
            "Case {}: date mismatch",
            case.id
        );
    }
}

#[test]
fn test_golden_times() {
    for case in time_cases() {
        assert_eq!(
            normalize_time(case.input),
            case.expected,
            "Case {}: time mismatch",
            case.id
        );
    }
}

#[test]
fn test_year_follows_today() {
    let normalizer = Normalizer::new(NaiveDate::from_ymd_opt(2027, 3, 1).unwrap());

    assert_eq!(normalizer.normalize_date("22 Oct"), "2027-10-22");
    assert_eq!(normalizer.normalize_date("tomorrow"), "2027-03-02");
}
