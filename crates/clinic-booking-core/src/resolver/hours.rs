//! Clinic operating hours.
//!
//! The clinic's `hours` field is free text. Common shapes are parsed so the
//! validator can reject closed days and out-of-hours times; anything else
//! leaves the hours unconstrained.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveTime};
use regex::Regex;

use super::normalizer::parse_time;

static DAY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?\s*(?:-|–|to|through|thru)\s*(mon|tue|wed|thu|fri|sat|sun)[a-z]*\b",
    )
    .unwrap()
});

static SINGLE_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(mon|tue|wed|thu|fri|sat|sun)[a-z]*\b").unwrap());

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2}(?:[:.]\d{2})?\s*(?:[ap]\.?\s*m\.?)?)\s*(?:-|–|to|until)\s*(\d{1,2}(?:[:.]\d{2})?\s*(?:[ap]\.?\s*m\.?)?)",
    )
    .unwrap()
});

const DAY_KEYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Parsed operating hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicHours {
    /// Open days, indexed from Monday
    days: [bool; 7],
    opens: NaiveTime,
    closes: NaiveTime,
}

impl ClinicHours {
    /// Parse a descriptor such as `Mon-Sat 9:00 AM - 6:00 PM`.
    ///
    /// Returns `None` when no time range can be found.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();

        let caps = TIME_RANGE.captures(&lower)?;
        let opens = range_end(&caps[1])?;
        let closes = range_end(&caps[2])?;
        if closes <= opens {
            return None;
        }

        let days = if let Some(range) = DAY_RANGE.captures(&lower) {
            let start = day_index(&range[1])?;
            let end = day_index(&range[2])?;
            let mut days = [false; 7];
            let mut i = start;
            loop {
                days[i] = true;
                if i == end {
                    break;
                }
                i = (i + 1) % 7;
            }
            days
        } else if let Some(single) = SINGLE_DAY.captures(&lower) {
            let mut days = [false; 7];
            days[day_index(&single[1])?] = true;
            days
        } else {
            // "Daily", "every day" or no day qualifier at all.
            [true; 7]
        };

        Some(Self { days, opens, closes })
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.days[date.weekday().num_days_from_monday() as usize]
    }

    /// Whether `time` falls within opening hours. Closing time is exclusive.
    pub fn within(&self, time: NaiveTime) -> bool {
        time >= self.opens && time < self.closes
    }

    pub fn opens(&self) -> NaiveTime {
        self.opens
    }

    pub fn closes(&self) -> NaiveTime {
        self.closes
    }
}

fn day_index(prefix: &str) -> Option<usize> {
    DAY_KEYS.iter().position(|d| *d == prefix)
}

/// One end of a time range; a bare hour uses the o'clock reading.
fn range_end(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return parse_time(&format!("{} o'clock", raw));
    }
    parse_time(raw)
}
