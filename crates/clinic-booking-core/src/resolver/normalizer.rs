//! Date and time normalizer.
//!
//! Handles:
//! - Calendar dates (ISO, `D Mon [Y]`, `D Month [Y]`, `D/M/Y`, `D.M.Y`, free-form)
//! - Relative dates (today, tomorrow, day after tomorrow, next week, weekdays)
//! - Times (12-hour with am/pm, 24-hour `HH:MM`, `N o'clock`, noon/midnight)
//!
//! Normalization is total: input that matches no known form comes back
//! unchanged, and callers treat an unchanged string as "not normalized".

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

/// Canonical date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical time format.
pub const TIME_FORMAT: &str = "%H:%M";

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$").unwrap());

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/.-](\d{1,2})(?:[/.-](\d{4}|\d{2}))?$").unwrap()
});

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

static TWELVE_HOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:[:.\s]?(\d{2}))?\s*([ap])\.?\s*m\.?$").unwrap()
});

static OCLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:[:.](\d{2}))?\s*o'?\s*clock(?:\s*([ap])\.?\s*m\.?)?$").unwrap()
});

static TWENTY_FOUR_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[:.](\d{2})(?:[:.](\d{2}))?$").unwrap());

static WEEKDAY_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b").unwrap()
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Normalizer bound to the date of the message being processed.
///
/// Relative phrases and omitted years resolve against `today`, so the same
/// phrase gives different absolute dates on different days.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    today: NaiveDate,
}

impl Normalizer {
    /// Create a normalizer anchored at `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Normalize a date to `YYYY-MM-DD`, or return the input unchanged.
    pub fn normalize_date(&self, text: &str) -> String {
        match self.parse_date(text) {
            Some(date) => date.format(DATE_FORMAT).to_string(),
            None => text.to_string(),
        }
    }

    /// Parse a date phrase. Impossible calendar dates (30 feb) yield `None`.
    pub fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(caps) = ISO_DATE.captures(trimmed) {
            return ymd(&caps[1], &caps[2], &caps[3]);
        }

        if let Some(caps) = NUMERIC_DATE.captures(trimmed) {
            let year = match caps.get(3).map(|m| m.as_str()) {
                Some(y) if y.len() == 2 => format!("20{}", y),
                Some(y) => y.to_string(),
                None => self.today.year().to_string(),
            };
            return ymd(&year, &caps[2], &caps[1]);
        }

        let lower = trimmed.to_lowercase();
        if let Some(date) = self.relative_phrase(&lower, true) {
            return Some(date);
        }

        self.parse_textual_date(&lower)
    }

    /// Find a relative date phrase anywhere in free text.
    pub fn relative_date_in(&self, text: &str) -> Option<NaiveDate> {
        self.relative_phrase(&text.to_lowercase(), false)
    }

    fn relative_phrase(&self, lower: &str, whole: bool) -> Option<NaiveDate> {
        let has = |phrase: &str| {
            if whole {
                lower.trim() == phrase
            } else {
                contains_phrase(lower, phrase)
            }
        };

        // "day after tomorrow" must be checked before "tomorrow".
        if has("day after tomorrow") || has("the day after tomorrow") {
            return Some(self.today + Duration::days(2));
        }
        if has("tomorrow") {
            return Some(self.today + Duration::days(1));
        }
        if has("today") {
            return Some(self.today);
        }

        let weekday = if whole {
            let stripped = lower
                .trim()
                .trim_start_matches("next ")
                .trim_start_matches("this ")
                .trim_start_matches("on ");
            WEEKDAY_PHRASE
                .captures(stripped)
                .filter(|c| c.get(0).map(|m| m.as_str()) == Some(stripped))
        } else {
            WEEKDAY_PHRASE.captures(lower)
        };
        if let Some(caps) = weekday {
            if let Some(target) = parse_weekday(&caps[1]) {
                return Some(self.next_weekday(target));
            }
        }

        if has("next week") {
            return Some(self.today + Duration::days(7));
        }
        None
    }

    /// Next occurrence of `weekday` strictly after today.
    fn next_weekday(&self, weekday: Weekday) -> NaiveDate {
        let today = self.today.weekday().num_days_from_monday() as i64;
        let target = weekday.num_days_from_monday() as i64;
        let mut delta = (target - today).rem_euclid(7);
        if delta == 0 {
            delta = 7;
        }
        self.today + Duration::days(delta)
    }

    /// Free-form fallback: a month name, a day number and an optional year in
    /// any order ("22 sep", "September 22nd, 2026", "fri 22 of sept").
    fn parse_textual_date(&self, lower: &str) -> Option<NaiveDate> {
        let cleaned = ORDINAL_SUFFIX.replace_all(lower, "$1");
        let mut month = None;
        let mut day = None;
        let mut year = None;

        for token in cleaned.split(|c: char| c.is_whitespace() || c == ',' || c == '-' || c == '/') {
            let token = token.trim_matches('.');
            if token.is_empty() || token == "of" || token == "the" {
                continue;
            }
            if let Ok(n) = token.parse::<u32>() {
                if token.len() == 4 && year.is_none() {
                    year = Some(n as i32);
                } else if token.len() <= 2 && day.is_none() {
                    day = Some(n);
                } else {
                    return None;
                }
            } else if let Some(m) = month_from_name(token) {
                if month.replace(m).is_some() {
                    return None;
                }
            } else if parse_weekday(token).is_none() && !is_weekday_abbrev(token) {
                return None;
            }
        }

        NaiveDate::from_ymd_opt(year.unwrap_or(self.today.year()), month?, day?)
    }

    /// Normalize a time to 24-hour `HH:MM`, or return the input unchanged.
    pub fn normalize_time(&self, text: &str) -> String {
        normalize_time(text)
    }
}

/// Normalize a time to 24-hour `HH:MM`, or return the input unchanged.
pub fn normalize_time(text: &str) -> String {
    match parse_time(text) {
        Some(time) => time.format(TIME_FORMAT).to_string(),
        None => text.to_string(),
    }
}

/// Parse a time phrase.
///
/// A bare `N o'clock` without am/pm leans towards clinic daytime: 1 to 7
/// are read as afternoon (13:00 to 19:00), 8 to 12 as written.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let lower = text.trim().to_lowercase().replace(['\u{2019}', '`'], "'");

    match lower.as_str() {
        "noon" | "midday" | "12 noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    if let Some(caps) = TWELVE_HOUR.captures(&lower) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute = minutes(caps.get(2).map(|m| m.as_str()))?;
        return twelve_hour(hour, minute, &caps[3]);
    }

    if let Some(caps) = OCLOCK.captures(&lower) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute = minutes(caps.get(2).map(|m| m.as_str()))?;
        return match caps.get(3) {
            Some(meridiem) => twelve_hour(hour, minute, meridiem.as_str()),
            None => {
                let hour = if (1..=7).contains(&hour) { hour + 12 } else { hour };
                NaiveTime::from_hms_opt(hour, minute, 0)
            }
        };
    }

    if let Some(caps) = TWENTY_FOUR_HOUR.captures(&lower) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }

    None
}

fn minutes(raw: Option<&str>) -> Option<u32> {
    match raw {
        Some(m) => m.parse().ok().filter(|m| *m < 60),
        None => Some(0),
    }
}

fn twelve_hour(hour: u32, minute: u32, meridiem: &str) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (meridiem, hour) {
        ("a", 12) => 0,
        ("a", h) => h,
        ("p", 12) => 12,
        (_, h) => h + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Month number from a full name or an abbreviation of at least 3 letters.
pub fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(token))
        .map(|i| i as u32 + 1)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn is_weekday_abbrev(token: &str) -> bool {
    matches!(
        token,
        "mon" | "tue" | "tues" | "wed" | "thu" | "thur" | "thurs" | "fri" | "sat" | "sun"
    )
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
