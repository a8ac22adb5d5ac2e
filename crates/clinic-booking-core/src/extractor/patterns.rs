//! Regex-driven slot extraction.

use std::sync::LazyLock;

use regex::Regex;

use super::{clean_name, has_booking_intent, Extraction, SlotExtractor, Turn};
use crate::models::{SlotField, SlotMap};
use crate::resolver::{parse_time, DATE_FORMAT, TIME_FORMAT};

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:my name is|name is|name's|call me)\s+([a-z][a-z '-]*)").unwrap()
});

/// "This is Anand Kumar": only capitalized words, so "this is correct" is not a name.
static THIS_IS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:this is)\s+([A-Z][a-zA-Z'-]*(?:\s+[A-Z][a-zA-Z'-]*){0,2})").unwrap()
});

static AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:age(?:d)?(?:\s+is)?|i am|i'm)\s*:?\s*(\d{1,3})\b(?:\s*(?:years?|yrs?)\b)?")
        .unwrap()
});

static AGE_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*(?:years?|yrs?)(?:\s+old)?\b").unwrap());

static DOCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:dr\b\.?\s*|doctor\s+|dctor\s+)([a-z][a-z'-]*(?:\s+[a-z][a-z'-]*){0,2})").unwrap()
});

/// "with Rao": only capitalized words, so "with my mother" is not a doctor.
static WITH_DOCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[Ww]ith\s+([A-Z][a-zA-Z'-]*(?:\s+[A-Z][a-zA-Z'-]*){0,2})").unwrap()
});

static DATE_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}[-/.]\d{1,2}[-/.]\d{1,2}\b").unwrap());

static DATE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}(?:/\d{1,2}(?:/\d{2,4})?|\.\d{1,2}\.\d{2,4}|-\d{1,2}-\d{2,4})\b").unwrap()
});

static DATE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:,?\s+\d{4})?\b",
    )
    .unwrap()
});

static DATE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?\b(?:,?\s+\d{4}\b)?",
    )
    .unwrap()
});

static TIME_MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?:[:.]\d{2})?\s*[ap]\.?\s*m\b\.?").unwrap()
});

static TIME_OCLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?:[:.]\d{2})?\s*o['\u{2019}]?\s*clock(?:\s*[ap]\.?\s*m\b\.?)?").unwrap()
});

static TIME_24H: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap());

static TIME_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:noon|midday|midnight)\b").unwrap());

/// Words that end a captured doctor name.
const DOCTOR_STOPS: [&str; 32] = [
    "on", "at", "for", "tomorrow", "today", "next", "please", "and", "i", "my", "to", "in", "this",
    "the", "appointment", "around", "by", "is", "who", "about", "tonight", "with", "do", "does",
    "are", "you", "can", "could", "would", "will", "available", "there",
];

/// Regex trigger-phrase extractor.
///
/// Dates and times are stored canonical when they parse; a field is only
/// written when a trigger matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    fn patient_name(text: &str) -> Option<String> {
        if let Some(caps) = NAME.captures(text) {
            let name = clean_name(&caps[1]);
            return (!name.is_empty()).then_some(name);
        }

        // An affirmation ("Yes, this is right") never introduces a name.
        if has_booking_intent(text) {
            return None;
        }
        let caps = THIS_IS_NAME.captures(text)?;
        let name = clean_name(&caps[1]);
        let first = name.split_whitespace().next()?.to_lowercase();
        (!matches!(first.as_str(), "dr" | "doctor")).then_some(name)
    }

    fn age(text: &str) -> Option<String> {
        AGE.captures(text)
            .or_else(|| AGE_YEARS.captures(text))
            .map(|caps| caps[1].to_string())
    }

    fn doctor(text: &str) -> Option<String> {
        let from_title = DOCTOR
            .captures_iter(text)
            .filter_map(|caps| cut_at_stop(&caps[1]))
            .next();

        from_title.or_else(|| {
            WITH_DOCTOR
                .captures_iter(text)
                .filter_map(|caps| cut_at_stop(&caps[1]))
                .next()
        })
    }

    fn date(turn: &Turn<'_>) -> Option<String> {
        let explicit = [&*DATE_ISO, &*DATE_NUMERIC, &*DATE_DAY_MONTH, &*DATE_MONTH_DAY]
            .into_iter()
            .flat_map(|re| re.find_iter(turn.text))
            .find_map(|m| turn.normalizer.parse_date(m.as_str()));

        explicit
            .or_else(|| turn.normalizer.relative_date_in(turn.text))
            .map(|date| date.format(DATE_FORMAT).to_string())
    }

    fn time(text: &str) -> Option<String> {
        [&*TIME_MERIDIEM, &*TIME_OCLOCK, &*TIME_24H, &*TIME_WORDS]
            .into_iter()
            .flat_map(|re| re.find_iter(text))
            .find_map(|m| parse_time(m.as_str()))
            .map(|time| time.format(TIME_FORMAT).to_string())
    }
}

impl SlotExtractor for PatternExtractor {
    fn extract(&self, turn: &Turn<'_>, _prior: &SlotMap) -> Extraction {
        let mut slots = SlotMap::new();

        let found = [
            (SlotField::Name, Self::patient_name(turn.text)),
            (SlotField::Age, Self::age(turn.text)),
            (SlotField::Doctor, Self::doctor(turn.text)),
            (SlotField::Date, Self::date(turn)),
            (SlotField::Time, Self::time(turn.text)),
        ];
        for (field, value) in found {
            if let Some(value) = value {
                slots.set(field, &value);
            }
        }

        Extraction { slots, reply: None }
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

/// Keep leading words up to the first stop word.
fn cut_at_stop(captured: &str) -> Option<String> {
    let words: Vec<&str> = captured
        .split_whitespace()
        .take_while(|w| !DOCTOR_STOPS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Normalizer;
    use chrono::NaiveDate;

    fn extract(text: &str) -> SlotMap {
        let turn = Turn {
            text,
            normalizer: Normalizer::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            history: "",
        };
        PatternExtractor::new().extract(&turn, &SlotMap::new()).slots
    }

    #[test]
    fn test_full_sentence() {
        let slots = extract("Hi, my name is Priya Nair and I am 34. I'd like to see Dr. Rao on 22 Oct at 10:30 am");

        assert_eq!(slots.get(SlotField::Name), Some("Priya Nair"));
        assert_eq!(slots.get(SlotField::Age), Some("34"));
        assert_eq!(slots.get(SlotField::Doctor), Some("Rao"));
        assert_eq!(slots.get(SlotField::Date), Some("2026-10-22"));
        assert_eq!(slots.get(SlotField::Time), Some("10:30"));
    }

    #[test]
    fn test_name_variants() {
        assert_eq!(extract("call me Sam").get(SlotField::Name), Some("Sam"));
        assert_eq!(extract("This is Anand Kumar, 41 years old").get(SlotField::Name), Some("Anand Kumar"));
        assert_eq!(extract("I am 34").get(SlotField::Name), None);
    }

    #[test]
    fn test_this_is_needs_a_capitalized_name() {
        assert_eq!(extract("Yes, this is correct").get(SlotField::Name), None);
        assert_eq!(extract("this is urgent").get(SlotField::Name), None);
        assert_eq!(extract("This is Dr. Rao's office?").get(SlotField::Name), None);
        assert_eq!(extract("Yes, this is Priya").get(SlotField::Name), None);
        assert_eq!(extract("Hello, this is Priya Nair").get(SlotField::Name), Some("Priya Nair"));
    }

    #[test]
    fn test_age_variants() {
        assert_eq!(extract("age: 52").get(SlotField::Age), Some("52"));
        assert_eq!(extract("I'm 29").get(SlotField::Age), Some("29"));
        assert_eq!(extract("he is 7 years old").get(SlotField::Age), Some("7"));
        assert_eq!(extract("at 10 am").get(SlotField::Age), None);
    }

    #[test]
    fn test_doctor_variants() {
        assert_eq!(extract("dr smith tomorrow").get(SlotField::Doctor), Some("smith"));
        assert_eq!(extract("Doctor Asha Rao please").get(SlotField::Doctor), Some("Asha Rao"));
        assert_eq!(extract("an appointment with Smith").get(SlotField::Doctor), Some("Smith"));
        assert_eq!(extract("with my mother").get(SlotField::Doctor), None);
        assert_eq!(extract("a doctor appointment").get(SlotField::Doctor), None);
        assert_eq!(extract("Dr.Rao").get(SlotField::Doctor), Some("Rao"));
        assert_eq!(extract("which doctors are free?").get(SlotField::Doctor), None);
        assert_eq!(extract("is the doctor available").get(SlotField::Doctor), None);
    }

    #[test]
    fn test_dates() {
        assert_eq!(extract("on 22 sep").get(SlotField::Date), Some("2026-09-22"));
        assert_eq!(extract("October 20th works").get(SlotField::Date), Some("2026-10-20"));
        assert_eq!(extract("2026-11-02 please").get(SlotField::Date), Some("2026-11-02"));
        assert_eq!(extract("on 20/10/2026").get(SlotField::Date), Some("2026-10-20"));
        assert_eq!(extract("day after tomorrow").get(SlotField::Date), Some("2026-10-18"));
        assert_eq!(extract("tomorrow at 3pm").get(SlotField::Date), Some("2026-10-17"));
        assert_eq!(extract("on 30 feb").get(SlotField::Date), None);
    }

    #[test]
    fn test_times() {
        assert_eq!(extract("at 3pm").get(SlotField::Time), Some("15:00"));
        assert_eq!(extract("around 9.30 a.m.").get(SlotField::Time), Some("09:30"));
        assert_eq!(extract("4 o'clock").get(SlotField::Time), Some("16:00"));
        assert_eq!(extract("at 14:30").get(SlotField::Time), Some("14:30"));
        assert_eq!(extract("at noon").get(SlotField::Time), Some("12:00"));
        assert_eq!(extract("22.10.2026").get(SlotField::Time), None);
    }

    #[test]
    fn test_nothing_found() {
        assert!(extract("What are your opening hours?").is_empty());
    }
}
