//! Slot extraction from free text.
//!
//! Two strategies implement [`SlotExtractor`]: [`PatternExtractor`] (regex
//! triggers, always available) and [`ModelAssistedExtractor`] (delegates to
//! the language model). [`extract_all`] runs them in order, each seeing the
//! slots accumulated so far, and merges field by field so a later pass can
//! replace a value but never clear one.

mod assisted;
mod intent;
mod patterns;

pub use assisted::*;
pub use intent::*;
pub use patterns::*;

use crate::models::SlotMap;
use crate::resolver::Normalizer;

/// One inbound message and its context.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub text: &'a str,
    /// Anchored at the message's arrival date
    pub normalizer: Normalizer,
    /// Prior conversation as `Human:` / `Assistant:` lines
    pub history: &'a str,
}

/// Output of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Only the fields this pass found
    pub slots: SlotMap,
    /// Conversational reply, if the strategy produces one
    pub reply: Option<String>,
}

/// A strategy mapping `(text, prior slots)` to newly found fields.
pub trait SlotExtractor: Send + Sync {
    fn extract(&self, turn: &Turn<'_>, prior: &SlotMap) -> Extraction;

    fn name(&self) -> &str;
}

/// Run extractors in order and merge their findings into a copy of `prior`.
///
/// The reply of the last extractor that produced one is kept.
pub fn extract_all(extractors: &[&dyn SlotExtractor], turn: &Turn<'_>, prior: &SlotMap) -> Extraction {
    let mut merged = prior.clone();
    let mut reply = None;

    for extractor in extractors {
        let found = extractor.extract(turn, &merged);
        tracing::debug!(
            extractor = extractor.name(),
            fields = ?found.slots.iter().map(|(f, _)| f.as_str()).collect::<Vec<_>>(),
            "Extraction pass"
        );
        merged.merge(&found.slots);
        if found.reply.is_some() {
            reply = found.reply;
        }
    }

    Extraction {
        slots: merged,
        reply,
    }
}

const NAME_STOPS: [&str; 17] = [
    " and ", " i am", " i'm", " im ", " i want", " i would", " i need", " i'd", " with ",
    " for ", " on ", " at ", " to ", " age ", " aged ", " please", " from ",
];

/// Cut a captured name at the first trailing connective.
///
/// "Priya Nair and I am 34" becomes "Priya Nair".
pub fn clean_name(raw: &str) -> String {
    let padded = format!(" {} ", raw.trim());
    let lower = padded.to_ascii_lowercase();
    let cut = NAME_STOPS
        .iter()
        .filter_map(|stop| lower.find(stop))
        .min()
        .unwrap_or(padded.len());

    padded[..cut]
        .trim()
        .trim_end_matches(['.', ',', '-', '\''])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotField;
    use chrono::NaiveDate;

    struct Fixed(&'static [(SlotField, &'static str)], Option<&'static str>);

    impl SlotExtractor for Fixed {
        fn extract(&self, _turn: &Turn<'_>, _prior: &SlotMap) -> Extraction {
            let mut slots = SlotMap::new();
            for (field, value) in self.0 {
                slots.set(*field, value);
            }
            Extraction {
                slots,
                reply: self.1.map(str::to_string),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn turn(text: &str) -> Turn<'_> {
        Turn {
            text,
            normalizer: Normalizer::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            history: "",
        }
    }

    #[test]
    fn test_later_pass_replaces_but_never_clears() {
        let first = Fixed(&[(SlotField::Name, "Priya"), (SlotField::Age, "34")], None);
        let second = Fixed(
            &[(SlotField::Name, "Priya Nair"), (SlotField::Age, "empty")],
            Some("Thanks!"),
        );

        let mut prior = SlotMap::new();
        prior.set(SlotField::Doctor, "Dr. Asha Rao");

        let out = extract_all(&[&first, &second], &turn("hi"), &prior);

        assert_eq!(out.slots.get(SlotField::Name), Some("Priya Nair"));
        assert_eq!(out.slots.get(SlotField::Age), Some("34"));
        assert_eq!(out.slots.get(SlotField::Doctor), Some("Dr. Asha Rao"));
        assert_eq!(out.reply.as_deref(), Some("Thanks!"));
    }

    #[test]
    fn test_reply_from_last_producer() {
        let a = Fixed(&[], Some("first"));
        let b = Fixed(&[], None);

        let out = extract_all(&[&a, &b], &turn("hi"), &SlotMap::new());
        assert_eq!(out.reply.as_deref(), Some("first"));
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Priya Nair and I am 34"), "Priya Nair");
        assert_eq!(clean_name("John I'm 40"), "John");
        assert_eq!(clean_name("Sam Lee i want to book"), "Sam Lee");
        assert_eq!(clean_name("Anand Kumar"), "Anand Kumar");
        assert_eq!(clean_name("Maria."), "Maria");
        assert_eq!(clean_name("Tom with Dr Rao"), "Tom");
    }
}
