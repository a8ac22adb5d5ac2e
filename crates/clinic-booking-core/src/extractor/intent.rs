//! Keyword intent heuristics.
//!
//! Single words match whole tokens (so "ok" does not fire inside "book");
//! stems match token prefixes ("booking", "scheduled"); phrases match on
//! word boundaries.

const BOOKING_STEMS: [&str; 5] = ["book", "appointment", "schedul", "reserv", "confirm"];

const BOOKING_WORDS: [&str; 10] = [
    "yes", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "absolutely", "definitely",
];

const BOOKING_PHRASES: [&str; 5] = ["see a doctor", "meet with", "visit doctor", "go ahead", "sounds good"];

const INFO_WORDS: [&str; 9] = [
    "info", "information", "details", "about", "explain", "describe", "know", "hours", "address",
];

const INFO_PHRASES: [&str; 6] = ["tell me", "what is", "who is", "what are", "which doctors", "where is"];

const CANCEL_STEMS: [&str; 2] = ["cancel", "nevermind"];

const CANCEL_PHRASES: [&str; 4] = ["start over", "never mind", "forget it", "don't book"];

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_phrase(text: &str, phrases: &[&str]) -> bool {
    let normalized = format!(" {} ", tokens(text).join(" "));
    phrases
        .iter()
        .any(|p| normalized.contains(&format!(" {} ", p)))
}

/// Whether the message asks to book or affirms a pending booking.
pub fn has_booking_intent(text: &str) -> bool {
    let tokens = tokens(text);
    tokens.iter().any(|t| {
        BOOKING_WORDS.contains(&t.as_str()) || BOOKING_STEMS.iter().any(|s| t.starts_with(s))
    }) || has_phrase(text, &BOOKING_PHRASES)
}

/// Whether the message asks about the clinic or its doctors.
pub fn has_info_intent(text: &str) -> bool {
    tokens(text).iter().any(|t| INFO_WORDS.contains(&t.as_str())) || has_phrase(text, &INFO_PHRASES)
}

/// Whether the message abandons the booking in progress.
///
/// A bare refusal ("no", "nope") counts only as the first word.
pub fn has_cancel_intent(text: &str) -> bool {
    let tokens = tokens(text);
    if matches!(tokens.first().map(String::as_str), Some("no" | "nope" | "nah")) {
        return true;
    }
    tokens
        .iter()
        .any(|t| CANCEL_STEMS.iter().any(|s| t.starts_with(s)))
        || has_phrase(text, &CANCEL_PHRASES)
}
