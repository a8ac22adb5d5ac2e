//! Conversation session and slot models.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::appointment::Appointment;

/// A named field of the appointment being collected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotField {
    Name,
    Age,
    Doctor,
    Date,
    Time,
}

impl SlotField {
    /// Required fields, in prompt order.
    pub const ALL: [SlotField; 5] = [
        SlotField::Name,
        SlotField::Age,
        SlotField::Doctor,
        SlotField::Date,
        SlotField::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotField::Name => "name",
            SlotField::Age => "age",
            SlotField::Doctor => "doctor",
            SlotField::Date => "date",
            SlotField::Time => "time",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "name" => Some(SlotField::Name),
            "age" => Some(SlotField::Age),
            "doctor" => Some(SlotField::Doctor),
            "date" => Some(SlotField::Date),
            "time" => Some(SlotField::Time),
            _ => None,
        }
    }
}

impl fmt::Display for SlotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values collected so far. Presence is the signal; order is irrelevant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotMap {
    values: BTreeMap<SlotField, String>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: SlotField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: SlotField) -> bool {
        self.values.contains_key(&field)
    }

    /// Set a field. Blank values and the "empty" sentinel are ignored, so a
    /// set never clears a field. Returns true if the stored value changed.
    pub fn set(&mut self, field: SlotField, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(clinic_booking_llm::EMPTY_MARKER) {
            return false;
        }
        if self.get(field) == Some(value) {
            return false;
        }
        self.values.insert(field, value.to_string());
        true
    }

    /// Retract a field.
    pub fn remove(&mut self, field: SlotField) -> Option<String> {
        self.values.remove(&field)
    }

    /// Merge `other` field by field; the last non-empty write wins.
    pub fn merge(&mut self, other: &SlotMap) -> bool {
        let mut changed = false;
        for (field, value) in &other.values {
            changed |= self.set(*field, value);
        }
        changed
    }

    /// Required fields not yet collected, in prompt order.
    pub fn missing(&self) -> Vec<SlotField> {
        SlotField::ALL
            .into_iter()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotField, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `key: value` lines for model context.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Conversation phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No slots yet
    Greeting,
    /// Some required fields outstanding
    Collecting,
    /// Draft built and validated, awaiting affirmation
    Confirmation,
    /// Committed; the session is reset immediately after
    Booked,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Greeting => "greeting",
            Phase::Collecting => "collecting",
            Phase::Confirmation => "confirmation",
            Phase::Booked => "booked",
        }
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Per-session conversation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSession {
    /// Opaque session key
    pub id: String,
    pub phase: Phase,
    pub slots: SlotMap,
    /// At most one pending draft at a time
    pub draft: Option<Appointment>,
    pub history: Vec<ChatTurn>,
    pub created_at: String,
    pub updated_at: String,
}

impl ConversationSession {
    /// Create a fresh session in the greeting phase.
    pub fn new(id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            phase: Phase::Greeting,
            slots: SlotMap::new(),
            draft: None,
            history: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Return to a fresh greeting state, keeping the session key.
    pub fn reset(&mut self) {
        self.phase = Phase::Greeting;
        self.slots = SlotMap::new();
        self.draft = None;
        self.history.clear();
        self.touch();
    }

    /// Record a turn, keeping at most `max_turns` user/assistant pairs.
    pub fn push_turn(&mut self, role: Role, content: &str, max_turns: usize) {
        self.history.push(ChatTurn {
            role,
            content: content.to_string(),
        });
        let limit = max_turns.saturating_mul(2);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    /// History as `Human:` / `Assistant:` lines.
    pub fn history_text(&self) -> String {
        self.history
            .iter()
            .map(|turn| match turn.role {
                Role::User => format!("Human: {}", turn.content),
                Role::Assistant => format!("Assistant: {}", turn.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_lists_every_field() {
        let mut slots = SlotMap::new();
        slots.set(SlotField::Age, "30");
        slots.set(SlotField::Time, "10:00");

        assert_eq!(
            slots.missing(),
            vec![SlotField::Name, SlotField::Doctor, SlotField::Date]
        );
        assert!(!slots.is_complete());
    }

    #[test]
    fn test_set_ignores_empty_and_sentinel() {
        let mut slots = SlotMap::new();
        slots.set(SlotField::Name, "Priya");

        assert!(!slots.set(SlotField::Name, "  "));
        assert!(!slots.set(SlotField::Name, "empty"));
        assert!(!slots.set(SlotField::Name, "EMPTY"));
        assert_eq!(slots.get(SlotField::Name), Some("Priya"));
    }

    #[test]
    fn test_merge_last_non_empty_wins() {
        let mut prior = SlotMap::new();
        prior.set(SlotField::Name, "Priya");
        prior.set(SlotField::Date, "2026-10-20");

        let mut later = SlotMap::new();
        later.set(SlotField::Date, "2026-10-21");
        later.set(SlotField::Time, "10:00");

        assert!(prior.merge(&later));
        assert_eq!(prior.get(SlotField::Name), Some("Priya"));
        assert_eq!(prior.get(SlotField::Date), Some("2026-10-21"));
        assert_eq!(prior.get(SlotField::Time), Some("10:00"));
        assert!(!prior.merge(&later));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut session = ConversationSession::new("s1");
        for i in 0..5 {
            session.push_turn(Role::User, &format!("q{}", i), 2);
            session.push_turn(Role::Assistant, &format!("a{}", i), 2);
        }

        assert_eq!(session.history.len(), 4);
        assert_eq!(session.history_text(), "Human: q3\nAssistant: a3\nHuman: q4\nAssistant: a4");
    }

    #[test]
    fn test_reset_clears_everything_but_id() {
        let mut session = ConversationSession::new("s1");
        session.slots.set(SlotField::Name, "Priya");
        session.phase = Phase::Confirmation;
        session.push_turn(Role::User, "hi", 10);

        session.reset();
        assert_eq!(session.id, "s1");
        assert_eq!(session.phase, Phase::Greeting);
        assert!(session.slots.is_empty());
        assert!(session.draft.is_none());
        assert!(session.history.is_empty());
    }

    fn field() -> impl Strategy<Value = SlotField> {
        prop::sample::select(SlotField::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn merge_never_drops_a_field(
            prior in prop::collection::vec((field(), "[a-z0-9]{1,8}"), 0..5),
            update in prop::collection::vec((field(), "[a-z0-9 ]{0,8}"), 0..5),
        ) {
            let mut slots = SlotMap::new();
            for (f, v) in &prior {
                slots.set(*f, v);
            }
            let before = slots.clone();

            let mut incoming = SlotMap::new();
            for (f, v) in &update {
                incoming.set(*f, v);
            }
            slots.merge(&incoming);

            for (f, v) in before.iter() {
                prop_assert!(slots.contains(f));
                if !incoming.contains(f) {
                    prop_assert_eq!(slots.get(f), Some(v));
                }
            }
        }
    }
}
