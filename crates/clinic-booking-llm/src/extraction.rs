//! Structured field extraction from model replies.
//!
//! The model is asked for a `key: value` block. Parsing is strict and
//! line-oriented: recognised keys fill a typed record, everything else is
//! treated as conversational text. Nothing in a reply can make parsing fail.

use serde::{Deserialize, Serialize};

use crate::client::{LanguageModel, ModelResult};
use crate::prompts::{make_extraction_prompt, make_system_prompt, ClinicContext};

/// Sentinel the prompt asks the model to use for unknown fields.
pub const EMPTY_MARKER: &str = "empty";

/// Fields a model reply may carry. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub age: Option<String>,
    pub doctor: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl ExtractedFields {
    /// True if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.doctor.is_none()
            && self.date.is_none()
            && self.time.is_none()
    }

    /// Fields as `(key, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name", self.name.as_deref()),
            ("age", self.age.as_deref()),
            ("doctor", self.doctor.as_deref()),
            ("date", self.date.as_deref()),
            ("time", self.time.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
    }

    fn slot_mut(&mut self, key: FieldKey) -> Option<&mut Option<String>> {
        match key {
            FieldKey::Name => Some(&mut self.name),
            FieldKey::Age => Some(&mut self.age),
            FieldKey::Doctor => Some(&mut self.doctor),
            FieldKey::Date => Some(&mut self.date),
            FieldKey::Time => Some(&mut self.time),
            FieldKey::Missing | FieldKey::Reply | FieldKey::Header => None,
        }
    }
}

/// Parsed model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReply {
    /// Structured fields from the `key: value` block
    pub fields: ExtractedFields,
    /// Fields the model reported as still missing
    pub missing: Vec<String>,
    /// Conversational text meant for the patient
    pub reply: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKey {
    Name,
    Age,
    Doctor,
    Date,
    Time,
    Missing,
    Reply,
    Header,
}

fn field_key(raw: &str) -> Option<FieldKey> {
    let key = raw
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '`')
        .trim()
        .to_lowercase()
        .replace('_', " ");

    match key.as_str() {
        "name" | "patient name" => Some(FieldKey::Name),
        "age" | "patient age" => Some(FieldKey::Age),
        "doctor" | "doctor name" => Some(FieldKey::Doctor),
        "date" | "appointment date" => Some(FieldKey::Date),
        "time" | "appointment time" => Some(FieldKey::Time),
        "missing" | "missing fields" => Some(FieldKey::Missing),
        "reply" | "response" => Some(FieldKey::Reply),
        "extracted" => Some(FieldKey::Header),
        _ => None,
    }
}

/// Strip placeholder decoration and map sentinel values to `None`.
fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_matches(|c: char| c == '[' || c == ']' || c == '"' || c == '\'' || c == '*')
        .trim();

    if value.is_empty()
        || value.eq_ignore_ascii_case(EMPTY_MARKER)
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("n/a")
    {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a model reply into structured fields and conversational text.
pub fn parse_model_reply(text: &str) -> ModelReply {
    let mut out = ModelReply::default();
    let mut reply_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim().trim_start_matches(['-', '*', '•']).trim_start();

        let parsed = trimmed
            .split_once(':')
            .and_then(|(k, v)| field_key(k).map(|key| (key, v)));

        match parsed {
            Some((FieldKey::Header, _)) => {}
            Some((FieldKey::Reply, rest)) => {
                if !rest.trim().is_empty() {
                    reply_lines.push(rest.trim());
                }
            }
            Some((FieldKey::Missing, rest)) => {
                out.missing = clean_value(rest)
                    .map(|v| {
                        v.split(',')
                            .map(|f| f.trim().to_lowercase())
                            .filter(|f| !f.is_empty())
                            .collect()
                    })
                    .unwrap_or_default();
            }
            Some((key, rest)) => {
                // Later non-empty values win; sentinels never clear an earlier value.
                if let (Some(slot), Some(value)) = (out.fields.slot_mut(key), clean_value(rest)) {
                    *slot = Some(value);
                }
            }
            None => reply_lines.push(line.trim_end()),
        }
    }

    out.reply = reply_lines.join("\n").trim().to_string();
    out
}

/// Run one extraction turn against a model.
pub fn request_extraction(
    model: &dyn LanguageModel,
    clinic: &ClinicContext,
    user_input: &str,
    history: &str,
    collected: &str,
) -> ModelResult<ModelReply> {
    let system = make_system_prompt(clinic);
    let prompt = make_extraction_prompt(user_input, history, collected);
    let raw = model.generate(&system, &prompt)?;

    if raw.trim().is_empty() {
        return Err(crate::client::ModelError::EmptyResponse);
    }

    Ok(parse_model_reply(&raw))
}
