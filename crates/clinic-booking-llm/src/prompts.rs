//! Prompts for appointment slot extraction.
//!
//! The model receives the full clinic context (name, address, hours, contact
//! and doctor roster) plus the running conversation, and is asked for a fixed
//! `key: value` block followed by a conversational reply.

/// Clinic facts the model needs to answer questions and extract fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClinicContext {
    pub name: String,
    pub address: String,
    pub hours: String,
    pub contact: String,
    pub doctors: Vec<DoctorSummary>,
}

/// One roster line in the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorSummary {
    pub name: String,
    pub specialization: String,
    pub slots: Vec<String>,
}

impl ClinicContext {
    /// Render the doctor roster, one doctor per line.
    pub fn doctors_list(&self) -> String {
        self.doctors
            .iter()
            .map(|d| {
                format!(
                    "- {} ({}): Available at {}",
                    d.name,
                    d.specialization,
                    d.slots.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// System prompt for the booking assistant.
pub fn make_system_prompt(clinic: &ClinicContext) -> String {
    format!(
        r#"You are a friendly and helpful assistant at {name}. Your primary role is to help patients with:
1. Providing information about the clinic, doctors, services and hours.
2. Helping patients book appointments when they are ready.

Clinic Information:
- Name: {name}
- Address: {address}
- Hours: {hours}
- Contact: {contact}

Available Doctors:
{doctors}

Be natural and conversational. If the patient provides appointment information
(name, age, doctor, date, time), note it and ask for any missing pieces.

For dates, a partial date like "22 sep" means the current year. Resolve
"tomorrow" or "day after tomorrow" yourself and state the date you assumed.
For times, use 24-hour HH:MM ("9am" is "09:00", "3pm" is "15:00"). A bare
"N o'clock" means daytime ("9 o'clock" is "09:00", "3 o'clock" is "15:00").
Never accept dates that have passed, dates that do not exist (30 feb), or
times outside the clinic hours ({hours})."#,
        name = clinic.name,
        address = clinic.address,
        hours = clinic.hours,
        contact = clinic.contact,
        doctors = clinic.doctors_list(),
    )
}

/// User prompt for one conversation turn.
///
/// `collected` is the slot state gathered so far, rendered as `key: value`
/// lines; `history` is the prior conversation as `Human:`/`Assistant:` lines.
pub fn make_extraction_prompt(user_input: &str, history: &str, collected: &str) -> String {
    format!(
        r#"Conversation History:
{history}

Already collected:
{collected}

User Input: {user_input}

Respond in exactly this format:
Extracted:
name: [extracted name or empty]
age: [extracted age or empty]
doctor: [extracted doctor name or empty]
date: [extracted date or empty]
time: [extracted time or empty]
missing: [comma-separated list of missing fields or none]
Reply:
[your friendly reply to the patient]"#,
        history = if history.trim().is_empty() { "(none)" } else { history },
        collected = if collected.trim().is_empty() { "(nothing yet)" } else { collected },
        user_input = user_input,
    )
}
