//! Fixed assistant messages.

use crate::booking::ValidationError;
use crate::models::{Appointment, Clinic, SlotField};
use crate::resolver::Directory;

pub const SAVE_FAILED: &str = "Sorry, there was an error saving your appointment. Please try again.";

pub const CANCELLED: &str =
    "No problem, I've cancelled that booking. Is there anything else I can help you with?";

pub const READY_TO_BOOK: &str =
    "I have all the details I need. Would you like me to book this appointment?";

pub fn greeting(clinic: &Clinic) -> String {
    format!(
        "Hello! Welcome to {}. I can tell you about our doctors and services, or help you book an appointment. How can I help you today?",
        clinic.name
    )
}

pub fn clinic_info(directory: &Directory) -> String {
    let clinic = directory.clinic();
    format!(
        "{} is located at {}. Hours: {}. Contact: {}.\n\nOur doctors:\n{}",
        clinic.name,
        clinic.address,
        clinic.hours,
        clinic.contact,
        directory.context().doctors_list()
    )
}

fn field_label(field: SlotField) -> &'static str {
    match field {
        SlotField::Name => "name",
        SlotField::Age => "age",
        SlotField::Doctor => "preferred doctor",
        SlotField::Date => "preferred date",
        SlotField::Time => "preferred time",
    }
}

/// Prompt naming every missing field.
pub fn missing_info(missing: &[SlotField]) -> String {
    let labels: Vec<&str> = missing.iter().map(|f| field_label(*f)).collect();
    let list = match labels.as_slice() {
        [] => return READY_TO_BOOK.to_string(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    };
    format!("To book your appointment, I still need your {}.", list)
}

pub fn confirmation_prompt(draft: &Appointment) -> String {
    format!(
        "Please confirm your appointment details:\n{}\n\nShall I go ahead and book it? (yes/no)",
        draft.summary()
    )
}

pub fn unknown_doctor(input: &str, directory: &Directory) -> String {
    format!(
        "I couldn't find a doctor named '{}'. Please choose from our available doctors: {}",
        input,
        directory.doctor_names().join(", ")
    )
}

pub fn confirmed(appointment_id: &str) -> String {
    format!("Appointment confirmed! Your appointment ID is: {}", appointment_id)
}

pub fn conflict(draft: &Appointment, alternatives: &[String]) -> String {
    if alternatives.is_empty() {
        format!(
            "This time slot is already booked. {} has no available slots on {}.",
            draft.doctor_name, draft.date
        )
    } else {
        format!(
            "This time slot is already booked. Available slots for {} on {}: {}",
            draft.doctor_name,
            draft.date,
            alternatives.join(", ")
        )
    }
}

pub fn invalid(error: &ValidationError, directory: &Directory) -> String {
    let hours = &directory.clinic().hours;
    match error {
        ValidationError::UnknownDoctor(name) => unknown_doctor(name, directory),
        ValidationError::InvalidAge(_) => "Please tell me your age as a number.".to_string(),
        ValidationError::InvalidDate(date) => format!(
            "I couldn't understand the date '{}'. Please give a date like 22 Sep or 2026-09-22.",
            date
        ),
        ValidationError::PastDate(_) => {
            "That date has already passed. Please choose a future date.".to_string()
        }
        ValidationError::ClinicClosed(date) => format!(
            "The clinic is closed on {} (hours: {}). Please choose another date.",
            date, hours
        ),
        ValidationError::InvalidTime(time) => format!(
            "I couldn't understand the time '{}'. Please give a time like 10:30 AM.",
            time
        ),
        ValidationError::TimeUnavailable { doctor, time, slots } => format!(
            "{} does not see patients at {}. Available times: {}",
            doctor,
            time,
            slots.join(", ")
        ),
        ValidationError::OutsideHours(time) => format!(
            "{} is outside our opening hours ({}). Please choose another time.",
            time, hours
        ),
    }
}
