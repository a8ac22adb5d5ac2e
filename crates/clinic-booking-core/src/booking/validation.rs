//! Draft appointment validation.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::models::{Appointment, SlotField};
use crate::resolver::{normalize_time, Directory, DATE_FORMAT, TIME_FORMAT};

/// Oldest accepted patient age.
pub const MAX_AGE: u32 = 130;

/// First whole digit run, with any sign in front of it.
static AGE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(-)?(\d+)").unwrap());

/// Reasons a draft cannot be booked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unknown doctor: {0}")]
    UnknownDoctor(String),

    #[error("Invalid age: {0}")]
    InvalidAge(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Date is in the past: {0}")]
    PastDate(String),

    #[error("Clinic is closed on {0}")]
    ClinicClosed(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("{doctor} has no {time} slot")]
    TimeUnavailable {
        doctor: String,
        time: String,
        slots: Vec<String>,
    },

    #[error("{0} is outside clinic hours")]
    OutsideHours(String),
}

impl ValidationError {
    /// The slot to retract so the patient can supply it again.
    pub fn field(&self) -> SlotField {
        match self {
            ValidationError::UnknownDoctor(_) => SlotField::Doctor,
            ValidationError::InvalidAge(_) => SlotField::Age,
            ValidationError::InvalidDate(_)
            | ValidationError::PastDate(_)
            | ValidationError::ClinicClosed(_) => SlotField::Date,
            ValidationError::InvalidTime(_)
            | ValidationError::TimeUnavailable { .. }
            | ValidationError::OutsideHours(_) => SlotField::Time,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Read an age from text such as "34", "34 years" or "age 34".
pub fn parse_age(raw: &str) -> ValidationResult<u32> {
    AGE_DIGITS
        .captures(raw)
        .filter(|caps| caps.get(1).is_none())
        .and_then(|caps| caps[2].parse::<u32>().ok())
        .filter(|age| *age <= MAX_AGE)
        .ok_or_else(|| ValidationError::InvalidAge(raw.to_string()))
}

/// Check a draft against the directory and the current time.
///
/// Order: doctor, date, time. Availability against the ledger is checked
/// separately at commit.
pub fn check_draft(directory: &Directory, draft: &Appointment, now: NaiveDateTime) -> ValidationResult<()> {
    let doctor = directory
        .doctor_by_id(&draft.doctor_id)
        .ok_or_else(|| ValidationError::UnknownDoctor(draft.doctor_name.clone()))?;

    let date = NaiveDate::parse_from_str(&draft.date, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(draft.date.clone()))?;
    if date < now.date() {
        return Err(ValidationError::PastDate(draft.date.clone()));
    }
    if let Some(hours) = directory.hours() {
        if !hours.is_open_on(date) {
            return Err(ValidationError::ClinicClosed(draft.date.clone()));
        }
    }

    let time = NaiveTime::parse_from_str(&draft.time, TIME_FORMAT)
        .map_err(|_| ValidationError::InvalidTime(draft.time.clone()))?;
    if date == now.date() && time <= now.time() {
        return Err(ValidationError::PastDate(format!("{} {}", draft.date, draft.time)));
    }
    if let Some(hours) = directory.hours() {
        if !hours.within(time) {
            return Err(ValidationError::OutsideHours(draft.time.clone()));
        }
    }

    if !doctor.slots.iter().any(|slot| normalize_time(slot) == draft.time) {
        return Err(ValidationError::TimeUnavailable {
            doctor: doctor.name.clone(),
            time: draft.time.clone(),
            slots: doctor.slots.clone(),
        });
    }

    Ok(())
}
