//! Availability checks and appointment commits.

mod validation;

pub use validation::*;

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::{appointment_id, next_sequence, AppointmentLedger, LedgerError};
use crate::models::{Appointment, AppointmentStatus, SlotField, SlotMap};
use crate::resolver::{Directory, Normalizer};

/// Timestamp format for `created_at`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Booking errors.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid booking: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Result of a commit attempt that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Appended to the ledger with an id and timestamp
    Committed(Appointment),
    /// The slot is taken; `alternatives` are the doctor's free slots that day
    Conflict {
        requested: Appointment,
        alternatives: Vec<String>,
    },
}

/// Validates drafts and serializes ledger commits.
pub struct BookingDesk {
    directory: Arc<Directory>,
    ledger: Arc<dyn AppointmentLedger>,
    /// Held across read-max-sequence and append
    commit_lock: Mutex<()>,
}

impl BookingDesk {
    pub fn new(directory: Arc<Directory>, ledger: Arc<dyn AppointmentLedger>) -> Self {
        Self {
            directory,
            ledger,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn ledger(&self) -> &dyn AppointmentLedger {
        self.ledger.as_ref()
    }

    /// Build a pending draft from complete slots.
    ///
    /// Date and time are normalized against `now`; the draft is then checked
    /// against the directory and clinic hours.
    pub fn prepare_draft(&self, slots: &SlotMap, now: NaiveDateTime) -> ValidationResult<Appointment> {
        let normalizer = Normalizer::new(now.date());
        let field = |f: SlotField| slots.get(f).unwrap_or_default();

        let doctor = self
            .directory
            .resolve_doctor(field(SlotField::Doctor))
            .ok_or_else(|| ValidationError::UnknownDoctor(field(SlotField::Doctor).to_string()))?;
        let age = parse_age(field(SlotField::Age))?;

        let draft = Appointment::draft(
            field(SlotField::Name).to_string(),
            age,
            doctor.id.clone(),
            doctor.name.clone(),
            normalizer.normalize_date(field(SlotField::Date)),
            normalizer.normalize_time(field(SlotField::Time)),
        );

        check_draft(&self.directory, &draft, now)?;
        Ok(draft)
    }

    /// Free slots for a doctor on a date. The date may be any accepted form.
    pub fn available_slots(&self, doctor_id: &str, date: &str, today: NaiveDate) -> BookingResult<Vec<String>> {
        let date = Normalizer::new(today).normalize_date(date);
        let taken = self.ledger.active_for(doctor_id, &date)?;
        Ok(self.directory.available_slots(doctor_id, &date, &taken))
    }

    /// Validate a draft and append it to the ledger unless its slot is taken.
    pub fn validate_and_commit(&self, draft: &Appointment, now: NaiveDateTime) -> BookingResult<CommitOutcome> {
        check_draft(&self.directory, draft, now)?;

        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| BookingError::Ledger(LedgerError::LockPoisoned))?;

        let taken = self.ledger.active_for(&draft.doctor_id, &draft.date)?;
        if taken
            .iter()
            .any(|a| a.same_slot(&draft.doctor_id, &draft.date, &draft.time))
        {
            let alternatives = self
                .directory
                .available_slots(&draft.doctor_id, &draft.date, &taken);
            warn!(
                doctor_id = %draft.doctor_id,
                date = %draft.date,
                time = %draft.time,
                alternatives = alternatives.len(),
                "Slot already booked"
            );
            return Ok(CommitOutcome::Conflict {
                requested: draft.clone(),
                alternatives,
            });
        }

        let prefix = format!("{}{}", self.directory.clinic().code, draft.doctor_id);
        let ids = self.ledger.ids_with_prefix(&prefix)?;
        let sequence = next_sequence(ids.iter().map(String::as_str), &prefix);

        let mut committed = draft.clone();
        committed.appointment_id = Some(appointment_id(
            &self.directory.clinic().code,
            &draft.doctor_id,
            sequence,
        ));
        committed.status = AppointmentStatus::Confirmed;
        committed.created_at = Some(now.format(CREATED_AT_FORMAT).to_string());

        self.ledger.append(&committed)?;

        info!(
            appointment_id = committed.appointment_id.as_deref().unwrap_or_default(),
            doctor_id = %committed.doctor_id,
            date = %committed.date,
            time = %committed.time,
            "Appointment committed"
        );
        Ok(CommitOutcome::Committed(committed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteLedger;
    use crate::models::ClinicData;

    fn desk() -> BookingDesk {
        let data = ClinicData::from_json_str(
            r#"{
                "clinic": {"name": "Sunrise Clinic", "code": "SC", "address": "12 Lake Road",
                           "hours": "Mon-Sat 9:00 AM - 6:00 PM", "contact": "555-0100"},
                "doctors": [
                    {"id": "D1", "name": "Dr. Asha Rao", "specialization": "General Medicine",
                     "slots": ["10:00 AM", "11:00 AM", "2:00 PM"]},
                    {"id": "D2", "name": "Dr. John Smith", "specialization": "Cardiology",
                     "slots": ["9:00 AM"]}
                ]
            }"#,
        )
        .unwrap();
        BookingDesk::new(
            Arc::new(Directory::new(data)),
            Arc::new(SqliteLedger::open_in_memory().unwrap()),
        )
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn slots(doctor: &str, date: &str, time: &str) -> SlotMap {
        let mut slots = SlotMap::new();
        slots.set(SlotField::Name, "Priya Nair");
        slots.set(SlotField::Age, "34");
        slots.set(SlotField::Doctor, doctor);
        slots.set(SlotField::Date, date);
        slots.set(SlotField::Time, time);
        slots
    }

    #[test]
    fn test_prepare_draft_normalizes() {
        let desk = desk();
        let draft = desk
            .prepare_draft(&slots("dr rao", "20 oct", "10 am"), now())
            .unwrap();

        assert_eq!(draft.doctor_id, "D1");
        assert_eq!(draft.doctor_name, "Dr. Asha Rao");
        assert_eq!(draft.date, "2026-10-20");
        assert_eq!(draft.time, "10:00");
        assert_eq!(draft.status, AppointmentStatus::Pending);
    }

    #[test]
    fn test_prepare_draft_rejects_bad_fields() {
        let desk = desk();

        let err = desk
            .prepare_draft(&slots("dr who", "20 oct", "10 am"), now())
            .unwrap_err();
        assert_eq!(err.field(), SlotField::Doctor);

        let err = desk
            .prepare_draft(&slots("rao", "30 feb", "10 am"), now())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidDate("30 feb".into()));
    }

    #[test]
    fn test_commit_assigns_sequential_ids() {
        let desk = desk();

        let first = desk.prepare_draft(&slots("rao", "2026-10-20", "10:00"), now()).unwrap();
        let second = desk.prepare_draft(&slots("rao", "2026-10-20", "11:00"), now()).unwrap();

        let CommitOutcome::Committed(a) = desk.validate_and_commit(&first, now()).unwrap() else {
            panic!("expected commit");
        };
        let CommitOutcome::Committed(b) = desk.validate_and_commit(&second, now()).unwrap() else {
            panic!("expected commit");
        };

        assert_eq!(a.appointment_id.as_deref(), Some("SCD11"));
        assert_eq!(b.appointment_id.as_deref(), Some("SCD12"));
        assert_eq!(a.status, AppointmentStatus::Confirmed);
        assert_eq!(a.created_at.as_deref(), Some("2026-10-16 08:00:00"));
        assert_eq!(desk.ledger().records().unwrap().len(), 2);
    }

    #[test]
    fn test_double_booking_offers_alternatives() {
        let desk = desk();
        let draft = desk.prepare_draft(&slots("rao", "2026-10-20", "10:00"), now()).unwrap();

        assert!(matches!(
            desk.validate_and_commit(&draft, now()).unwrap(),
            CommitOutcome::Committed(_)
        ));

        match desk.validate_and_commit(&draft, now()).unwrap() {
            CommitOutcome::Conflict { alternatives, .. } => {
                assert_eq!(alternatives, vec!["11:00 AM", "2:00 PM"]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(desk.ledger().records().unwrap().len(), 1);
    }

    #[test]
    fn test_double_booking_with_no_slots_left() {
        let desk = desk();
        let draft = desk.prepare_draft(&slots("smith", "2026-10-20", "9am"), now()).unwrap();
        desk.validate_and_commit(&draft, now()).unwrap();

        match desk.validate_and_commit(&draft, now()).unwrap() {
            CommitOutcome::Conflict { alternatives, .. } => assert!(alternatives.is_empty()),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_commit_rechecks_past_dates() {
        let desk = desk();
        let draft = desk.prepare_draft(&slots("rao", "2026-10-20", "10:00"), now()).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 10, 21)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        assert!(matches!(
            desk.validate_and_commit(&draft, later),
            Err(BookingError::Invalid(ValidationError::PastDate(_)))
        ));
    }

    #[test]
    fn test_available_slots_normalizes_date() {
        let desk = desk();
        let draft = desk.prepare_draft(&slots("rao", "2026-10-20", "11:00"), now()).unwrap();
        desk.validate_and_commit(&draft, now()).unwrap();

        let today = now().date();
        assert_eq!(
            desk.available_slots("D1", "20 oct", today).unwrap(),
            vec!["10:00 AM", "2:00 PM"]
        );
        assert!(desk.available_slots("D9", "20 oct", today).unwrap().is_empty());
    }
}
