//! Append-only appointment ledger.
//!
//! The ledger is the system of record for committed appointments. It is
//! read-modify-append: callers read existing rows to allocate the next
//! sequence number, then append. Serializing that critical section is the
//! caller's job (see [`crate::booking::BookingDesk`]).

mod export;

pub use export::*;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::Appointment;

/// Ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Ledger lock poisoned")]
    LockPoisoned,

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Record store for committed appointments.
pub trait AppointmentLedger: Send + Sync {
    /// Every row in append order.
    fn records(&self) -> LedgerResult<Vec<Appointment>>;

    /// Append one committed appointment.
    fn append(&self, appointment: &Appointment) -> LedgerResult<()>;

    /// Ids starting with `prefix`, for sequence allocation.
    fn ids_with_prefix(&self, prefix: &str) -> LedgerResult<Vec<String>> {
        Ok(self
            .records()?
            .into_iter()
            .filter_map(|a| a.appointment_id)
            .filter(|id| id.starts_with(prefix))
            .collect())
    }

    /// Non-cancelled rows for a doctor on a date.
    fn active_for(&self, doctor_id: &str, date: &str) -> LedgerResult<Vec<Appointment>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|a| a.is_active() && a.doctor_id == doctor_id && a.date == date)
            .collect())
    }
}

/// SQLite-backed ledger.
pub struct SqliteLedger {
    db: Mutex<Database>,
}

impl SqliteLedger {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open a ledger file, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Create an in-memory ledger.
    pub fn open_in_memory() -> LedgerResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn db(&self) -> LedgerResult<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| LedgerError::LockPoisoned)
    }
}

impl AppointmentLedger for SqliteLedger {
    fn records(&self) -> LedgerResult<Vec<Appointment>> {
        Ok(self.db()?.list_appointments()?)
    }

    fn append(&self, appointment: &Appointment) -> LedgerResult<()> {
        Ok(self.db()?.insert_appointment(appointment)?)
    }

    fn ids_with_prefix(&self, prefix: &str) -> LedgerResult<Vec<String>> {
        Ok(self.db()?.appointment_ids_with_prefix(prefix)?)
    }

    fn active_for(&self, doctor_id: &str, date: &str) -> LedgerResult<Vec<Appointment>> {
        Ok(self.db()?.active_appointments_for(doctor_id, date)?)
    }
}

/// Appointment id: `{clinic_code}{doctor_id}{sequence}`.
pub fn appointment_id(clinic_code: &str, doctor_id: &str, sequence: u32) -> String {
    format!("{}{}{}", clinic_code, doctor_id, sequence)
}

/// Next sequence for `prefix`: one more than the largest numeric suffix among
/// ids sharing the prefix, or 1 if there are none.
///
/// Prefixes are not delimited, so `C1D1` also sees ids of doctor `D12`
/// (`C1D123` reads as sequence 23). Sequences stay unique, they may skip.
pub fn next_sequence<'a, I>(ids: I, prefix: &str) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use proptest::prelude::*;

    fn committed(id: &str, doctor_id: &str, time: &str) -> Appointment {
        let mut appt = Appointment::draft(
            "Sam Lee".into(),
            51,
            doctor_id.into(),
            "Dr. John Smith".into(),
            "2026-10-20".into(),
            time.into(),
        );
        appt.appointment_id = Some(id.into());
        appt.status = AppointmentStatus::Confirmed;
        appt
    }

    #[test]
    fn test_next_sequence_uses_max_suffix() {
        let ids = ["C1D15", "C1D17", "C1D2"];
        assert_eq!(next_sequence(ids, "C1D1"), 8);
    }

    #[test]
    fn test_next_sequence_empty() {
        assert_eq!(next_sequence(Vec::<&str>::new(), "C1D1"), 1);
        assert_eq!(next_sequence(["C2D11"], "C1D1"), 1);
    }

    #[test]
    fn test_next_sequence_ignores_non_numeric_suffix() {
        assert_eq!(next_sequence(["C1D1x", "C1D1"], "C1D1"), 1);
    }

    #[test]
    fn test_appointment_id_format() {
        assert_eq!(appointment_id("SC", "D1", 8), "SCD18");
    }

    #[test]
    fn test_sqlite_ledger_round_trip() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        ledger.append(&committed("SCD21", "D2", "09:00")).unwrap();
        ledger.append(&committed("SCD22", "D2", "15:00")).unwrap();

        assert_eq!(ledger.records().unwrap().len(), 2);
        assert_eq!(ledger.active_for("D2", "2026-10-20").unwrap().len(), 2);
        assert!(ledger.active_for("D2", "2026-10-21").unwrap().is_empty());
    }

    /// Keeps rows in memory and relies on the trait's default lookups.
    struct VecLedger(Mutex<Vec<Appointment>>);

    impl AppointmentLedger for VecLedger {
        fn records(&self) -> LedgerResult<Vec<Appointment>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn append(&self, appointment: &Appointment) -> LedgerResult<()> {
            self.0.lock().unwrap().push(appointment.clone());
            Ok(())
        }
    }

    #[test]
    fn test_ids_with_prefix() {
        let sqlite = SqliteLedger::open_in_memory().unwrap();
        let memory = VecLedger(Mutex::new(Vec::new()));
        let ledgers: [&dyn AppointmentLedger; 2] = [&sqlite, &memory];

        for ledger in ledgers {
            ledger.append(&committed("C1D15", "D1", "10:00")).unwrap();
            ledger.append(&committed("C1D17", "D1", "11:00")).unwrap();
            ledger.append(&committed("C1D23", "D2", "11:00")).unwrap();

            let mut ids = ledger.ids_with_prefix("C1D1").unwrap();
            ids.sort();
            assert_eq!(ids, vec!["C1D15", "C1D17"]);
            assert_eq!(next_sequence(ids.iter().map(String::as_str), "C1D1"), 8);
        }
    }

    #[test]
    fn test_sqlite_ledger_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.db");

        {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.append(&committed("SCD21", "D2", "09:00")).unwrap();
        }

        let reopened = SqliteLedger::open(&path).unwrap();
        let rows = reopened.records().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].appointment_id.as_deref(), Some("SCD21"));
    }

    proptest! {
        #[test]
        fn next_sequence_exceeds_every_existing(seqs in prop::collection::vec(1u32..10_000, 0..20)) {
            let ids: Vec<String> = seqs.iter().map(|s| appointment_id("SC", "D9", *s)).collect();
            let next = next_sequence(ids.iter().map(String::as_str), "SCD9");

            prop_assert!(seqs.iter().all(|s| next > *s));
            prop_assert!(!ids.contains(&appointment_id("SC", "D9", next)));
        }
    }
}
