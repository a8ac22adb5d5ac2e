//! Appointment ledger database operations.

use rusqlite::{params, ErrorCode, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus};

impl Database {
    /// Append a committed appointment. The id must be assigned.
    pub fn insert_appointment(&self, appt: &Appointment) -> DbResult<()> {
        let id = appt
            .appointment_id
            .as_deref()
            .ok_or_else(|| DbError::Constraint("appointment has no id".into()))?;

        let result = self.conn.execute(
            r#"
            INSERT INTO appointments (
                appointment_id, patient_name, patient_age, doctor_id, doctor_name,
                date, time, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, COALESCE(?9, datetime('now')))
            "#,
            params![
                id,
                appt.patient_name,
                appt.patient_age,
                appt.doctor_id,
                appt.doctor_name,
                appt.date,
                appt.time,
                appt.status.as_str(),
                appt.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(DbError::Constraint(format!("duplicate appointment id: {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All ledger rows in append order.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT appointment_id, patient_name, patient_age, doctor_id, doctor_name,
                   date, time, status, created_at
            FROM appointments
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], row_to_appointment)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active (non-cancelled) bookings for a doctor on a date.
    pub fn active_appointments_for(&self, doctor_id: &str, date: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT appointment_id, patient_name, patient_age, doctor_id, doctor_name,
                   date, time, status, created_at
            FROM appointments
            WHERE doctor_id = ?1 AND date = ?2 AND status != 'cancelled'
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map(params![doctor_id, date], row_to_appointment)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Ids starting with `prefix`.
    pub fn appointment_ids_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT appointment_id FROM appointments WHERE substr(appointment_id, 1, ?2) = ?1")?;

        let rows = stmt.query_map(params![prefix, prefix.chars().count() as i64], |row| row.get(0))?;
        rows.collect::<Result<Vec<String>, _>>().map_err(Into::into)
    }
}

fn row_to_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let status: String = row.get(7)?;
    Ok(Appointment {
        appointment_id: row.get(0)?,
        patient_name: row.get(1)?,
        patient_age: row.get(2)?,
        doctor_id: row.get(3)?,
        doctor_name: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        status: AppointmentStatus::parse(&status),
        created_at: row.get(8)?,
    })
}
