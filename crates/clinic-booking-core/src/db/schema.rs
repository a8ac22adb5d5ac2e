//! SQLite schema definition.

/// Complete database schema for the appointment ledger.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Appointment Ledger (append-only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,              -- {clinic_code}{doctor_id}{sequence}
    patient_name TEXT NOT NULL,
    patient_age INTEGER NOT NULL,
    doctor_id TEXT NOT NULL,
    doctor_name TEXT NOT NULL,
    date TEXT NOT NULL,                           -- YYYY-MM-DD
    time TEXT NOT NULL,                           -- HH:MM
    status TEXT NOT NULL DEFAULT 'confirmed',     -- pending, confirmed, cancelled
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_slot ON appointments(doctor_id, date, time);
"#;
