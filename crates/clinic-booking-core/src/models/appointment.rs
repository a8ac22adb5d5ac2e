//! Appointment records.

use serde::{Deserialize, Serialize};

/// Column order of the persisted ledger.
pub const LEDGER_HEADER: [&str; 9] = [
    "appointment_id",
    "patient_name",
    "patient_age",
    "doctor_id",
    "doctor_name",
    "date",
    "time",
    "status",
    "created_at",
];

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Drafted, awaiting patient confirmation
    Pending,
    /// Committed to the ledger
    Confirmed,
    /// Cancelled; frees the slot
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status. Unknown values are treated as pending so a
    /// foreign row still blocks its slot.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => AppointmentStatus::Confirmed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Pending,
        }
    }
}

/// A booked or draft appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// `{clinic_code}{doctor_id}{sequence}`, assigned at commit
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub patient_age: u32,
    pub doctor_id: String,
    pub doctor_name: String,
    /// Canonical `YYYY-MM-DD`
    pub date: String,
    /// Canonical `HH:MM`, 24-hour
    pub time: String,
    pub status: AppointmentStatus,
    /// `YYYY-MM-DD HH:MM:SS`, assigned at commit
    pub created_at: Option<String>,
}

impl Appointment {
    /// Create a pending draft.
    pub fn draft(
        patient_name: String,
        patient_age: u32,
        doctor_id: String,
        doctor_name: String,
        date: String,
        time: String,
    ) -> Self {
        Self {
            appointment_id: None,
            patient_name,
            patient_age,
            doctor_id,
            doctor_name,
            date,
            time,
            status: AppointmentStatus::Pending,
            created_at: None,
        }
    }

    /// Whether this record still occupies its slot.
    pub fn is_active(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    /// Whether this record occupies the same doctor/date/time as `other`.
    pub fn same_slot(&self, doctor_id: &str, date: &str, time: &str) -> bool {
        self.doctor_id == doctor_id && self.date == date && self.time == time
    }

    /// Ledger row in [`LEDGER_HEADER`] order.
    pub fn to_row(&self) -> [String; 9] {
        [
            self.appointment_id.clone().unwrap_or_default(),
            self.patient_name.clone(),
            self.patient_age.to_string(),
            self.doctor_id.clone(),
            self.doctor_name.clone(),
            self.date.clone(),
            self.time.clone(),
            self.status.as_str().to_string(),
            self.created_at.clone().unwrap_or_default(),
        ]
    }

    /// Human-readable summary used in confirmation prompts.
    pub fn summary(&self) -> String {
        format!(
            "Patient: {}\nAge: {}\nDoctor: {}\nDate: {}\nTime: {}",
            self.patient_name, self.patient_age, self.doctor_name, self.date, self.time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Appointment {
        Appointment::draft(
            "Priya Nair".into(),
            34,
            "D1".into(),
            "Dr. Asha Rao".into(),
            "2026-10-20".into(),
            "10:00".into(),
        )
    }

    #[test]
    fn test_draft_is_pending_without_id() {
        let appt = sample();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert!(appt.appointment_id.is_none());
        assert!(appt.created_at.is_none());
        assert!(appt.is_active());
    }

    #[test]
    fn test_cancelled_frees_slot() {
        let mut appt = sample();
        appt.status = AppointmentStatus::Cancelled;
        assert!(!appt.is_active());
    }

    #[test]
    fn test_row_matches_header_order() {
        let mut appt = sample();
        appt.appointment_id = Some("SCD11".into());
        appt.status = AppointmentStatus::Confirmed;
        appt.created_at = Some("2026-10-16 09:00:00".into());

        let row = appt.to_row();
        assert_eq!(row.len(), LEDGER_HEADER.len());
        assert_eq!(row[0], "SCD11");
        assert_eq!(row[2], "34");
        assert_eq!(row[7], "confirmed");
        assert_eq!(row[8], "2026-10-16 09:00:00");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(AppointmentStatus::parse("Cancelled"), AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::parse("canceled"), AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::parse("confirmed"), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::parse("weird"), AppointmentStatus::Pending);
    }
}
