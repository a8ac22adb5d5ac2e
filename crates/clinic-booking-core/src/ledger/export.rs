//! Ledger export.

use serde::{Deserialize, Serialize};

use super::{AppointmentLedger, LedgerResult};
use crate::models::{Appointment, LEDGER_HEADER};

/// Snapshot of the ledger for external consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerExport {
    /// Export timestamp
    pub exported_at: String,
    /// Rows in append order
    pub appointments: Vec<Appointment>,
}

impl LedgerExport {
    /// Snapshot the current ledger contents.
    pub fn capture(ledger: &dyn AppointmentLedger) -> LedgerResult<Self> {
        Ok(Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            appointments: ledger.records()?,
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str(&LEDGER_HEADER.join(","));
        csv.push('\n');

        for appt in &self.appointments {
            let row: Vec<String> = appt.to_row().iter().map(|v| escape_csv(v)).collect();
            csv.push_str(&row.join(","));
            csv.push('\n');
        }

        csv
    }
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteLedger;
    use crate::models::AppointmentStatus;

    #[test]
    fn test_csv_header_and_escaping() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let mut appt = Appointment::draft(
            "Nair, Priya \"P\"".into(),
            34,
            "D1".into(),
            "Dr. Asha Rao".into(),
            "2026-10-20".into(),
            "10:00".into(),
        );
        appt.appointment_id = Some("SCD11".into());
        appt.status = AppointmentStatus::Confirmed;
        appt.created_at = Some("2026-10-16 09:00:00".into());
        ledger.append(&appt).unwrap();

        let csv = LedgerExport::capture(&ledger).unwrap().to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "appointment_id,patient_name,patient_age,doctor_id,doctor_name,date,time,status,created_at"
        );
        assert_eq!(
            lines[1],
            "SCD11,\"Nair, Priya \"\"P\"\"\",34,D1,Dr. Asha Rao,2026-10-20,10:00,confirmed,2026-10-16 09:00:00"
        );
    }

    #[test]
    fn test_empty_ledger_exports_header_only() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let export = LedgerExport::capture(&ledger).unwrap();

        assert_eq!(export.to_csv().lines().count(), 1);
        assert!(export.to_json().unwrap().contains("\"appointments\": []"));
    }
}
