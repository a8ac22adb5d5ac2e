//! Read-only clinic directory with doctor resolution.

use std::collections::HashMap;
use std::sync::LazyLock;

use clinic_booking_llm::{ClinicContext, DoctorSummary};
use regex::Regex;
use strsim::jaro_winkler;

use super::hours::ClinicHours;
use super::normalizer::normalize_time;
use crate::models::{Appointment, Clinic, ClinicData, Doctor};

/// Minimum Jaro-Winkler similarity for the typo fallback.
pub const TYPO_THRESHOLD: f64 = 0.90;

static HONORIFIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:dr\b\.?|doctor\b)\s*").unwrap());

/// Immutable, indexed view over the clinic's reference data.
#[derive(Debug, Clone)]
pub struct Directory {
    clinic: Clinic,
    doctors: Vec<Doctor>,
    by_id: HashMap<String, usize>,
    /// Lowercased names without honorific, in directory order
    keys: Vec<String>,
    hours: Option<ClinicHours>,
}

impl Directory {
    /// Build the directory once from loaded reference data.
    pub fn new(data: ClinicData) -> Self {
        let ClinicData { clinic, doctors } = data;

        let by_id = doctors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        let keys = doctors.iter().map(|d| name_key(&d.name)).collect();
        let hours = ClinicHours::parse(&clinic.hours);
        if hours.is_none() {
            tracing::debug!(hours = %clinic.hours, "Clinic hours not parseable, only doctor slots apply");
        }

        Self {
            clinic,
            doctors,
            by_id,
            keys,
            hours,
        }
    }

    pub fn clinic(&self) -> &Clinic {
        &self.clinic
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn hours(&self) -> Option<&ClinicHours> {
        self.hours.as_ref()
    }

    pub fn doctor_by_id(&self, id: &str) -> Option<&Doctor> {
        self.by_id.get(id).map(|&i| &self.doctors[i])
    }

    /// Display names in directory order.
    pub fn doctor_names(&self) -> Vec<&str> {
        self.doctors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Resolve a fuzzy doctor reference.
    ///
    /// After stripping a leading honorific, the rules are tried in order and
    /// the first doctor in directory order satisfying a rule wins:
    /// exact name, name starts with the query, name contains the query, and
    /// finally a Jaro-Winkler match against the full name or one of its words.
    pub fn resolve_doctor(&self, query: &str) -> Option<&Doctor> {
        let query = name_key(query);
        if query.is_empty() {
            return None;
        }

        let found = self
            .position(|key| key == query)
            .or_else(|| self.position(|key| key.starts_with(&query)))
            .or_else(|| self.position(|key| key.contains(&query)))
            .or_else(|| {
                self.position(|key| {
                    jaro_winkler(key, &query) >= TYPO_THRESHOLD
                        || key
                            .split_whitespace()
                            .any(|word| jaro_winkler(word, &query) >= TYPO_THRESHOLD)
                })
            });

        found.map(|i| &self.doctors[i])
    }

    fn position(&self, rule: impl Fn(&str) -> bool) -> Option<usize> {
        self.keys.iter().position(|key| rule(key))
    }

    /// The doctor's slots on `date` not taken by an active booking, in the
    /// doctor's own order. Unknown doctors have no slots.
    pub fn available_slots(&self, doctor_id: &str, date: &str, booked: &[Appointment]) -> Vec<String> {
        let Some(doctor) = self.doctor_by_id(doctor_id) else {
            return Vec::new();
        };

        doctor
            .slots
            .iter()
            .filter(|slot| {
                let slot_time = normalize_time(slot);
                !booked
                    .iter()
                    .any(|a| a.is_active() && a.same_slot(doctor_id, date, &slot_time))
            })
            .cloned()
            .collect()
    }

    /// Clinic context for the language model.
    pub fn context(&self) -> ClinicContext {
        ClinicContext {
            name: self.clinic.name.clone(),
            address: self.clinic.address.clone(),
            hours: self.clinic.hours.clone(),
            contact: self.clinic.contact.clone(),
            doctors: self
                .doctors
                .iter()
                .map(|d| DoctorSummary {
                    name: d.name.clone(),
                    specialization: d.specialization.clone(),
                    slots: d.slots.clone(),
                })
                .collect(),
        }
    }
}

/// Lowercase, trim and drop a leading honorific ("dr", "dr.", "doctor").
pub fn name_key(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    HONORIFIC.replace(&lower, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;

    fn directory() -> Directory {
        let data = ClinicData::from_json_str(
            r#"{
                "clinic": {
                    "name": "Sunrise Clinic",
                    "code": "SC",
                    "address": "12 Lake Road",
                    "hours": "Mon-Sat 9:00 AM - 6:00 PM",
                    "contact": "555-0100"
                },
                "doctors": [
                    {"id": "D1", "name": "Dr. Asha Rao", "specialization": "General Medicine",
                     "slots": ["10:00 AM", "11:00 AM", "2:00 PM"]},
                    {"id": "D2", "name": "Dr. John Smith", "specialization": "Cardiology",
                     "slots": ["9:00 AM", "3:00 PM"]},
                    {"id": "D3", "name": "Dr. Andrew Raman", "specialization": "Pediatrics",
                     "slots": ["4:00 PM"]}
                ]
            }"#,
        )
        .unwrap();
        Directory::new(data)
    }

    fn booking(doctor_id: &str, date: &str, time: &str) -> Appointment {
        let mut appt = Appointment::draft(
            "Pat".into(),
            40,
            doctor_id.into(),
            String::new(),
            date.into(),
            time.into(),
        );
        appt.status = AppointmentStatus::Confirmed;
        appt
    }

    #[test]
    fn test_honorific_and_surname_resolve_alike() {
        let dir = directory();

        let a = dir.resolve_doctor("dr smith").unwrap();
        let b = dir.resolve_doctor("Smith").unwrap();
        let c = dir.resolve_doctor("Doctor John Smith").unwrap();

        assert_eq!(a.id, "D2");
        assert_eq!(a.id, b.id);
        assert_eq!(b.id, c.id);
    }

    #[test]
    fn test_exact_and_prefix_matches() {
        let dir = directory();

        assert_eq!(dir.resolve_doctor("Dr. Asha Rao").unwrap().id, "D1");
        assert_eq!(dir.resolve_doctor("asha").unwrap().id, "D1");
        assert_eq!(dir.resolve_doctor("andrew").unwrap().id, "D3");
    }

    #[test]
    fn test_first_match_in_directory_order() {
        let dir = directory();

        // "ra" is a substring of both Rao and Raman; directory order decides.
        assert_eq!(dir.resolve_doctor("ra").unwrap().id, "D1");
    }

    #[test]
    fn test_typo_fallback() {
        let dir = directory();

        assert_eq!(dir.resolve_doctor("dr smitth").unwrap().id, "D2");
        assert_eq!(dir.resolve_doctor("Dr. Ramen").unwrap().id, "D3");
    }

    #[test]
    fn test_unknown_doctor() {
        let dir = directory();

        assert!(dir.resolve_doctor("Dr. Who").is_none());
        assert!(dir.resolve_doctor("").is_none());
        assert!(dir.resolve_doctor("dr").is_none());
    }

    #[test]
    fn test_available_slots_skip_active_bookings() {
        let dir = directory();
        let mut cancelled = booking("D1", "2026-10-20", "11:00");
        cancelled.status = AppointmentStatus::Cancelled;
        let booked = vec![
            booking("D1", "2026-10-20", "10:00"),
            booking("D1", "2026-10-21", "14:00"),
            booking("D2", "2026-10-20", "14:00"),
            cancelled,
        ];

        assert_eq!(
            dir.available_slots("D1", "2026-10-20", &booked),
            vec!["11:00 AM", "2:00 PM"]
        );
        assert!(dir.available_slots("D9", "2026-10-20", &booked).is_empty());
    }

    #[test]
    fn test_context_lists_roster() {
        let ctx = directory().context();

        assert_eq!(ctx.name, "Sunrise Clinic");
        assert_eq!(ctx.doctors.len(), 3);
        assert!(ctx.doctors_list().contains("Dr. John Smith (Cardiology)"));
    }

    #[test]
    fn test_hours_parsed() {
        let dir = directory();
        assert!(dir.hours().is_some());
    }
}
