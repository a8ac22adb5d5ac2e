//! Clinic reference data models.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};

/// The clinic itself. One per process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    /// Display name
    pub name: String,
    /// Short code used as the appointment id prefix
    pub code: String,
    /// Street address
    pub address: String,
    /// Free-text operating hours (e.g. "Mon-Sat 9:00 AM - 6:00 PM")
    pub hours: String,
    /// Phone or email
    pub contact: String,
}

/// A doctor and their published daily slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Directory id, also part of appointment ids
    pub id: String,
    /// Full display name, possibly with honorific
    pub name: String,
    /// Specialization shown to patients
    pub specialization: String,
    /// Time-of-day slots in directory order (any accepted time format)
    pub slots: Vec<String>,
}

/// Reference data file contents: `{clinic: {...}, doctors: [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicData {
    pub clinic: Clinic,
    pub doctors: Vec<Doctor>,
}

impl ClinicData {
    /// Parse reference data from JSON.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let data: ClinicData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Load reference data from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.clinic.code.trim().is_empty() {
            return Err(ConfigError::Invalid("clinic code must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for doctor in &self.doctors {
            if doctor.id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "doctor '{}' has an empty id",
                    doctor.name
                )));
            }
            if !seen.insert(doctor.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate doctor id: {}",
                    doctor.id
                )));
            }
        }
        Ok(())
    }
}
