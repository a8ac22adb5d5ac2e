//! Clinic Booking Core Library
//!
//! Conversational appointment booking: free-text messages are turned into a
//! validated, committed appointment over several turns.
//!
//! # Architecture
//!
//! ```text
//! Message → Pattern extraction ─┐
//!         → Model extraction ───┴→ Merge slots → Normalize → Resolve doctor
//!                                                     │
//!                                   [collecting: ask for missing fields]
//!                                                     │
//!                                    Draft + validate (directory, hours)
//!                                                     │
//!                                   [confirmation: await affirmation]
//!                                                     │
//!                                  ┌──────────────────▼──────────────────┐
//!                                  │   Commit (serialized)               │
//!                                  │   conflict check → next sequence    │
//!                                  │   → append to ledger                │
//!                                  └──────────────────┬──────────────────┘
//!                                                     │
//!                                         booked → fresh greeting
//! ```
//!
//! # Modules
//!
//! - [`agent`]: Conversation state machine and session store
//! - [`extractor`]: Pattern and model-assisted slot extraction, intents
//! - [`resolver`]: Date/time normalizer, clinic hours, doctor directory
//! - [`booking`]: Draft validation and serialized commits
//! - [`ledger`]: Append-only appointment ledger and CSV export
//! - [`db`]: SQLite storage for the ledger
//! - [`models`]: Domain types (Clinic, Doctor, Appointment, sessions)
//! - [`config`]: Service configuration

pub mod agent;
pub mod booking;
pub mod clock;
pub mod config;
pub mod db;
pub mod extractor;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use agent::{AgentResponse, BookingAgent, ConfirmError, Confirmation, ResponseStatus};
pub use booking::{BookingDesk, CommitOutcome, ValidationError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BookingConfig, ConfigError};
pub use db::Database;
pub use ledger::{AppointmentLedger, LedgerExport, SqliteLedger};
pub use models::{Appointment, AppointmentStatus, Clinic, ClinicData, Doctor, Phase, SlotField};
pub use resolver::{Directory, Normalizer};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BookingCoreError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No draft: {0}")]
    NoDraft(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<ConfigError> for BookingCoreError {
    fn from(e: ConfigError) -> Self {
        BookingCoreError::ConfigError(e.to_string())
    }
}

impl From<anyhow::Error> for BookingCoreError {
    fn from(e: anyhow::Error) -> Self {
        BookingCoreError::ConfigError(format!("{:#}", e))
    }
}

impl From<ledger::LedgerError> for BookingCoreError {
    fn from(e: ledger::LedgerError) -> Self {
        BookingCoreError::Storage(e.to_string())
    }
}

impl From<booking::BookingError> for BookingCoreError {
    fn from(e: booking::BookingError) -> Self {
        match e {
            booking::BookingError::Invalid(v) => BookingCoreError::InvalidInput(v.to_string()),
            booking::BookingError::Ledger(l) => l.into(),
        }
    }
}

impl From<agent::SessionError> for BookingCoreError {
    fn from(e: agent::SessionError) -> Self {
        BookingCoreError::Storage(e.to_string())
    }
}

impl From<ConfirmError> for BookingCoreError {
    fn from(e: ConfirmError) -> Self {
        match e {
            ConfirmError::SessionNotFound(id) => BookingCoreError::NotFound(format!("session {}", id)),
            ConfirmError::NoDraft => BookingCoreError::NoDraft("no appointment to confirm".into()),
            ConfirmError::Conflict { message, .. } => BookingCoreError::Conflict(message),
            ConfirmError::Invalid(v) => BookingCoreError::InvalidInput(v.to_string()),
            ConfirmError::Storage(msg) => BookingCoreError::Storage(msg),
        }
    }
}

impl From<serde_json::Error> for BookingCoreError {
    fn from(e: serde_json::Error) -> Self {
        BookingCoreError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for BookingCoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        BookingCoreError::Storage(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the booking service described by a JSON config file.
#[uniffi::export]
pub fn open_booking_core(config_path: String) -> Result<Arc<ClinicBookingCore>, BookingCoreError> {
    logging::init();
    let config = BookingConfig::from_json_file(&config_path)?;
    let data = ClinicData::from_json_file(&config.reference_data).with_context(|| {
        format!("loading reference data from {}", config.reference_data.display())
    })?;
    Ok(Arc::new(build_core(&config, data)?))
}

/// Open a service over inline reference data with an in-memory ledger
/// (for testing and demos).
#[uniffi::export]
pub fn open_booking_core_in_memory(reference_json: String) -> Result<Arc<ClinicBookingCore>, BookingCoreError> {
    logging::init();
    let data = ClinicData::from_json_str(&reference_json)?;
    let config = BookingConfig::new("");
    Ok(Arc::new(build_core(&config, data)?))
}

fn open_ledger(path: Option<&Path>) -> anyhow::Result<Arc<dyn AppointmentLedger>> {
    let ledger = match path {
        Some(path) => SqliteLedger::open(path)
            .with_context(|| format!("opening ledger at {}", path.display()))?,
        None => SqliteLedger::open_in_memory().context("opening in-memory ledger")?,
    };
    Ok(Arc::new(ledger))
}

fn build_core(config: &BookingConfig, data: ClinicData) -> anyhow::Result<ClinicBookingCore> {
    let ledger = open_ledger(config.ledger_path.as_deref())?;
    let directory = Arc::new(Directory::new(data));

    let agent = BookingAgent::new(directory, ledger.clone()).with_history_turns(config.history_turns);
    let agent = with_configured_model(agent, config)?;

    tracing::info!(
        clinic = %agent.directory().clinic().name,
        doctors = agent.directory().doctors().len(),
        "Booking core ready"
    );
    Ok(ClinicBookingCore { agent, ledger })
}

#[cfg(feature = "http-client")]
fn with_configured_model(agent: BookingAgent, config: &BookingConfig) -> anyhow::Result<BookingAgent> {
    let Some(model) = &config.model else {
        return Ok(agent);
    };
    let client = clinic_booking_llm::ChatCompletionsClient::new(
        &model.base_url,
        &model.model,
        model.api_key(),
        model.temperature,
        model.timeout_secs,
    )
    .with_context(|| format!("creating model client for {}", model.base_url))?;
    tracing::info!(model = %model.model, "Model-assisted extraction enabled");
    Ok(agent.with_model(Arc::new(client)))
}

#[cfg(not(feature = "http-client"))]
fn with_configured_model(agent: BookingAgent, config: &BookingConfig) -> anyhow::Result<BookingAgent> {
    if config.model.is_some() {
        tracing::warn!("Model configured but built without the http-client feature; using patterns only");
    }
    Ok(agent)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe booking service for FFI hosts.
#[derive(uniffi::Object)]
pub struct ClinicBookingCore {
    agent: BookingAgent,
    ledger: Arc<dyn AppointmentLedger>,
}

#[uniffi::export]
impl ClinicBookingCore {
    // =========================================================================
    // Conversation
    // =========================================================================

    /// Handle one chat message for a session.
    pub fn handle_message(&self, session_id: String, message: String) -> FfiChatResponse {
        self.agent.handle_message(&session_id, &message).into()
    }

    /// Commit the session's pending appointment.
    pub fn confirm(&self, session_id: String) -> Result<FfiConfirmation, BookingCoreError> {
        let confirmation = self.agent.confirm(&session_id)?;
        Ok(FfiConfirmation {
            message: confirmation.message,
            appointment_id: confirmation.appointment_id,
        })
    }

    /// Mint a fresh session id.
    pub fn new_session_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// Free slots for a doctor on a date (any accepted date form).
    pub fn available_slots(&self, doctor_id: String, date: String) -> Result<Vec<String>, BookingCoreError> {
        Ok(self.agent.available_slots(&doctor_id, &date)?)
    }

    /// Clinic and doctor reference data.
    pub fn directory(&self) -> FfiDirectory {
        let directory = self.agent.directory();
        FfiDirectory {
            clinic: directory.clinic().clone().into(),
            doctors: directory.doctors().iter().cloned().map(Into::into).collect(),
        }
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the ledger as CSV with a header row.
    pub fn export_ledger_csv(&self) -> Result<String, BookingCoreError> {
        Ok(LedgerExport::capture(self.ledger.as_ref())?.to_csv())
    }

    /// Export the ledger as JSON.
    pub fn export_ledger_json(&self) -> Result<String, BookingCoreError> {
        Ok(LedgerExport::capture(self.ledger.as_ref())?.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiResponseStatus {
    Chat,
    MissingInfo,
    Confirmation,
    Confirmed,
    Error,
}

impl From<ResponseStatus> for FfiResponseStatus {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Chat => FfiResponseStatus::Chat,
            ResponseStatus::MissingInfo => FfiResponseStatus::MissingInfo,
            ResponseStatus::Confirmation => FfiResponseStatus::Confirmation,
            ResponseStatus::Confirmed => FfiResponseStatus::Confirmed,
            ResponseStatus::Error => FfiResponseStatus::Error,
        }
    }
}

/// FFI-safe chat response.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiChatResponse {
    pub response: String,
    pub status: FfiResponseStatus,
    pub appointment: Option<FfiAppointment>,
    pub missing_fields: Vec<String>,
    pub phase: String,
}

impl From<AgentResponse> for FfiChatResponse {
    fn from(r: AgentResponse) -> Self {
        Self {
            response: r.response,
            status: r.status.into(),
            appointment: r.appointment.map(Into::into),
            missing_fields: r.missing.iter().map(|f| f.as_str().to_string()).collect(),
            phase: r.phase.as_str().to_string(),
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub patient_age: u32,
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub created_at: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(a: Appointment) -> Self {
        Self {
            appointment_id: a.appointment_id,
            patient_name: a.patient_name,
            patient_age: a.patient_age,
            doctor_id: a.doctor_id,
            doctor_name: a.doctor_name,
            date: a.date,
            time: a.time,
            status: a.status.as_str().to_string(),
            created_at: a.created_at,
        }
    }
}

/// FFI-safe confirmation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConfirmation {
    pub message: String,
    pub appointment_id: String,
}

/// FFI-safe clinic record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinic {
    pub name: String,
    pub code: String,
    pub address: String,
    pub hours: String,
    pub contact: String,
}

impl From<Clinic> for FfiClinic {
    fn from(c: Clinic) -> Self {
        Self {
            name: c.name,
            code: c.code,
            address: c.address,
            hours: c.hours,
            contact: c.contact,
        }
    }
}

/// FFI-safe doctor record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub slots: Vec<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            specialization: d.specialization,
            slots: d.slots,
        }
    }
}

/// FFI-safe directory snapshot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDirectory {
    pub clinic: FfiClinic,
    pub doctors: Vec<FfiDoctor>,
}
