//! Conversation agent: the slot-filling state machine.
//!
//! Phases move `greeting → collecting → confirmation → booked`, and a booked
//! session is reset to a fresh greeting straight away. Each inbound message
//! is handled under its session's lock; the clock is read once per message.

pub mod replies;
mod sessions;

pub use sessions::*;

use std::sync::Arc;

use chrono::NaiveDateTime;
use clinic_booking_llm::LanguageModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::booking::{BookingDesk, BookingError, CommitOutcome, ValidationError};
use crate::clock::{Clock, SystemClock};
use crate::extractor::{
    extract_all, has_booking_intent, has_cancel_intent, has_info_intent, Extraction,
    ModelAssistedExtractor, PatternExtractor, SlotExtractor, Turn,
};
use crate::ledger::AppointmentLedger;
use crate::models::{Appointment, ConversationSession, Phase, Role, SlotField, SlotMap};
use crate::resolver::{parse_time, Directory, Normalizer, DATE_FORMAT, TIME_FORMAT};

/// Default number of conversation turns kept per session.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// Outcome class of one handled message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Chat,
    MissingInfo,
    Confirmation,
    Confirmed,
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Chat => "chat",
            ResponseStatus::MissingInfo => "missing_info",
            ResponseStatus::Confirmation => "confirmation",
            ResponseStatus::Confirmed => "confirmed",
            ResponseStatus::Error => "error",
        }
    }
}

/// Reply to one inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    pub response: String,
    pub status: ResponseStatus,
    /// Draft awaiting confirmation, or the committed appointment
    pub appointment: Option<Appointment>,
    /// Required fields still outstanding
    pub missing: Vec<SlotField>,
    /// Session phase after handling
    pub phase: Phase,
}

/// Result of the explicit confirm operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub message: String,
    pub appointment_id: String,
}

/// Explicit confirm failures.
#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No appointment to confirm")]
    NoDraft,

    #[error("{message}")]
    Conflict {
        message: String,
        alternatives: Vec<String>,
    },

    #[error("Invalid booking: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// What a phase handler produced.
struct Step {
    status: ResponseStatus,
    response: String,
    appointment: Option<Appointment>,
    /// The session was reset; its history starts empty
    reset: bool,
}

impl Step {
    fn new(status: ResponseStatus, response: impl Into<String>) -> Self {
        Self {
            status,
            response: response.into(),
            appointment: None,
            reset: false,
        }
    }

    fn with_appointment(mut self, appointment: Appointment) -> Self {
        self.appointment = Some(appointment);
        self
    }

    fn after_reset(mut self) -> Self {
        self.reset = true;
        self
    }
}

/// Slot-filling booking assistant.
pub struct BookingAgent {
    desk: BookingDesk,
    directory: Arc<Directory>,
    patterns: PatternExtractor,
    assisted: Option<ModelAssistedExtractor>,
    sessions: Arc<dyn SessionStore>,
    locks: SessionLocks,
    clock: Arc<dyn Clock>,
    history_turns: usize,
}

impl BookingAgent {
    /// Pattern-only agent on the system clock with an in-memory session table.
    pub fn new(directory: Arc<Directory>, ledger: Arc<dyn AppointmentLedger>) -> Self {
        Self {
            desk: BookingDesk::new(directory.clone(), ledger),
            directory,
            patterns: PatternExtractor::new(),
            assisted: None,
            sessions: Arc::new(InMemorySessionStore::new()),
            locks: SessionLocks::new(),
            clock: Arc::new(SystemClock),
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    /// Add model-assisted extraction after the pattern pass.
    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.assisted = Some(ModelAssistedExtractor::new(model, self.directory.context()));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns.max(1);
        self
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn desk(&self) -> &BookingDesk {
        &self.desk
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current state of a session, if it exists.
    pub fn session(&self, session_id: &str) -> SessionResult<Option<ConversationSession>> {
        self.sessions.get(session_id)
    }

    /// Free slots for a doctor on a date in any accepted form.
    pub fn available_slots(&self, doctor_id: &str, date: &str) -> Result<Vec<String>, BookingError> {
        self.desk.available_slots(doctor_id, date, self.clock.today())
    }

    /// Handle one inbound message. Never fails: errors become responses.
    pub fn handle_message(&self, session_id: &str, message: &str) -> AgentResponse {
        let handle = match self.locks.handle(session_id) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(session_id, error = %e, "Session lock unavailable");
                return failure(replies::SAVE_FAILED);
            }
        };

        let response = match handle.lock() {
            Ok(_guard) => self.process(session_id, message),
            Err(_) => {
                warn!(session_id, "Session lock poisoned");
                failure(replies::SAVE_FAILED)
            }
        };

        drop(handle);
        self.locks.prune();
        response
    }

    fn process(&self, session_id: &str, message: &str) -> AgentResponse {
        let now = self.clock.now();

        let mut session = match self.sessions.get(session_id) {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(session_id, "New session");
                ConversationSession::new(session_id)
            }
            Err(e) => {
                warn!(session_id, error = %e, "Session store read failed");
                return failure(replies::SAVE_FAILED);
            }
        };

        let before = session.phase;
        let step = match session.phase {
            Phase::Confirmation => self.on_confirmation(&mut session, message, now),
            _ => self.on_collecting(&mut session, message, now),
        };

        if !step.reset {
            session.push_turn(Role::User, message, self.history_turns);
            session.push_turn(Role::Assistant, &step.response, self.history_turns);
        }
        session.touch();

        if before != session.phase {
            info!(
                session_id,
                from = before.as_str(),
                to = session.phase.as_str(),
                "Phase transition"
            );
        }

        let response = AgentResponse {
            response: step.response,
            status: step.status,
            appointment: step.appointment,
            missing: session.slots.missing(),
            phase: session.phase,
        };

        if let Err(e) = self.sessions.put(session) {
            warn!(session_id, error = %e, "Session store write failed");
        }
        response
    }

    fn extract(&self, session: &ConversationSession, message: &str, now: NaiveDateTime, with_model: bool) -> Extraction {
        let normalizer = Normalizer::new(now.date());
        let history = session.history_text();
        let turn = Turn {
            text: message,
            normalizer,
            history: &history,
        };

        let mut extractors: Vec<&dyn SlotExtractor> = vec![&self.patterns];
        if with_model {
            if let Some(assisted) = &self.assisted {
                extractors.push(assisted);
            }
        }

        let mut extraction = extract_all(&extractors, &turn, &session.slots);
        canonicalize(&mut extraction.slots, &normalizer);
        extraction
    }

    /// Resolve the doctor slot to its directory name. On failure the slot is
    /// dropped and the raw input returned.
    fn resolve_doctor_slot(&self, slots: &mut SlotMap) -> Result<(), String> {
        let Some(raw) = slots.get(SlotField::Doctor).map(str::to_string) else {
            return Ok(());
        };
        match self.directory.resolve_doctor(&raw) {
            Some(doctor) => {
                slots.set(SlotField::Doctor, &doctor.name);
                Ok(())
            }
            None => {
                slots.remove(SlotField::Doctor);
                warn!(doctor = %raw, "Unresolvable doctor dropped");
                Err(raw)
            }
        }
    }

    fn on_collecting(&self, session: &mut ConversationSession, message: &str, now: NaiveDateTime) -> Step {
        let Extraction { mut slots, reply } = self.extract(session, message, now, true);
        let doctor = self.resolve_doctor_slot(&mut slots);
        let changed = slots != session.slots;

        if has_cancel_intent(message) && !changed && !session.slots.is_empty() {
            info!(session_id = %session.id, "Booking cancelled");
            session.reset();
            return Step::new(ResponseStatus::Chat, replies::CANCELLED).after_reset();
        }

        session.slots = slots;
        if !session.slots.is_empty() {
            session.phase = Phase::Collecting;
        }

        if let Err(raw) = doctor {
            session.phase = Phase::Collecting;
            return Step::new(ResponseStatus::Error, replies::unknown_doctor(&raw, &self.directory));
        }

        let wants_to_book = has_booking_intent(message);
        if session.slots.is_complete() && wants_to_book {
            return self.draft_for_confirmation(session, now, false);
        }

        let missing = session.slots.missing();
        if session.slots.is_complete() {
            return Step::new(ResponseStatus::Chat, reply.unwrap_or_else(|| replies::READY_TO_BOOK.into()));
        }

        if (wants_to_book || changed) && !has_info_intent(message) {
            let prompt = replies::missing_info(&missing);
            let response = match reply {
                Some(reply) => format!("{}\n\n{}", reply, prompt),
                None => prompt,
            };
            return Step::new(ResponseStatus::MissingInfo, response);
        }

        let response = reply.unwrap_or_else(|| {
            if has_info_intent(message) {
                replies::clinic_info(&self.directory)
            } else {
                replies::greeting(self.directory.clinic())
            }
        });
        Step::new(ResponseStatus::Chat, response)
    }

    fn draft_for_confirmation(&self, session: &mut ConversationSession, now: NaiveDateTime, amended: bool) -> Step {
        match self.desk.prepare_draft(&session.slots, now) {
            Ok(draft) => {
                debug!(
                    session_id = %session.id,
                    doctor_id = %draft.doctor_id,
                    date = %draft.date,
                    time = %draft.time,
                    amended,
                    "Draft ready for confirmation"
                );
                session.slots.set(SlotField::Date, &draft.date);
                session.slots.set(SlotField::Time, &draft.time);
                session.draft = Some(draft.clone());
                session.phase = Phase::Confirmation;
                Step::new(ResponseStatus::Confirmation, replies::confirmation_prompt(&draft))
                    .with_appointment(draft)
            }
            Err(e) => self.reject_draft(session, &e),
        }
    }

    fn reject_draft(&self, session: &mut ConversationSession, error: &ValidationError) -> Step {
        warn!(session_id = %session.id, field = error.field().as_str(), error = %error, "Draft rejected");
        session.slots.remove(error.field());
        session.draft = None;
        session.phase = Phase::Collecting;
        Step::new(ResponseStatus::Error, replies::invalid(error, &self.directory))
    }

    fn on_confirmation(&self, session: &mut ConversationSession, message: &str, now: NaiveDateTime) -> Step {
        let Extraction { mut slots, .. } = self.extract(session, message, now, false);

        if let Err(raw) = self.resolve_doctor_slot(&mut slots) {
            session.slots = slots;
            session.draft = None;
            session.phase = Phase::Collecting;
            return Step::new(ResponseStatus::Error, replies::unknown_doctor(&raw, &self.directory));
        }

        if slots != session.slots {
            session.slots = slots;
            return self.draft_for_confirmation(session, now, true);
        }

        if has_cancel_intent(message) {
            info!(session_id = %session.id, "Booking cancelled");
            session.reset();
            return Step::new(ResponseStatus::Chat, replies::CANCELLED).after_reset();
        }

        let Some(draft) = session.draft.clone() else {
            session.phase = Phase::Collecting;
            return Step::new(ResponseStatus::MissingInfo, replies::missing_info(&session.slots.missing()));
        };

        if !has_booking_intent(message) {
            return Step::new(ResponseStatus::Confirmation, replies::confirmation_prompt(&draft))
                .with_appointment(draft);
        }

        match self.desk.validate_and_commit(&draft, now) {
            Ok(CommitOutcome::Committed(appointment)) => {
                let id = appointment.appointment_id.clone().unwrap_or_default();
                session.phase = Phase::Booked;
                session.reset();
                Step::new(ResponseStatus::Confirmed, replies::confirmed(&id))
                    .with_appointment(appointment)
                    .after_reset()
            }
            Ok(CommitOutcome::Conflict { requested, alternatives }) => {
                Step::new(ResponseStatus::Error, replies::conflict(&requested, &alternatives))
                    .with_appointment(requested)
            }
            Err(BookingError::Invalid(e)) => self.reject_draft(session, &e),
            Err(BookingError::Ledger(e)) => {
                warn!(session_id = %session.id, error = %e, "Ledger append failed");
                Step::new(ResponseStatus::Error, replies::SAVE_FAILED)
            }
        }
    }

    /// Commit the session's pending draft without a chat message.
    ///
    /// On success the session is reset, so repeating the call reports
    /// [`ConfirmError::NoDraft`] instead of booking twice.
    pub fn confirm(&self, session_id: &str) -> Result<Confirmation, ConfirmError> {
        let handle = self
            .locks
            .handle(session_id)
            .map_err(|e| ConfirmError::Storage(e.to_string()))?;

        let result = match handle.lock() {
            Ok(_guard) => self.confirm_locked(session_id),
            Err(_) => Err(ConfirmError::Storage("session lock poisoned".into())),
        };

        drop(handle);
        self.locks.prune();
        result
    }

    fn confirm_locked(&self, session_id: &str) -> Result<Confirmation, ConfirmError> {
        let mut session = self
            .sessions
            .get(session_id)
            .map_err(|e| ConfirmError::Storage(e.to_string()))?
            .ok_or_else(|| ConfirmError::SessionNotFound(session_id.to_string()))?;
        let draft = session.draft.clone().ok_or(ConfirmError::NoDraft)?;

        match self.desk.validate_and_commit(&draft, self.clock.now()) {
            Ok(CommitOutcome::Committed(appointment)) => {
                let appointment_id = appointment.appointment_id.unwrap_or_default();
                info!(session_id, appointment_id = %appointment_id, "Confirmed by explicit request");
                session.reset();
                self.sessions
                    .put(session)
                    .map_err(|e| ConfirmError::Storage(e.to_string()))?;
                Ok(Confirmation {
                    message: replies::confirmed(&appointment_id),
                    appointment_id,
                })
            }
            Ok(CommitOutcome::Conflict { requested, alternatives }) => Err(ConfirmError::Conflict {
                message: replies::conflict(&requested, &alternatives),
                alternatives,
            }),
            Err(BookingError::Invalid(e)) => Err(ConfirmError::Invalid(e)),
            Err(BookingError::Ledger(e)) => {
                warn!(session_id, error = %e, "Ledger append failed");
                Err(ConfirmError::Storage(e.to_string()))
            }
        }
    }
}

fn failure(message: &str) -> AgentResponse {
    AgentResponse {
        response: message.to_string(),
        status: ResponseStatus::Error,
        appointment: None,
        missing: Vec::new(),
        phase: Phase::Greeting,
    }
}

/// Rewrite date and time slots in canonical form where they parse.
fn canonicalize(slots: &mut SlotMap, normalizer: &Normalizer) {
    if let Some(date) = slots.get(SlotField::Date).and_then(|d| normalizer.parse_date(d)) {
        slots.set(SlotField::Date, &date.format(DATE_FORMAT).to_string());
    }
    if let Some(time) = slots.get(SlotField::Time).and_then(parse_time) {
        slots.set(SlotField::Time, &time.format(TIME_FORMAT).to_string());
    }
}
