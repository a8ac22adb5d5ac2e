//! Model-assisted slot extraction.

use std::sync::Arc;

use clinic_booking_llm::{request_extraction, ClinicContext, LanguageModel};
use tracing::{debug, warn};

use super::{Extraction, SlotExtractor, Turn};
use crate::models::{SlotField, SlotMap};

/// Extracts fields and a conversational reply through the language model.
///
/// A model failure degrades to an empty extraction; the turn proceeds on
/// whatever the other strategies found.
pub struct ModelAssistedExtractor {
    model: Arc<dyn LanguageModel>,
    context: ClinicContext,
}

impl ModelAssistedExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, context: ClinicContext) -> Self {
        Self { model, context }
    }
}

impl SlotExtractor for ModelAssistedExtractor {
    fn extract(&self, turn: &Turn<'_>, prior: &SlotMap) -> Extraction {
        let collected = prior.render();
        let reply = match request_extraction(
            self.model.as_ref(),
            &self.context,
            turn.text,
            turn.history,
            &collected,
        ) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(model = self.model.name(), error = %e, "Model extraction failed, using patterns only");
                return Extraction::default();
            }
        };

        let mut slots = SlotMap::new();
        for (key, value) in reply.fields.iter() {
            if let Some(field) = SlotField::from_key(key) {
                slots.set(field, value);
            }
        }
        debug!(missing = ?reply.missing, "Model extraction parsed");

        Extraction {
            slots,
            reply: (!reply.reply.is_empty()).then_some(reply.reply),
        }
    }

    fn name(&self) -> &str {
        "model"
    }
}
