//! Stage transition machine for the sales pipeline.
//!
//! The board is free-form Kanban: any stage may move to any other stage and
//! a requested transition is always applied. The machine resets the record's
//! stage clock, emits the transition event, and hands it to the automation
//! dispatcher without awaiting it. Persisting the mutated record stays with
//! the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use firedesk_core::records::{LeadRecord, Stage};

use crate::automation::AutomationDispatcher;

/// One stage move. Consumed by the automation dispatcher; not persisted.
#[derive(Debug, Clone)]
pub struct StageTransitionEvent {
    pub record_id: String,
    pub from_stage: Stage,
    pub to_stage: Stage,
    pub at: DateTime<Utc>,
}

/// Result of a transition request.
pub struct TransitionOutcome {
    pub event: StageTransitionEvent,
    /// Handle on the spawned automation, when a dispatcher is wired.
    /// Callers may drop it; short-lived hosts await it to drain.
    pub automation: Option<JoinHandle<()>>,
}

/// Applies stage moves and fans out transition events.
#[derive(Default)]
pub struct TransitionMachine {
    dispatcher: Option<Arc<AutomationDispatcher>>,
}

impl TransitionMachine {
    pub fn new() -> Self {
        Self { dispatcher: None }
    }

    pub fn with_dispatcher(dispatcher: Arc<AutomationDispatcher>) -> Self {
        Self { dispatcher: Some(dispatcher) }
    }

    /// Apply a stage move. Never fails; re-entering the current stage is a
    /// valid move that restarts the stage clock.
    pub fn request_transition(
        &self,
        lead: &mut LeadRecord,
        to_stage: Stage,
        now: DateTime<Utc>,
    ) -> TransitionOutcome {
        let event = StageTransitionEvent {
            record_id: lead.id.clone(),
            from_stage: lead.stage,
            to_stage,
            at: now,
        };
        lead.stage = to_stage;
        lead.last_updated_at = now;
        tracing::info!(
            "📌 Lead '{}' moved: {} → {}",
            lead.id,
            event.from_stage.label(),
            event.to_stage.label()
        );

        let automation = self
            .dispatcher
            .as_ref()
            .map(|dispatcher| dispatcher.clone().dispatch_detached(event.clone(), lead.clone()));
        TransitionOutcome { event, automation }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
