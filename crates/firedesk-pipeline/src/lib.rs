//! # Firedesk Pipeline
//!
//! Sales pipeline stage machine and stage-entry automation. Transitions are
//! free-form board moves that reset the stage clock; automations are
//! fire-and-forget side effects keyed on the destination stage.

pub mod automation;
pub mod transition;

pub use automation::AutomationDispatcher;
pub use transition::{StageTransitionEvent, TransitionMachine, TransitionOutcome};
