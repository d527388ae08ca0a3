//! Flat and hierarchical machines.
//!
//! Both kinds share the run-to-completion loop in [`run`]: an event is handed
//! to the current state, the requested transition is performed, and the new
//! state is probed with [`Unnamed`](crate::core::Unnamed) until no further
//! transition fires.

mod fsm;
mod hsm;
mod run;
mod tree;

pub use fsm::Fsm;
pub use hsm::Hsm;
pub use run::DispatchOutcome;
pub use tree::StateKind;

use crate::core::{Enter, Event, EventType, Exit, StateHistory, StateId, TransitionRecord};
use crate::error::HsmError;
use chrono::Utc;
use uuid::Uuid;

/// `Enter` and `Exit` drive lifecycle activities; transitions on them are
/// rejected.
pub(crate) fn check_transition_key(event_type: EventType) -> Result<(), HsmError> {
    if event_type == EventType::of::<Enter>() || event_type == EventType::of::<Exit>() {
        return Err(HsmError::precondition(format!(
            "transitions cannot be keyed on '{event_type}'"
        )));
    }
    Ok(())
}

/// Log a completed transition and append it to `history`.
pub(crate) fn record_transition(
    history: &mut StateHistory,
    machine: Uuid,
    (from, from_name): (StateId, &str),
    (to, to_name): (StateId, &str),
    trigger: &dyn Event,
) {
    tracing::debug!(
        %machine,
        from = from_name,
        to = to_name,
        trigger = trigger.name(),
        "transition completed"
    );
    history.record(TransitionRecord {
        from,
        to,
        from_name: from_name.to_string(),
        to_name: to_name.to_string(),
        trigger: trigger.name().to_string(),
        timestamp: Utc::now(),
    });
}
