//! Core building blocks of the dispatch engine.
//!
//! This module contains everything a single state needs:
//! - Event identity via the `Event` trait and `EventType`
//! - Guards and actions, composed into guarded handlers
//! - Handler lists and event-keyed handler tables
//! - The `State` itself and the transition history
//!
//! Machines in [`crate::machine`] compose these into flat and hierarchical
//! state machines.

mod action;
mod event;
mod guard;
mod handler;
mod history;
mod list;
mod state;
mod table;

pub use action::{Action, ActionError};
pub use event::{classify, compatible, is_event_type, Enter, Event, EventType, Exit, Unnamed};
pub use guard::Guard;
pub use handler::{
    Activity, ActivityKind, ActivityResult, GuardedHandler, HandlerKind, HandlerResult,
    Transition, TransitionKind, TransitionResult,
};
pub use history::{StateHistory, TransitionRecord};
pub use list::{DispatchPolicy, HandlerList};
pub use state::{State, StateId, StateResult};
pub use table::EventTable;
