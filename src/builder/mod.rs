//! Builder API for ergonomic handler construction.
//!
//! This module provides fluent builders for transitions and activities and
//! the [`impl_event!`](crate::impl_event) macro for declaring event types.

pub mod error;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use transition::{ActivityBuilder, TransitionBuilder};

use crate::core::{Action, Activity, Event, Guard, StateId, Transition};

/// Create an unconditional transition without effect.
///
/// # Example
///
/// ```
/// use hierarch::builder::simple_transition;
/// use hierarch::Fsm;
///
/// let mut fsm = Fsm::new(());
/// let done = fsm.add_state("Done").unwrap();
/// let transition = simple_transition::<()>(done);
/// assert!(transition.is_unguarded());
/// ```
pub fn simple_transition<C>(target: StateId) -> Transition<C> {
    Transition::new(target)
}

/// Create a transition with a guard predicate.
pub fn guarded_transition<C, F>(target: StateId, guard: F) -> Transition<C>
where
    F: Fn(&C, &dyn Event) -> bool + Send + Sync + 'static,
{
    Transition::with_guard(Guard::new(guard), target)
}

/// Create an unguarded activity from a closure.
pub fn activity<C, F>(action: F) -> Activity<C>
where
    F: FnMut(&mut C, &dyn Event) + Send + 'static,
{
    Activity::new(Action::new(action))
}
