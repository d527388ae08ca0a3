//! Guarded handlers: a guard paired with an action, generic over the kind of
//! result they report.
//!
//! [`Transition`] and [`Activity`] are the two kinds. They differ only in
//! whether a target state travels with the result.

use super::action::{Action, ActionError};
use super::event::{Event, EventType};
use super::guard::Guard;
use super::list::DispatchPolicy;
use super::state::StateId;
use crate::error::HsmError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Outcome of processing one event with a handler.
pub trait HandlerResult: Copy + Debug + PartialEq {
    fn triggered(&self) -> bool;
}

/// Result of running an activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityResult {
    triggered: bool,
}

impl ActivityResult {
    pub const UNTRIGGERED: Self = Self { triggered: false };
    pub const TRIGGERED: Self = Self { triggered: true };
}

impl HandlerResult for ActivityResult {
    fn triggered(&self) -> bool {
        self.triggered
    }
}

/// Result of evaluating a transition.
///
/// The target is only present when the transition was triggered, and every
/// triggered transition carries its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    target: Option<StateId>,
}

impl TransitionResult {
    pub const UNTRIGGERED: Self = Self { target: None };

    pub fn to(target: StateId) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn target(&self) -> Option<StateId> {
        self.target
    }
}

impl HandlerResult for TransitionResult {
    fn triggered(&self) -> bool {
        self.target.is_some()
    }
}

/// Capability set distinguishing handler kinds.
pub trait HandlerKind: Debug {
    type Output: HandlerResult;

    /// How a list of handlers of this kind is dispatched.
    const POLICY: DispatchPolicy;

    fn result(&self, triggered: bool) -> Self::Output;

    fn untriggered() -> Self::Output;

    fn describe_suffix(&self) -> String {
        String::new()
    }
}

/// Kind marker for transitions; carries the target state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionKind {
    target: StateId,
}

impl HandlerKind for TransitionKind {
    type Output = TransitionResult;
    const POLICY: DispatchPolicy = DispatchPolicy::StopAtFirstTrigger;

    fn result(&self, triggered: bool) -> TransitionResult {
        if triggered {
            TransitionResult::to(self.target)
        } else {
            TransitionResult::UNTRIGGERED
        }
    }

    fn untriggered() -> TransitionResult {
        TransitionResult::UNTRIGGERED
    }

    fn describe_suffix(&self) -> String {
        format!(" -> {}", self.target)
    }
}

/// Kind marker for activities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivityKind;

impl HandlerKind for ActivityKind {
    type Output = ActivityResult;
    const POLICY: DispatchPolicy = DispatchPolicy::RunAll;

    fn result(&self, triggered: bool) -> ActivityResult {
        ActivityResult { triggered }
    }

    fn untriggered() -> ActivityResult {
        ActivityResult::UNTRIGGERED
    }
}

/// A guard and an action, producing a result of kind `K`.
pub struct GuardedHandler<C, K> {
    guard: Guard<C>,
    action: Action<C>,
    kind: K,
    last_event: Option<EventType>,
    last_triggered: Option<bool>,
}

/// Guarded handler that moves the machine to a target state.
pub type Transition<C> = GuardedHandler<C, TransitionKind>;

/// Guarded handler that only runs an action.
pub type Activity<C> = GuardedHandler<C, ActivityKind>;

impl<C, K: HandlerKind> GuardedHandler<C, K> {
    fn from_parts(guard: Guard<C>, action: Action<C>, kind: K) -> Self {
        Self {
            guard,
            action,
            kind,
            last_event: None,
            last_triggered: None,
        }
    }

    /// Process one event: evaluate the guard, then run the action only if the
    /// guard held. Guard and action run at most once each, guard first.
    pub fn process(&mut self, context: &mut C, event: &dyn Event) -> Result<K::Output, HsmError> {
        self.last_event = Some(event.event_type());
        let triggered = self.guard.check(context, event);
        self.last_triggered = Some(triggered);

        tracing::trace!(
            handler = %self.describe(),
            event = %event.name(),
            triggered,
            "evaluated handler"
        );

        if triggered {
            self.action
                .run(context, event)
                .map_err(|source: ActionError| HsmError::ActionFailed {
                    handler: self.describe(),
                    source,
                })?;
        }

        Ok(self.kind.result(triggered))
    }

    pub fn guard(&self) -> &Guard<C> {
        &self.guard
    }

    pub fn action(&self) -> &Action<C> {
        &self.action
    }

    pub fn is_unguarded(&self) -> bool {
        self.guard.is_always()
    }

    /// Type of the most recently processed event.
    pub fn last_event(&self) -> Option<EventType> {
        self.last_event
    }

    /// Guard outcome of the most recent call to [`process`](Self::process).
    pub fn last_triggered(&self) -> Option<bool> {
        self.last_triggered
    }

    /// Human-readable form: `action()` or `[guard] action()`, with
    /// ` -> target` appended for transitions.
    pub fn describe(&self) -> String {
        let suffix = self.kind.describe_suffix();
        if self.guard.is_always() {
            format!("{}(){}", self.action.name(), suffix)
        } else {
            format!("[{}] {}(){}", self.guard.name(), self.action.name(), suffix)
        }
    }
}

impl<C> Transition<C> {
    /// Unguarded transition without effect.
    pub fn new(target: StateId) -> Self {
        Self::with_guard_and_effect(Guard::always(), target, Action::nop())
    }

    pub fn with_guard(guard: Guard<C>, target: StateId) -> Self {
        Self::with_guard_and_effect(guard, target, Action::nop())
    }

    pub fn with_effect(target: StateId, effect: Action<C>) -> Self {
        Self::with_guard_and_effect(Guard::always(), target, effect)
    }

    pub fn with_guard_and_effect(guard: Guard<C>, target: StateId, effect: Action<C>) -> Self {
        Self::from_parts(guard, effect, TransitionKind { target })
    }

    pub fn target(&self) -> StateId {
        self.kind.target
    }
}

impl<C> Activity<C> {
    /// Activity that runs on every processed event.
    pub fn new(action: Action<C>) -> Self {
        Self::with_guard(Guard::always(), action)
    }

    pub fn with_guard(guard: Guard<C>, action: Action<C>) -> Self {
        Self::from_parts(guard, action, ActivityKind)
    }
}

impl<C, K: HandlerKind> Debug for GuardedHandler<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
