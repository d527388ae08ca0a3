//! Builders for transitions and activities.

use crate::builder::error::BuildError;
use crate::core::{Action, ActionError, Activity, Event, Guard, StateId, Transition};
use std::borrow::Cow;

/// Builder for constructing transitions with a fluent API.
///
/// ```
/// use hierarch::builder::TransitionBuilder;
/// use hierarch::core::Transition;
/// # use hierarch::Fsm;
/// # let mut fsm = Fsm::new(0u8);
/// # let target = fsm.add_state("Target").unwrap();
///
/// let transition: Transition<u8> = TransitionBuilder::new()
///     .to(target)
///     .when_named("is_ready", |ready: &u8, _| *ready > 0)
///     .run(|ready, _| *ready = 0)
///     .build()
///     .unwrap();
///
/// assert_eq!(transition.describe(), format!("[is_ready] action() -> {target}"));
/// ```
pub struct TransitionBuilder<C> {
    target: Option<StateId>,
    guard: Guard<C>,
    effect: Action<C>,
}

impl<C> TransitionBuilder<C> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            target: None,
            guard: Guard::always(),
            effect: Action::nop(),
        }
    }

    /// Set the target state (required).
    pub fn to(mut self, target: StateId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the guard (optional, defaults to always true).
    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = guard;
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&C, &dyn Event) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    pub fn when_named<F>(self, name: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&C, &dyn Event) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::named(name, predicate))
    }

    /// Set the effect (optional, defaults to no-op).
    pub fn effect(mut self, effect: Action<C>) -> Self {
        self.effect = effect;
        self
    }

    /// Set the effect using a closure.
    pub fn run<F>(self, effect: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) + Send + 'static,
    {
        self.effect(Action::new(effect))
    }

    /// Set an effect that may fail and abort the dispatch.
    pub fn try_run<F>(self, name: impl Into<Cow<'static, str>>, effect: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) -> Result<(), ActionError> + Send + 'static,
    {
        self.effect(Action::fallible(name, effect))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<C>, BuildError> {
        let target = self.target.ok_or(BuildError::MissingTarget)?;
        Ok(Transition::with_guard_and_effect(
            self.guard,
            target,
            self.effect,
        ))
    }
}

impl<C> Default for TransitionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing activities with a fluent API.
pub struct ActivityBuilder<C> {
    guard: Guard<C>,
    action: Option<Action<C>>,
}

impl<C> ActivityBuilder<C> {
    pub fn new() -> Self {
        Self {
            guard: Guard::always(),
            action: None,
        }
    }

    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = guard;
        self
    }

    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&C, &dyn Event) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Set the action (required).
    pub fn action(mut self, action: Action<C>) -> Self {
        self.action = Some(action);
        self
    }

    pub fn run<F>(self, action: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) + Send + 'static,
    {
        self.action(Action::new(action))
    }

    pub fn run_named<F>(self, name: impl Into<Cow<'static, str>>, action: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) + Send + 'static,
    {
        self.action(Action::named(name, action))
    }

    /// Build the activity.
    pub fn build(self) -> Result<Activity<C>, BuildError> {
        let action = self.action.ok_or(BuildError::MissingAction)?;
        Ok(Activity::with_guard(self.guard, action))
    }
}

impl<C> Default for ActivityBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
