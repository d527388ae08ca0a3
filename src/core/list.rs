//! Ordered lists of handlers dispatched against a single event.

use super::event::Event;
use super::handler::{GuardedHandler, HandlerKind, HandlerResult};
use crate::error::HsmError;
use std::fmt;

/// How a [`HandlerList`] walks its handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Return the first triggered result; later handlers are not evaluated.
    StopAtFirstTrigger,
    /// Invoke every handler; return the last triggered result.
    RunAll,
}

/// Handlers of one kind, in registration order.
///
/// Registration order is load-bearing for transitions: an unguarded
/// transition always triggers, so everything registered after it in the same
/// list is dead.
pub struct HandlerList<C, K: HandlerKind> {
    handlers: Vec<GuardedHandler<C, K>>,
    policy: DispatchPolicy,
    contains_unguarded: bool,
}

impl<C, K: HandlerKind> HandlerList<C, K> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            policy: K::POLICY,
            contains_unguarded: false,
        }
    }

    pub fn push(&mut self, handler: GuardedHandler<C, K>) {
        if self.policy == DispatchPolicy::StopAtFirstTrigger && self.contains_unguarded {
            tracing::warn!(
                handler = %handler.describe(),
                "handler registered behind an unguarded one will never fire"
            );
        }
        if handler.is_unguarded() {
            self.contains_unguarded = true;
        }
        self.handlers.push(handler);
    }

    pub fn process(&mut self, context: &mut C, event: &dyn Event) -> Result<K::Output, HsmError> {
        let mut last = K::untriggered();
        for handler in &mut self.handlers {
            let result = handler.process(context, event)?;
            if result.triggered() {
                last = result;
                if self.policy == DispatchPolicy::StopAtFirstTrigger {
                    break;
                }
            }
        }
        Ok(last)
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Whether any handler in the list uses the always-true guard.
    pub fn contains_unguarded(&self) -> bool {
        self.contains_unguarded
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GuardedHandler<C, K>> {
        self.handlers.iter()
    }

    pub fn first(&self) -> Option<&GuardedHandler<C, K>> {
        self.handlers.first()
    }
}

impl<C, K: HandlerKind> Default for HandlerList<C, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, K: HandlerKind> fmt::Debug for HandlerList<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.iter()).finish()
    }
}
