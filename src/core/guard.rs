//! Guard predicates for gating handlers.
//!
//! Guards are pure boolean functions over the machine context and the event
//! being processed. They decide whether a handler's action runs and, for
//! transitions, whether the transition is taken.

use super::event::Event;
use std::borrow::Cow;
use std::fmt;

type Predicate<C> = Box<dyn Fn(&C, &dyn Event) -> bool + Send + Sync>;

/// Pure predicate that determines if a handler fires.
///
/// # Example
///
/// ```rust
/// use hierarch::core::{Guard, Unnamed};
///
/// struct Counter {
///     value: u32,
/// }
///
/// let is_positive = Guard::named("is_positive", |ctx: &Counter, _event| ctx.value > 0);
///
/// assert!(is_positive.check(&Counter { value: 3 }, &Unnamed));
/// assert!(!is_positive.check(&Counter { value: 0 }, &Unnamed));
/// assert_eq!(is_positive.name(), "is_positive");
/// ```
pub struct Guard<C> {
    predicate: Option<Predicate<C>>,
    name: Cow<'static, str>,
}

impl<C> Guard<C> {
    /// The reserved "always true" guard used by unguarded handlers.
    pub fn always() -> Self {
        Guard {
            predicate: None,
            name: Cow::Borrowed("always"),
        }
    }

    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and free of side effects.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, &dyn Event) -> bool + Send + Sync + 'static,
    {
        Self::named("guard", predicate)
    }

    /// Create a guard with a name used in handler descriptions.
    pub fn named<F>(name: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&C, &dyn Event) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Some(Box::new(predicate)),
            name: name.into(),
        }
    }

    /// Evaluate the guard.
    pub fn check(&self, context: &C, event: &dyn Event) -> bool {
        self.predicate
            .as_ref()
            .is_none_or(|predicate| predicate(context, event))
    }

    /// True for the reserved always-true guard.
    pub fn is_always(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> Default for Guard<C> {
    fn default() -> Self {
        Self::always()
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guard").field(&self.name).finish()
    }
}
