//! Effects and actions run by handlers whose guard holds.

use super::event::Event;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// Error type a fallible action may return.
pub type ActionError = Box<dyn Error + Send + Sync + 'static>;

type ActionFn<C> = Box<dyn FnMut(&mut C, &dyn Event) -> Result<(), ActionError> + Send>;

/// Side-effecting procedure invoked by a handler when its guard is true.
///
/// Actions mutate the machine context. A fallible action aborts the
/// in-flight dispatch when it returns an error.
pub struct Action<C> {
    run: Option<ActionFn<C>>,
    name: Cow<'static, str>,
}

impl<C> Action<C> {
    /// The reserved no-op action.
    pub fn nop() -> Self {
        Action {
            run: None,
            name: Cow::Borrowed("nop"),
        }
    }

    pub fn new<F>(action: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) + Send + 'static,
    {
        Self::named("action", action)
    }

    pub fn named<F>(name: impl Into<Cow<'static, str>>, mut action: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) + Send + 'static,
    {
        Action {
            run: Some(Box::new(move |context: &mut C, event: &dyn Event| {
                action(context, event);
                Ok(())
            })),
            name: name.into(),
        }
    }

    /// Create an action that may fail.
    pub fn fallible<F>(name: impl Into<Cow<'static, str>>, action: F) -> Self
    where
        F: FnMut(&mut C, &dyn Event) -> Result<(), ActionError> + Send + 'static,
    {
        Action {
            run: Some(Box::new(action)),
            name: name.into(),
        }
    }

    pub fn run(&mut self, context: &mut C, event: &dyn Event) -> Result<(), ActionError> {
        match self.run.as_mut() {
            Some(action) => action(context, event),
            None => Ok(()),
        }
    }

    pub fn is_nop(&self) -> bool {
        self.run.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> Default for Action<C> {
    fn default() -> Self {
        Self::nop()
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{Enter, Unnamed};

    #[test]
    fn nop_does_nothing() {
        let mut action: Action<Vec<&str>> = Action::nop();
        let mut log = Vec::new();

        assert!(action.is_nop());
        assert!(action.run(&mut log, &Enter).is_ok());
        assert!(log.is_empty());
        assert_eq!(action.name(), "nop");
    }

    #[test]
    fn action_mutates_context() {
        let mut action = Action::named("push", |log: &mut Vec<String>, event: &dyn Event| {
            log.push(event.name().to_string());
        });
        let mut log = Vec::new();

        action.run(&mut log, &Enter).unwrap();
        action.run(&mut log, &Unnamed).unwrap();

        assert_eq!(log, vec!["Enter", "Unnamed"]);
        assert_eq!(action.name(), "push");
    }

    #[test]
    fn fallible_action_reports_error() {
        let mut action = Action::fallible("reject", |_: &mut (), _: &dyn Event| {
            Err("door jammed".into())
        });

        let err = action.run(&mut (), &Enter).unwrap_err();
        assert_eq!(err.to_string(), "door jammed");
    }
}
