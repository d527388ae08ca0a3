//! States: an activity table, a transition table and an active flag.

use super::event::{Enter, Event, EventType, Exit, Unnamed};
use super::handler::{
    Activity, ActivityKind, ActivityResult, HandlerResult, Transition, TransitionKind,
    TransitionResult,
};
use super::table::EventTable;
use crate::error::HsmError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Handle of a state inside the machine that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    pub(crate) const fn new(index: usize) -> Self {
        StateId(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Activity and transition outcomes of one event, bundled.
///
/// The two are independent: an activity and a transition registered for the
/// same event may both fire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateResult {
    pub activity: ActivityResult,
    pub transition: TransitionResult,
}

impl StateResult {
    pub const UNTRIGGERED: Self = Self {
        activity: ActivityResult::UNTRIGGERED,
        transition: TransitionResult::UNTRIGGERED,
    };

    pub fn transition_requested(&self) -> bool {
        self.transition.triggered()
    }

    pub fn acted(&self) -> bool {
        self.activity.triggered()
    }

    pub fn acted_or_requested_transition(&self) -> bool {
        self.acted() || self.transition_requested()
    }
}

/// A named state with its handler tables.
///
/// `active` is true strictly between a completed [`enter`](Self::enter) and
/// the start of [`exit`](Self::exit).
pub struct State<C> {
    name: Cow<'static, str>,
    activities: EventTable<C, ActivityKind>,
    transitions: EventTable<C, TransitionKind>,
    active: bool,
}

impl<C> State<C> {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            activities: EventTable::new(),
            transitions: EventTable::new(),
            active: false,
        }
    }

    /// Dispatch to both tables. Activities run before transitions are
    /// evaluated.
    pub fn process_event(
        &mut self,
        context: &mut C,
        event: &dyn Event,
    ) -> Result<StateResult, HsmError> {
        let activity = self.activities.dispatch(context, event)?;
        let transition = self.transitions.dispatch(context, event)?;
        Ok(StateResult {
            activity,
            transition,
        })
    }

    /// Mark active, then run the enter activities.
    pub fn enter(&mut self, context: &mut C) -> Result<StateResult, HsmError> {
        self.active = true;
        self.process_event(context, &Enter)
    }

    /// Run the exit activities while still active, then mark inactive.
    pub fn exit(&mut self, context: &mut C) -> Result<StateResult, HsmError> {
        let result = self.process_event(context, &Exit)?;
        self.active = false;
        Ok(result)
    }

    pub fn add_activity(&mut self, event_type: EventType, activity: Activity<C>) {
        self.activities.register(event_type, activity);
    }

    pub fn add_enter_activity(&mut self, activity: Activity<C>) {
        self.add_activity(EventType::of::<Enter>(), activity);
    }

    pub fn add_exit_activity(&mut self, activity: Activity<C>) {
        self.add_activity(EventType::of::<Exit>(), activity);
    }

    pub fn add_transition(&mut self, event_type: EventType, transition: Transition<C>) {
        self.transitions.register(event_type, transition);
    }

    pub fn add_unnamed_transition(&mut self, transition: Transition<C>) {
        self.add_transition(EventType::of::<Unnamed>(), transition);
    }

    /// Drop every transition registered for exactly `event_type`.
    pub fn clear_transitions(&mut self, event_type: EventType) {
        self.transitions.clear(event_type);
    }

    pub fn has_activities_for(&self, event_type: EventType) -> bool {
        self.activities.contains(event_type)
    }

    pub fn has_transition_for(&self, event_type: EventType) -> bool {
        self.transitions.contains(event_type)
    }

    pub fn activities(&self) -> &EventTable<C, ActivityKind> {
        &self.activities
    }

    pub fn transitions(&self) -> &EventTable<C, TransitionKind> {
        &self.transitions
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Multi-line listing of the state's handlers, indented by `level`.
    pub fn info(&self, level: usize) -> String {
        let indent = "  ".repeat(level);
        let mut out = format!("{indent}{}: State", self.name);
        let mut entries: Vec<String> = self
            .activities
            .iter()
            .flat_map(|(ty, list)| list.iter().map(move |a| format!("on {ty}: {}", a.describe())))
            .chain(self.transitions.iter().flat_map(|(ty, list)| {
                list.iter().map(move |t| format!("on {ty}: {}", t.describe()))
            }))
            .collect();
        entries.sort();
        for entry in entries {
            out.push('\n');
            out.push_str(&indent);
            out.push_str("  ");
            out.push_str(&entry);
        }
        out
    }
}

impl<C> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("activities", &self.activities)
            .field("transitions", &self.transitions)
            .finish()
    }
}
