//! Event-keyed tables of handler lists.

use super::event::{Event, EventType};
use super::handler::{GuardedHandler, HandlerKind};
use super::list::HandlerList;
use crate::error::HsmError;
use std::collections::HashMap;
use std::fmt;

/// Maps an exact event type to the handlers registered for it.
///
/// Lookups never consult the supertype relation: a handler registered for a
/// supertype does not see its subtypes.
pub struct EventTable<C, K: HandlerKind> {
    lists: HashMap<EventType, HandlerList<C, K>>,
}

impl<C, K: HandlerKind> EventTable<C, K> {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }

    /// Dispatch to the list registered for the event's runtime type, or
    /// report the kind's untriggered result when there is none.
    pub fn dispatch(&mut self, context: &mut C, event: &dyn Event) -> Result<K::Output, HsmError> {
        match self.lists.get_mut(&event.event_type()) {
            Some(list) => list.process(context, event),
            None => Ok(K::untriggered()),
        }
    }

    /// Append a handler, creating the list for `event_type` on first use.
    pub fn register(&mut self, event_type: EventType, handler: GuardedHandler<C, K>) {
        self.lists.entry(event_type).or_default().push(handler);
    }

    /// Remove every handler registered for exactly `event_type`.
    pub fn clear(&mut self, event_type: EventType) -> Option<HandlerList<C, K>> {
        self.lists.remove(&event_type)
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.lists.contains_key(&event_type)
    }

    pub fn get(&self, event_type: EventType) -> Option<&HandlerList<C, K>> {
        self.lists.get(&event_type)
    }

    pub fn event_types(&self) -> impl Iterator<Item = EventType> + '_ {
        self.lists.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventType, &HandlerList<C, K>)> {
        self.lists.iter().map(|(ty, list)| (*ty, list))
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl<C, K: HandlerKind> Default for EventTable<C, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, K: HandlerKind> fmt::Debug for EventTable<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.lists.iter()).finish()
    }
}
