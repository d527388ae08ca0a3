//! Event identity.
//!
//! Events are plain Rust values classified solely by their runtime type.
//! Handler tables key on the exact [`EventType`] of an event; the looser
//! [`compatible`] relation is only offered for auxiliary equality checks.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Upper bound on declared supertype chains. Guards against a chain that
/// loops back on itself through hand-written `supertype` impls.
const MAX_SUPERTYPE_DEPTH: usize = 64;

/// Trait implemented by every value that can be dispatched to a machine.
///
/// Implementations are normally generated with [`impl_event!`](crate::impl_event),
/// which can also declare a supertype:
///
/// ```rust
/// use hierarch::impl_event;
/// use hierarch::core::{Event, EventType};
///
/// #[derive(Debug)]
/// struct Input;
/// #[derive(Debug)]
/// struct KeyPress(char);
///
/// impl_event!(Input);
/// impl_event!(KeyPress: Input);
///
/// let key = KeyPress('a');
/// assert!(key.event_type().is_subtype_of(&EventType::of::<Input>()));
/// ```
pub trait Event: Any + fmt::Debug + 'static {
    /// Runtime type of this value.
    fn event_type(&self) -> EventType;

    /// Borrow as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Declared supertype of this event type, if any.
    fn supertype() -> Option<EventType>
    where
        Self: Sized,
    {
        None
    }
}

impl dyn Event {
    /// Check whether this event is exactly of type `T`.
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete event type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn name(&self) -> &'static str {
        self.event_type().name()
    }
}

/// Marker type standing in for an absent event.
struct NullEvent;

fn no_supertype() -> Option<EventType> {
    None
}

/// Runtime classification of an event.
///
/// Equality and hashing use the underlying [`TypeId`] only, so two
/// `EventType`s are equal exactly when they classify the same Rust type.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
    supertype: fn() -> Option<EventType>,
}

impl EventType {
    /// Classification of the event type `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: short_type_name(std::any::type_name::<E>()),
            supertype: E::supertype,
        }
    }

    /// The dedicated "null type" an absent event classifies as.
    pub fn null() -> Self {
        Self {
            id: TypeId::of::<NullEvent>(),
            name: "None",
            supertype: no_supertype,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_null(&self) -> bool {
        self.id == TypeId::of::<NullEvent>()
    }

    /// Declared supertype, if any.
    pub fn supertype(&self) -> Option<EventType> {
        (self.supertype)()
    }

    /// Reflexive subtype check that walks the declared supertype chain.
    pub fn is_subtype_of(&self, other: &EventType) -> bool {
        let mut current = Some(*self);
        for _ in 0..MAX_SUPERTYPE_DEPTH {
            match current {
                Some(ty) if ty == *other => return true,
                Some(ty) => current = ty.supertype(),
                None => return false,
            }
        }
        false
    }

    /// Symmetric compatibility: one type is a subtype of the other.
    ///
    /// This relation is reflexive and symmetric but NOT transitive. Two
    /// unrelated subtypes of a common supertype are each compatible with
    /// the supertype and never with each other. It must not be confused with
    /// table lookup, which always matches the exact type. The null type is
    /// compatible with nothing.
    pub fn compatible_with(&self, other: &EventType) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self.is_subtype_of(other) || other.is_subtype_of(self)
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Return the runtime type of an event, mapping an absent event to
/// [`EventType::null`].
pub fn classify(event: Option<&dyn Event>) -> EventType {
    event.map_or_else(EventType::null, |e| e.event_type())
}

/// True iff `ty` classifies an actual event (anything but the null type).
pub fn is_event_type(ty: &EventType) -> bool {
    !ty.is_null()
}

/// Compatibility of two event values. See [`EventType::compatible_with`].
pub fn compatible(a: Option<&dyn Event>, b: Option<&dyn Event>) -> bool {
    classify(a).compatible_with(&classify(b))
}

/// Built-in marker processed when a state is entered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enter;

/// Built-in marker processed when a state is exited.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exit;

/// Synthetic marker used to probe a freshly entered state for unconditional
/// transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unnamed;

crate::impl_event!(Enter);
crate::impl_event!(Exit);
crate::impl_event!(Unnamed);
