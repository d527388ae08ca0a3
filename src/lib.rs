//! Hierarch: an embeddable hierarchical state machine engine
//!
//! Hierarch drives flat and hierarchical state machines from user-defined
//! events. Handlers are small guarded closures attached to states; the engine
//! does the bookkeeping around them.
//!
//! # Core Concepts
//!
//! - **Events**: any Rust type implementing [`Event`], classified by its exact
//!   runtime type (see [`impl_event!`])
//! - **Guards and actions**: pure predicates and side-effecting closures over a
//!   machine-owned context
//! - **Transitions and activities**: guarded handlers; a list of transitions
//!   stops at the first that fires while every activity in a list runs
//! - **Machines**: [`Fsm`] for flat machines and [`Hsm`] for nested states,
//!   with event bubbling, exit/enter ordering and unconditional chaining
//! - **Validation**: topologies are checked once on start and every
//!   violation is reported together
//!
//! # Example
//!
//! ```rust
//! use hierarch::{impl_event, Activity, Action, Guard, Hsm, Transition};
//!
//! #[derive(Debug)]
//! struct Toggle;
//! impl_event!(Toggle);
//!
//! #[derive(Debug, Default)]
//! struct Lamp {
//!     broken: bool,
//!     switches: u32,
//! }
//!
//! let mut hsm = Hsm::new(Lamp::default());
//! let top = hsm.root();
//! let off = hsm.add_state("Off", top).unwrap();
//! let on = hsm.add_state("On", top).unwrap();
//!
//! hsm.add_transition::<Toggle>(
//!     off,
//!     Transition::with_guard(Guard::named("working", |lamp: &Lamp, _| !lamp.broken), on),
//! )
//! .unwrap();
//! hsm.add_transition::<Toggle>(on, Transition::new(off)).unwrap();
//! hsm.add_enter_activity(
//!     on,
//!     Activity::new(Action::new(|lamp: &mut Lamp, _| lamp.switches += 1)),
//! )
//! .unwrap();
//!
//! hsm.start().unwrap();
//! assert_eq!(hsm.current(), off);
//!
//! hsm.dispatch(&Toggle).unwrap();
//! assert_eq!(hsm.current(), on);
//!
//! hsm.dispatch(&Toggle).unwrap();
//! hsm.context_mut().broken = true;
//! let outcome = hsm.dispatch(&Toggle).unwrap();
//!
//! assert!(!outcome.handled());
//! assert_eq!(hsm.current(), off);
//! assert_eq!(hsm.context().switches, 1);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod machine;
pub mod snapshot;
mod validation;

// Re-export commonly used types
pub use crate::builder::{ActivityBuilder, BuildError, TransitionBuilder};
pub use crate::config::MachineConfig;
pub use crate::core::{
    Action, ActionError, Activity, Enter, Event, EventType, Exit, Guard, StateId, StateResult,
    Transition, Unnamed,
};
pub use crate::error::{HsmError, TopologyViolation};
pub use crate::machine::{DispatchOutcome, Fsm, Hsm, StateKind};
pub use crate::snapshot::{MachineSnapshot, SnapshotError};
