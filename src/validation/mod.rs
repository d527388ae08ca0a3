//! Topology validation.
//!
//! Machines are checked once, when first started. Rules accumulate every
//! violation through `stillwater::Validation` instead of stopping at the
//! first, so a broken graph is reported in full:
//!
//! ```rust
//! use hierarch::{Fsm, HsmError, MachineConfig, Transition};
//!
//! let config = MachineConfig::default().with_unguarded_cycle_check(true);
//! let mut fsm = Fsm::with_config((), config);
//! let a = fsm.add_state("A").unwrap();
//! let b = fsm.add_state("B").unwrap();
//! fsm.add_unnamed_transition(a, Transition::new(b)).unwrap();
//! fsm.add_unnamed_transition(b, Transition::new(a)).unwrap();
//!
//! match fsm.start() {
//!     Err(HsmError::InvalidTopology { violations }) => assert_eq!(violations.len(), 1),
//!     other => panic!("expected a topology error, got {other:?}"),
//! }
//! ```

pub(crate) mod graph;
pub(crate) mod rules;

use crate::config::MachineConfig;
use crate::error::HsmError;
use graph::TopologyGraph;

/// Validate `graph`, converting accumulated violations into
/// [`HsmError::InvalidTopology`].
pub(crate) fn validate(graph: &TopologyGraph, config: &MachineConfig) -> Result<(), HsmError> {
    rules::into_result(rules::check_topology(graph, config))
}
