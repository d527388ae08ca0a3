//! Machine configuration.

use crate::error::HsmError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Tunables shared by [`Fsm`](crate::machine::Fsm) and
/// [`Hsm`](crate::machine::Hsm).
///
/// Missing fields fall back to their defaults when deserializing:
///
/// ```rust
/// use hierarch::config::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "max_chain_steps": 32 }"#).unwrap();
/// assert_eq!(config.max_chain_steps, Some(32));
/// assert_eq!(config.history_capacity, 64);
/// assert!(!config.reject_unguarded_cycles);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Transition records kept per machine; 0 disables history.
    pub history_capacity: usize,

    /// Upper bound on unconditional transitions chained by one dispatch.
    /// `None` leaves chaining unbounded.
    pub max_chain_steps: Option<usize>,

    /// Reject topologies containing a cycle of states whose `Unnamed`
    /// transitions are headed by an unguarded transition. Off by default:
    /// such a cycle then chains forever unless `max_chain_steps` is set.
    pub reject_unguarded_cycles: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_chain_steps: None,
            reject_unguarded_cycles: false,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_max_chain_steps(mut self, limit: usize) -> Self {
        self.max_chain_steps = Some(limit);
        self
    }

    pub fn with_unguarded_cycle_check(mut self, enabled: bool) -> Self {
        self.reject_unguarded_cycles = enabled;
        self
    }

    /// Fail once `steps` chained transitions exceed the configured bound.
    pub(crate) fn check_chain(&self, steps: usize) -> Result<(), HsmError> {
        match self.max_chain_steps {
            Some(limit) if steps > limit => Err(HsmError::ChainLimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}
