//! Run-to-completion loop shared by the flat and hierarchical machines.

use crate::config::MachineConfig;
use crate::core::{ActivityResult, Enter, Event, StateResult, TransitionResult, Unnamed};
use crate::error::HsmError;

/// Outcome of handing one event to the current state (with bubbling, for
/// hierarchical machines) and performing the transition it requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub result: StateResult,
    pub transitioned: bool,
    /// An exit or enter activity fired while transferring.
    pub lifecycle_acted: bool,
}

impl Step {
    pub fn settled(result: StateResult) -> Self {
        Self {
            result,
            transitioned: false,
            lifecycle_acted: false,
        }
    }

    pub fn transitioned(result: StateResult, lifecycle_acted: bool) -> Self {
        Self {
            result,
            transitioned: true,
            lifecycle_acted,
        }
    }
}

/// Result of a `start`, `stop` or `dispatch` call.
///
/// `activity` and `transition` describe how the submitted event itself was
/// handled. Transitions chained afterwards through `Unnamed` probes are only
/// counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    result: StateResult,
    transitions_taken: usize,
    lifecycle_acted: bool,
}

impl DispatchOutcome {
    pub const UNTRIGGERED: Self = Self {
        result: StateResult::UNTRIGGERED,
        transitions_taken: 0,
        lifecycle_acted: false,
    };

    pub(crate) fn from_step(step: Step) -> Self {
        Self {
            result: step.result,
            transitions_taken: usize::from(step.transitioned),
            lifecycle_acted: step.lifecycle_acted,
        }
    }

    fn absorb(&mut self, step: Step) {
        self.transitions_taken += usize::from(step.transitioned);
        self.lifecycle_acted |= step.lifecycle_acted;
    }

    pub fn result(&self) -> StateResult {
        self.result
    }

    pub fn activity(&self) -> ActivityResult {
        self.result.activity
    }

    pub fn transition(&self) -> TransitionResult {
        self.result.transition
    }

    /// The submitted event fired an activity or a transition.
    pub fn handled(&self) -> bool {
        self.result.acted_or_requested_transition()
    }

    /// Transitions performed, including unconditional ones chained after
    /// the first.
    pub fn transitions_taken(&self) -> usize {
        self.transitions_taken
    }

    /// Some exit or enter activity ran while transitions were performed.
    pub fn lifecycle_acted(&self) -> bool {
        self.lifecycle_acted
    }
}

/// A machine that can take single steps. The chaining loop is provided.
pub(crate) trait Stepper {
    fn step(&mut self, event: &dyn Event) -> Result<Step, HsmError>;

    fn config(&self) -> &MachineConfig;

    /// Dispatch `event`, then keep probing with [`Unnamed`] while the
    /// previous step transitioned (or the submitted event was [`Enter`]).
    fn run_to_completion(&mut self, event: &dyn Event) -> Result<DispatchOutcome, HsmError> {
        let first = self.step(event)?;
        let mut outcome = DispatchOutcome::from_step(first);

        let mut probe = first.transitioned || event.is::<Enter>();
        let mut chained = 0;
        while probe {
            let step = self.step(&Unnamed)?;
            if step.transitioned {
                chained += 1;
                self.config().check_chain(chained)?;
            }
            outcome.absorb(step);
            probe = step.transitioned;
        }
        Ok(outcome)
    }
}
