//! Flat finite state machine.

use super::run::{DispatchOutcome, Step, Stepper};
use super::{check_transition_key, record_transition, StateKind};
use crate::config::MachineConfig;
use crate::core::{
    Activity, ActivityKind, Enter, Event, EventType, Exit, HandlerList, State, StateHistory,
    StateId, StateResult, Transition, TransitionResult, Unnamed,
};
use crate::error::{HsmError, TopologyViolation};
use crate::snapshot::MachineSnapshot;
use crate::validation::graph::{GraphNode, GraphRegion, TopologyGraph};
use std::borrow::Cow;
use uuid::Uuid;

const INITIAL: StateId = StateId::new(0);
const FINAL: StateId = StateId::new(1);
const FIRST_STATE: usize = 2;

/// A flat state machine owning its states and a user context `C`.
///
/// Every machine starts with two pseudostates. The initial pseudostate holds
/// one unconditional transition to the first state added (or to the final
/// pseudostate while there is none). Start activities are the initial
/// pseudostate's enter activities; stop activities are the final
/// pseudostate's.
///
/// # Example
///
/// ```rust
/// use hierarch::{impl_event, Action, Fsm, Transition};
///
/// #[derive(Debug)]
/// struct Coin;
/// impl_event!(Coin);
///
/// let mut fsm = Fsm::new(0u32);
/// let locked = fsm.add_state("Locked").unwrap();
/// let unlocked = fsm.add_state("Unlocked").unwrap();
/// fsm.add_transition::<Coin>(
///     locked,
///     Transition::with_effect(unlocked, Action::new(|coins: &mut u32, _| *coins += 1)),
/// )
/// .unwrap();
///
/// fsm.start().unwrap();
/// assert_eq!(fsm.current(), locked);
///
/// fsm.process_event(&Coin).unwrap();
/// assert_eq!(fsm.current(), unlocked);
/// assert_eq!(*fsm.context(), 1);
/// ```
pub struct Fsm<C> {
    id: Uuid,
    states: Vec<State<C>>,
    current: StateId,
    explicit_initial: bool,
    on_transition_completed: HandlerList<C, ActivityKind>,
    context: C,
    config: MachineConfig,
    history: StateHistory,
    frozen: bool,
}

impl<C> Fsm<C> {
    pub fn new(context: C) -> Self {
        Self::with_config(context, MachineConfig::default())
    }

    pub fn with_config(context: C, config: MachineConfig) -> Self {
        let mut initial = State::new("Initial");
        initial.add_unnamed_transition(Transition::new(FINAL));
        Self {
            id: Uuid::new_v4(),
            states: vec![initial, State::new("Final")],
            current: INITIAL,
            explicit_initial: false,
            on_transition_completed: HandlerList::new(),
            history: StateHistory::with_capacity(config.history_capacity),
            context,
            config,
            frozen: false,
        }
    }

    /// Add a state. The first one added becomes the initial state unless
    /// [`set_initial_state`](Self::set_initial_state) was called.
    pub fn add_state(&mut self, name: impl Into<Cow<'static, str>>) -> Result<StateId, HsmError> {
        self.ensure_mutable()?;
        let id = StateId::new(self.states.len());
        self.states.push(State::new(name));
        if !self.explicit_initial && id.index() == FIRST_STATE {
            self.bind_initial(id);
        }
        Ok(id)
    }

    /// Rebind the initial pseudostate to `state` (a user state or the final
    /// pseudostate).
    pub fn set_initial_state(&mut self, state: StateId) -> Result<(), HsmError> {
        self.ensure_mutable()?;
        if state != FINAL && !self.is_user_state(state) {
            return Err(HsmError::topology(TopologyViolation::UnknownState(state)));
        }
        self.bind_initial(state);
        self.explicit_initial = true;
        Ok(())
    }

    fn bind_initial(&mut self, target: StateId) {
        let initial = &mut self.states[INITIAL.index()];
        initial.clear_transitions(EventType::of::<Unnamed>());
        initial.add_unnamed_transition(Transition::new(target));
    }

    /// Register a transition on `from`, keyed on the event type `E`.
    pub fn add_transition<E: Event>(
        &mut self,
        from: StateId,
        transition: Transition<C>,
    ) -> Result<(), HsmError> {
        self.add_transition_for(from, EventType::of::<E>(), transition)
    }

    pub fn add_transition_for(
        &mut self,
        from: StateId,
        event_type: EventType,
        transition: Transition<C>,
    ) -> Result<(), HsmError> {
        self.ensure_mutable()?;
        check_transition_key(event_type)?;
        let target = transition.target();
        let from_name = self.state_mut(from)?.name().to_string();
        if target.index() >= self.states.len() {
            return Err(HsmError::topology(TopologyViolation::UnknownTarget {
                from: from_name,
                target,
            }));
        }
        if target == INITIAL {
            return Err(HsmError::topology(
                TopologyViolation::TargetsInitialPseudostate {
                    from: from_name,
                    target: self.states[INITIAL.index()].name().to_string(),
                },
            ));
        }
        self.states[from.index()].add_transition(event_type, transition);
        Ok(())
    }

    /// Register an unconditional transition, taken by the `Unnamed` probe
    /// that follows every completed transition.
    pub fn add_unnamed_transition(
        &mut self,
        from: StateId,
        transition: Transition<C>,
    ) -> Result<(), HsmError> {
        self.add_transition::<Unnamed>(from, transition)
    }

    pub fn add_activity<E: Event>(
        &mut self,
        state: StateId,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        self.add_activity_for(state, EventType::of::<E>(), activity)
    }

    pub fn add_activity_for(
        &mut self,
        state: StateId,
        event_type: EventType,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        self.ensure_mutable()?;
        self.state_mut(state)?.add_activity(event_type, activity);
        Ok(())
    }

    pub fn add_enter_activity(
        &mut self,
        state: StateId,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        self.add_activity::<Enter>(state, activity)
    }

    pub fn add_exit_activity(
        &mut self,
        state: StateId,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        self.add_activity::<Exit>(state, activity)
    }

    /// Activity run when the machine starts.
    pub fn add_start_activity(&mut self, activity: Activity<C>) -> Result<(), HsmError> {
        self.add_enter_activity(INITIAL, activity)
    }

    /// Activity run when the machine reaches its final pseudostate.
    pub fn add_stop_activity(&mut self, activity: Activity<C>) -> Result<(), HsmError> {
        self.add_enter_activity(FINAL, activity)
    }

    /// Activity run after every completed transition, with the event that
    /// triggered it.
    pub fn add_on_transition_completed_activity(
        &mut self,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        self.ensure_mutable()?;
        self.on_transition_completed.push(activity);
        Ok(())
    }

    /// Validate the topology, freeze it, enter the initial pseudostate and
    /// follow unconditional transitions until the machine settles.
    ///
    /// Allowed only before the first start or after the machine reached its
    /// final pseudostate.
    pub fn start(&mut self) -> Result<DispatchOutcome, HsmError> {
        if self.current != INITIAL && self.current != FINAL {
            return Err(HsmError::precondition(format!(
                "start() called while in '{}'",
                self.states[self.current.index()].name()
            )));
        }
        if !self.frozen {
            self.validate()?;
            self.frozen = true;
        }

        tracing::info!(machine = %self.id, states = self.states.len(), "starting state machine");

        let resting = self.current;
        if self.states[resting.index()].is_active() {
            self.states[resting.index()].exit(&mut self.context)?;
        }
        self.current = INITIAL;
        self.states[INITIAL.index()].enter(&mut self.context)?;
        self.run_to_completion(&Unnamed)
    }

    /// Leave the current state for the final pseudostate, running the exit
    /// activities once and then the stop activities.
    ///
    /// A machine that is not running is left untouched.
    pub fn stop(&mut self) -> Result<DispatchOutcome, HsmError> {
        if !self.is_running() {
            return Ok(DispatchOutcome::UNTRIGGERED);
        }

        let lifecycle_acted = self.transfer(FINAL, &Exit)?;

        tracing::info!(machine = %self.id, "stopped state machine");

        Ok(DispatchOutcome::from_step(Step::transitioned(
            StateResult {
                transition: TransitionResult::to(FINAL),
                ..StateResult::UNTRIGGERED
            },
            lifecycle_acted,
        )))
    }

    /// Hand `event` to the current state, perform the transition it
    /// requests, then chain unconditional transitions.
    pub fn process_event(&mut self, event: &dyn Event) -> Result<DispatchOutcome, HsmError> {
        if !self.is_running() {
            return Err(HsmError::precondition(format!(
                "cannot process '{}' while the machine is not running",
                event.name()
            )));
        }
        self.run_to_completion(event)
    }

    /// Exit the current state, enter `target`, notify and record.
    fn transfer(&mut self, target: StateId, trigger: &dyn Event) -> Result<bool, HsmError> {
        let from = self.current;
        let exited = self.states[from.index()].exit(&mut self.context)?;
        self.current = target;
        let entered = self.states[target.index()].enter(&mut self.context)?;
        self.on_transition_completed.process(&mut self.context, trigger)?;

        record_transition(
            &mut self.history,
            self.id,
            (from, self.states[from.index()].name()),
            (target, self.states[target.index()].name()),
            trigger,
        );
        Ok(exited.acted() || entered.acted())
    }

    pub fn validate(&self) -> Result<(), HsmError> {
        crate::validation::validate(&self.topology(), &self.config)
    }

    fn topology(&self) -> TopologyGraph {
        let nodes = self
            .states
            .iter()
            .enumerate()
            .map(|(index, state)| GraphNode::from_state(state, Self::kind_at(index), None, None))
            .collect();
        TopologyGraph {
            nodes,
            regions: vec![GraphRegion {
                owner: "Fsm".to_string(),
                initial: INITIAL,
                final_state: FINAL,
                children: self.state_ids().collect(),
            }],
        }
    }

    fn kind_at(index: usize) -> StateKind {
        match index {
            0 => StateKind::Initial,
            1 => StateKind::Final,
            _ => StateKind::Simple,
        }
    }

    fn ensure_mutable(&self) -> Result<(), HsmError> {
        if self.frozen {
            Err(HsmError::topology(TopologyViolation::Frozen))
        } else {
            Ok(())
        }
    }

    fn is_user_state(&self, id: StateId) -> bool {
        (FIRST_STATE..self.states.len()).contains(&id.index())
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State<C>, HsmError> {
        self.states
            .get_mut(id.index())
            .ok_or_else(|| HsmError::topology(TopologyViolation::UnknownState(id)))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn initial(&self) -> StateId {
        INITIAL
    }

    pub fn final_state(&self) -> StateId {
        FINAL
    }

    /// Started and not yet settled in a pseudostate.
    pub fn is_running(&self) -> bool {
        self.current != INITIAL && self.current != FINAL
    }

    pub fn is_active(&self, id: StateId) -> bool {
        self.state(id).is_some_and(State::is_active)
    }

    pub fn state(&self, id: StateId) -> Option<&State<C>> {
        self.states.get(id.index())
    }

    pub fn name(&self, id: StateId) -> Option<&str> {
        self.state(id).map(State::name)
    }

    /// Ids of the user states, in insertion order.
    pub fn state_ids(&self) -> impl Iterator<Item = StateId> {
        (FIRST_STATE..self.states.len()).map(StateId::new)
    }

    pub fn has_transition_for(&self, id: StateId, event_type: EventType) -> bool {
        self.state(id)
            .is_some_and(|state| state.has_transition_for(event_type))
    }

    pub fn has_activities_for(&self, id: StateId, event_type: EventType) -> bool {
        self.state(id)
            .is_some_and(|state| state.has_activities_for(event_type))
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Listing of every state and its handlers.
    pub fn describe(&self) -> String {
        let mut out = format!("Fsm {}", self.id);
        for state in &self.states {
            out.push('\n');
            out.push_str(&state.info(1));
        }
        out
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        let current = self.states[self.current.index()].name().to_string();
        MachineSnapshot::capture(
            self.id,
            self.is_running(),
            self.current,
            vec![current],
            self.active_states(),
            self.history.clone(),
        )
    }

    fn active_states(&self) -> Vec<StateId> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_active())
            .map(|(index, _)| StateId::new(index))
            .collect()
    }
}

impl<C> Stepper for Fsm<C> {
    fn step(&mut self, event: &dyn Event) -> Result<Step, HsmError> {
        let result = self.states[self.current.index()].process_event(&mut self.context, event)?;
        match result.transition.target() {
            Some(target) => {
                let lifecycle_acted = self.transfer(target, event)?;
                Ok(Step::transitioned(result, lifecycle_acted))
            }
            None => Ok(Step::settled(result)),
        }
    }

    fn config(&self) -> &MachineConfig {
        &self.config
    }
}

impl<C> std::fmt::Debug for Fsm<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fsm")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("states", &self.states.len())
            .field("frozen", &self.frozen)
            .finish()
    }
}
