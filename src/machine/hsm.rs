//! Hierarchical state machine.
//!
//! States live in an arena rooted at a composite named `Top`. Events go to
//! the current (innermost) state and bubble to enclosing composites while
//! unhandled. Transitions exit every state that is not shared with the
//! target's path, deepest first, then enter the target's path outermost
//! first. Entering a composite continues into its initial pseudostate.

use super::run::{DispatchOutcome, Step, Stepper};
use super::tree::{StateTree, TransitionPaths};
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

/// A hierarchical state machine owning its states and a user context `C`.
///
/// # Example
///
/// ```rust
/// use hierarch::{impl_event, Action, Activity, Hsm, Transition};
///
/// #[derive(Debug)]
/// struct Next;
/// impl_event!(Next);
///
/// let mut hsm = Hsm::new(Vec::<String>::new());
/// let top = hsm.root();
/// let p = hsm.add_composite("P", top).unwrap();
/// let a = hsm.add_state("A", p).unwrap();
/// let q = hsm.add_composite("Q", top).unwrap();
/// let b = hsm.add_state("B", q).unwrap();
///
/// for (id, name) in [(a, "A"), (p, "P")] {
///     hsm.add_exit_activity(id, Activity::new(Action::new(move |log: &mut Vec<String>, _| {
///         log.push(format!("exit {name}"))
///     })))
///     .unwrap();
/// }
/// for (id, name) in [(q, "Q"), (b, "B")] {
///     hsm.add_enter_activity(id, Activity::new(Action::new(move |log: &mut Vec<String>, _| {
///         log.push(format!("enter {name}"))
///     })))
///     .unwrap();
/// }
/// hsm.add_transition::<Next>(a, Transition::new(b)).unwrap();
///
/// hsm.start().unwrap();
/// assert_eq!(hsm.current(), a);
///
/// hsm.dispatch(&Next).unwrap();
/// assert_eq!(hsm.current(), b);
/// assert_eq!(hsm.context(), &["exit A", "exit P", "enter Q", "enter B"]);
/// ```
pub struct Hsm<C> {
    id: Uuid,
    tree: StateTree<C>,
    root: StateId,
    current: StateId,
    on_transition_completed: HandlerList<C, ActivityKind>,
    context: C,
    config: MachineConfig,
    history: StateHistory,
    frozen: bool,
}

impl<C> Hsm<C> {
    pub fn new(context: C) -> Self {
        Self::with_config(context, MachineConfig::default())
    }

    pub fn with_config(context: C, config: MachineConfig) -> Self {
        let mut tree = StateTree::new();
        let root = tree.add_composite("Top", None);
        let current = tree.region(root).map_or(root, |region| region.initial);
        Self {
            id: Uuid::new_v4(),
            tree,
            root,
            current,
            on_transition_completed: HandlerList::new(),
            history: StateHistory::with_capacity(config.history_capacity),
            context,
            config,
            frozen: false,
        }
    }

    /// Add a simple state under the composite `parent`.
    pub fn add_state(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        parent: StateId,
    ) -> Result<StateId, HsmError> {
        self.ensure_mutable()?;
        self.require_composite(parent)?;
        Ok(self.tree.add_simple(name, parent))
    }

    /// Add a composite state under the composite `parent`. Its initial
    /// pseudostate targets its own final pseudostate until a child is added.
    pub fn add_composite(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        parent: StateId,
    ) -> Result<StateId, HsmError> {
        self.ensure_mutable()?;
        self.require_composite(parent)?;
        Ok(self.tree.add_composite(name, Some(parent)))
    }

    /// Rebind `composite`'s initial pseudostate to `state`, which must be a
    /// child of `composite` or its final pseudostate.
    pub fn set_initial_state(
        &mut self,
        composite: StateId,
        state: StateId,
    ) -> Result<(), HsmError> {
        self.ensure_mutable()?;
        let region = self.require_composite(composite)?;
        if !region.children.contains(&state) && region.final_state != state {
            return Err(HsmError::topology(TopologyViolation::InitialOutsideRegion {
                composite: self.tree.node(composite).state.name().to_string(),
                target: self.describe_id(state),
            }));
        }
        self.tree.bind_initial(composite, state);
        if let Some(region) = self.tree.region_mut(composite) {
            region.explicit_initial = true;
        }
        Ok(())
    }

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
        match self.tree.get(target).map(|node| node.kind) {
            None => Err(HsmError::topology(TopologyViolation::UnknownTarget {
                from: from_name,
                target,
            })),
            Some(StateKind::Initial) => Err(HsmError::topology(
                TopologyViolation::TargetsInitialPseudostate {
                    from: from_name,
                    target: self.describe_id(target),
                },
            )),
            Some(_) => {
                self.tree
                    .node_mut(from)
                    .state
                    .add_transition(event_type, transition);
                Ok(())
            }
        }
    }

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
        self.add_composite_start_activity(self.root, activity)
    }

    /// Activity run when the machine reaches its final pseudostate.
    pub fn add_stop_activity(&mut self, activity: Activity<C>) -> Result<(), HsmError> {
        self.add_composite_stop_activity(self.root, activity)
    }

    /// Activity run each time `composite` is entered and descends into its
    /// initial pseudostate.
    pub fn add_composite_start_activity(
        &mut self,
        composite: StateId,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        let initial = self.require_composite(composite)?.initial;
        self.add_enter_activity(initial, activity)
    }

    /// Activity run each time `composite` reaches its final pseudostate.
    pub fn add_composite_stop_activity(
        &mut self,
        composite: StateId,
        activity: Activity<C>,
    ) -> Result<(), HsmError> {
        let final_state = self.require_composite(composite)?.final_state;
        self.add_enter_activity(final_state, activity)
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

    /// Validate and freeze the topology, enter the root and its initial
    /// pseudostate, then follow unconditional transitions until settled.
    pub fn start(&mut self) -> Result<DispatchOutcome, HsmError> {
        let (initial, final_state) = (self.initial(), self.final_state());
        if self.current != initial && self.current != final_state {
            return Err(HsmError::precondition(format!(
                "start() called while in '{}'",
                self.tree.node(self.current).state.name()
            )));
        }
        if !self.frozen {
            self.validate()?;
            self.frozen = true;
        }

        tracing::info!(
            machine = %self.id,
            states = self.tree.len(),
            "starting hierarchical state machine"
        );

        let resting = self.current;
        if self.tree.node(resting).state.is_active() {
            self.tree.node_mut(resting).state.exit(&mut self.context)?;
        }
        if !self.tree.node(self.root).state.is_active() {
            self.tree.node_mut(self.root).state.enter(&mut self.context)?;
        }
        self.enter_node(initial)?;
        self.current = initial;
        self.run_to_completion(&Unnamed)
    }

    /// Exit the whole active path and enter the root final pseudostate.
    ///
    /// Exit activities run once, innermost first, followed by the stop
    /// activities. A machine that is not running is left untouched.
    pub fn stop(&mut self) -> Result<DispatchOutcome, HsmError> {
        if !self.is_running() {
            return Ok(DispatchOutcome::UNTRIGGERED);
        }

        let final_state = self.final_state();
        let lifecycle_acted = self.transfer(final_state, &Exit)?;

        tracing::info!(machine = %self.id, "stopped hierarchical state machine");

        Ok(DispatchOutcome::from_step(Step::transitioned(
            StateResult {
                transition: TransitionResult::to(final_state),
                ..StateResult::UNTRIGGERED
            },
            lifecycle_acted,
        )))
    }

    /// Deliver `event` to the current state, bubbling it to enclosing
    /// composites while unhandled, then chain unconditional transitions.
    pub fn dispatch(&mut self, event: &dyn Event) -> Result<DispatchOutcome, HsmError> {
        if !self.is_running() {
            return Err(HsmError::precondition(format!(
                "cannot dispatch '{}' while the machine is not running",
                event.name()
            )));
        }
        self.run_to_completion(event)
    }

    /// Offer `event` to the current state and its ancestors, innermost first,
    /// until one of them acts or requests a transition.
    fn bubble(&mut self, event: &dyn Event) -> Result<StateResult, HsmError> {
        let mut id = self.current;
        loop {
            let node = self.tree.node_mut(id);
            let result = node.state.process_event(&mut self.context, event)?;
            if result.acted_or_requested_transition() {
                return Ok(result);
            }
            match node.parent {
                Some(parent) => {
                    tracing::trace!(
                        from = node.state.name(),
                        event = event.name(),
                        "event unhandled, bubbling to parent"
                    );
                    id = parent;
                }
                None => return Ok(result),
            }
        }
    }

    /// Perform the transition from the current state to `target`.
    fn transfer(&mut self, target: StateId, trigger: &dyn Event) -> Result<bool, HsmError> {
        let source = self.current;
        let TransitionPaths { exit, enter } = self.tree.transition_paths(source, target);
        let mut lifecycle_acted = false;

        for &id in &exit {
            let node = self.tree.node_mut(id);
            lifecycle_acted |= node.state.exit(&mut self.context)?.acted();
            if let Some(region) = node.region.as_mut() {
                region.current = None;
            }
        }

        for &id in &enter {
            lifecycle_acted |= self.enter_node(id)?;
        }

        let mut settled = target;
        if let Some(initial) = self.tree.region(target).map(|region| region.initial) {
            lifecycle_acted |= self.enter_node(initial)?;
            settled = initial;
        }
        self.current = settled;

        self.on_transition_completed.process(&mut self.context, trigger)?;

        tracing::trace!(exited = exit.len(), entered = enter.len(), "paths traversed");
        record_transition(
            &mut self.history,
            self.id,
            (source, self.tree.node(source).state.name()),
            (settled, self.tree.node(settled).state.name()),
            trigger,
        );
        Ok(lifecycle_acted)
    }

    /// Enter one node and make it the current child of its parent's region.
    fn enter_node(&mut self, id: StateId) -> Result<bool, HsmError> {
        let acted = self.tree.node_mut(id).state.enter(&mut self.context)?.acted();
        if let Some(parent) = self.tree.node(id).parent {
            if let Some(region) = self.tree.region_mut(parent) {
                region.current = Some(id);
            }
        }
        Ok(acted)
    }

    pub fn validate(&self) -> Result<(), HsmError> {
        crate::validation::validate(&self.topology(), &self.config)
    }

    fn topology(&self) -> TopologyGraph {
        let mut graph = TopologyGraph::default();
        for (id, node) in self.tree.iter() {
            let entry = node.region.as_ref().map(|region| region.initial);
            graph
                .nodes
                .push(GraphNode::from_state(&node.state, node.kind, node.parent, entry));
            if let Some(region) = &node.region {
                graph.regions.push(GraphRegion {
                    owner: self.tree.node(id).state.name().to_string(),
                    initial: region.initial,
                    final_state: region.final_state,
                    children: region.children.clone(),
                });
            }
        }
        graph
    }

    fn ensure_mutable(&self) -> Result<(), HsmError> {
        if self.frozen {
            Err(HsmError::topology(TopologyViolation::Frozen))
        } else {
            Ok(())
        }
    }

    fn require_composite(&self, id: StateId) -> Result<&super::tree::Region, HsmError> {
        let node = self
            .tree
            .get(id)
            .ok_or_else(|| HsmError::topology(TopologyViolation::UnknownState(id)))?;
        node.region.as_ref().ok_or_else(|| {
            HsmError::topology(TopologyViolation::NotComposite(
                node.state.name().to_string(),
            ))
        })
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State<C>, HsmError> {
        self.tree
            .get_mut(id)
            .map(|node| &mut node.state)
            .ok_or_else(|| HsmError::topology(TopologyViolation::UnknownState(id)))
    }

    fn describe_id(&self, id: StateId) -> String {
        self.name(id).map_or_else(|| id.to_string(), str::to_string)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The top-level composite every other state descends from.
    pub fn root(&self) -> StateId {
        self.root
    }

    /// The innermost current state.
    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn initial(&self) -> StateId {
        self.tree
            .region(self.root)
            .map_or(self.root, |region| region.initial)
    }

    pub fn final_state(&self) -> StateId {
        self.tree
            .region(self.root)
            .map_or(self.root, |region| region.final_state)
    }

    /// Initial pseudostate of `composite`.
    pub fn initial_of(&self, composite: StateId) -> Option<StateId> {
        self.tree.region(composite).map(|region| region.initial)
    }

    /// Final pseudostate of `composite`.
    pub fn final_of(&self, composite: StateId) -> Option<StateId> {
        self.tree.region(composite).map(|region| region.final_state)
    }

    pub fn is_running(&self) -> bool {
        self.tree.node(self.root).state.is_active()
            && self.current != self.initial()
            && self.current != self.final_state()
    }

    pub fn is_active(&self, id: StateId) -> bool {
        self.state(id).is_some_and(State::is_active)
    }

    /// `id` is the current state or one of its ancestors.
    pub fn is_in(&self, id: StateId) -> bool {
        self.tree.is_within(self.current, id)
    }

    /// `composite` has reached its final pseudostate.
    pub fn is_completed(&self, composite: StateId) -> bool {
        self.tree.region(composite).is_some_and(|region| {
            region.current == Some(region.final_state)
        })
    }

    pub fn state(&self, id: StateId) -> Option<&State<C>> {
        self.tree.get(id).map(|node| &node.state)
    }

    pub fn name(&self, id: StateId) -> Option<&str> {
        self.state(id).map(State::name)
    }

    pub fn kind(&self, id: StateId) -> Option<StateKind> {
        self.tree.get(id).map(|node| node.kind)
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.tree.get(id).and_then(|node| node.parent)
    }

    /// Children of `composite` in insertion order, pseudostates excluded.
    pub fn children(&self, composite: StateId) -> &[StateId] {
        self.tree
            .region(composite)
            .map(|region| region.children.as_slice())
            .unwrap_or(&[])
    }

    /// Child of `composite` that is currently active, if any.
    pub fn active_child(&self, composite: StateId) -> Option<StateId> {
        self.tree.region(composite).and_then(|region| region.current)
    }

    /// Path from the root to `id`, both included.
    pub fn ancestors(&self, id: StateId) -> Vec<StateId> {
        if self.tree.contains(id) {
            self.tree.ancestors(id)
        } else {
            Vec::new()
        }
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

    /// Indented listing of the hierarchy and every handler.
    pub fn describe(&self) -> String {
        let mut out = format!("Hsm {}", self.id);
        self.describe_into(self.root, 1, &mut out);
        out
    }

    fn describe_into(&self, id: StateId, level: usize, out: &mut String) {
        let node = self.tree.node(id);
        out.push('\n');
        out.push_str(&node.state.info(level));
        if let Some(region) = &node.region {
            for child in [region.initial, region.final_state]
                .into_iter()
                .chain(region.children.iter().copied())
            {
                self.describe_into(child, level + 1, out);
            }
        }
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        let path = self
            .tree
            .ancestors(self.current)
            .into_iter()
            .map(|id| self.tree.node(id).state.name().to_string())
            .collect();
        let active = self
            .tree
            .iter()
            .filter(|(_, node)| node.state.is_active())
            .map(|(id, _)| id)
            .collect();
        MachineSnapshot::capture(
            self.id,
            self.is_running(),
            self.current,
            path,
            active,
            self.history.clone(),
        )
    }
}

impl<C> Stepper for Hsm<C> {
    fn step(&mut self, event: &dyn Event) -> Result<Step, HsmError> {
        let result = self.bubble(event)?;
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

impl<C> std::fmt::Debug for Hsm<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hsm")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("states", &self.tree.len())
            .field("frozen", &self.frozen)
            .finish()
    }
}
