//! Read-only view of a machine's topology.
//!
//! Both machine kinds flatten themselves into a [`TopologyGraph`] before
//! validation, so the rules never touch handlers or contexts.

use crate::core::{EventType, State, StateId, Unnamed};
use crate::machine::StateKind;

/// How a state answers an `Unnamed` probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// Nothing registered; the probe bubbles to the parent.
    Bubbles,
    /// Only activities are registered; the probe stops here.
    Absorbed,
    /// First `Unnamed` transition in registration order.
    Transition { target: StateId, unguarded: bool },
}

#[derive(Clone, Debug)]
pub(crate) struct GraphNode {
    pub name: String,
    pub kind: StateKind,
    pub parent: Option<StateId>,
    /// Where entering this state lands; composites land on their initial
    /// pseudostate.
    pub entry: Option<StateId>,
    /// Targets of every registered transition.
    pub targets: Vec<StateId>,
    /// `(target, unguarded)` of each `Unnamed` transition, in order.
    pub unnamed: Vec<(StateId, bool)>,
    pub probe: Probe,
}

impl GraphNode {
    pub fn from_state<C>(
        state: &State<C>,
        kind: StateKind,
        parent: Option<StateId>,
        entry: Option<StateId>,
    ) -> Self {
        let unnamed_type = EventType::of::<Unnamed>();
        let targets = state
            .transitions()
            .iter()
            .flat_map(|(_, list)| list.iter().map(|t| t.target()))
            .collect();
        let unnamed: Vec<(StateId, bool)> = state
            .transitions()
            .get(unnamed_type)
            .map(|list| list.iter().map(|t| (t.target(), t.is_unguarded())).collect())
            .unwrap_or_default();

        let probe = match unnamed.first() {
            Some(&(target, unguarded)) => Probe::Transition { target, unguarded },
            None if state.has_activities_for(unnamed_type) => Probe::Absorbed,
            None => Probe::Bubbles,
        };

        Self {
            name: state.name().to_string(),
            kind,
            parent,
            entry,
            targets,
            unnamed,
            probe,
        }
    }
}

/// A set of sibling states sharing one initial and one final pseudostate.
#[derive(Clone, Debug)]
pub(crate) struct GraphRegion {
    pub owner: String,
    pub initial: StateId,
    pub final_state: StateId,
    pub children: Vec<StateId>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TopologyGraph {
    pub nodes: Vec<GraphNode>,
    pub regions: Vec<GraphRegion>,
}

impl TopologyGraph {
    pub fn node(&self, id: StateId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    pub fn name(&self, id: StateId) -> String {
        self.node(id)
            .map_or_else(|| id.to_string(), |node| node.name.clone())
    }

    /// State the machine moves to when an `Unnamed` probe is dispatched
    /// while `id` is current, if that move is certain.
    pub fn forced_successor(&self, id: StateId) -> Option<StateId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            match node.probe {
                Probe::Bubbles => cursor = node.parent,
                Probe::Absorbed => return None,
                Probe::Transition { unguarded: false, .. } => return None,
                Probe::Transition {
                    target,
                    unguarded: true,
                } => {
                    let landed = self.node(target)?;
                    return Some(landed.entry.unwrap_or(target));
                }
            }
        }
        None
    }
}
