//! Arena of hierarchical states.
//!
//! Nodes reference their parent by [`StateId`]; composites own a region
//! listing their children and their two pseudostates. Paths are computed on
//! demand from the parent links, so nothing here holds a back-pointer.

use crate::core::{EventType, State, StateId, Transition, Unnamed};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

/// Role of a node in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Simple,
    Composite,
    Initial,
    Final,
}

impl StateKind {
    pub fn is_pseudostate(self) -> bool {
        matches!(self, StateKind::Initial | StateKind::Final)
    }
}

/// Children and pseudostates of a composite.
#[derive(Debug)]
pub(crate) struct Region {
    pub initial: StateId,
    pub final_state: StateId,
    pub children: Vec<StateId>,
    /// Child entered most recently; cleared when the composite exits.
    pub current: Option<StateId>,
    pub explicit_initial: bool,
}

pub(crate) struct Node<C> {
    pub state: State<C>,
    pub parent: Option<StateId>,
    pub kind: StateKind,
    pub region: Option<Region>,
}

/// States exited (deepest first) and entered (outermost first) by a
/// transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TransitionPaths {
    pub exit: Vec<StateId>,
    pub enter: Vec<StateId>,
}

pub(crate) struct StateTree<C> {
    nodes: Vec<Node<C>>,
}

impl<C> StateTree<C> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn get(&self, id: StateId) -> Option<&Node<C>> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: StateId) -> Option<&mut Node<C>> {
        self.nodes.get_mut(id.index())
    }

    /// Node lookup for ids this tree handed out itself.
    pub fn node(&self, id: StateId) -> &Node<C> {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: StateId) -> &mut Node<C> {
        &mut self.nodes[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &Node<C>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (StateId::new(index), node))
    }

    pub fn region(&self, id: StateId) -> Option<&Region> {
        self.get(id).and_then(|node| node.region.as_ref())
    }

    pub fn region_mut(&mut self, id: StateId) -> Option<&mut Region> {
        self.get_mut(id).and_then(|node| node.region.as_mut())
    }

    /// Append a simple state under `parent`. `parent` must be a composite.
    pub fn add_simple(&mut self, name: impl Into<Cow<'static, str>>, parent: StateId) -> StateId {
        let id = self.push(State::new(name), Some(parent), StateKind::Simple);
        self.adopt(parent, id);
        id
    }

    /// Append a composite together with its initial and final pseudostates.
    /// The initial pseudostate targets the final one until a child is added.
    pub fn add_composite(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        parent: Option<StateId>,
    ) -> StateId {
        let id = self.push(State::new(name), parent, StateKind::Composite);
        let initial = self.push(State::new("Initial"), Some(id), StateKind::Initial);
        let final_state = self.push(State::new("Final"), Some(id), StateKind::Final);
        self.node_mut(id).region = Some(Region {
            initial,
            final_state,
            children: Vec::new(),
            current: None,
            explicit_initial: false,
        });
        self.bind_initial(id, final_state);
        if let Some(parent) = parent {
            self.adopt(parent, id);
        }
        id
    }

    /// Point a composite's initial pseudostate at `target`.
    pub fn bind_initial(&mut self, composite: StateId, target: StateId) {
        let Some(initial) = self.region(composite).map(|region| region.initial) else {
            return;
        };
        let state = &mut self.node_mut(initial).state;
        state.clear_transitions(EventType::of::<Unnamed>());
        state.add_unnamed_transition(Transition::new(target));
    }

    fn push(&mut self, state: State<C>, parent: Option<StateId>, kind: StateKind) -> StateId {
        let id = StateId::new(self.nodes.len());
        self.nodes.push(Node {
            state,
            parent,
            kind,
            region: None,
        });
        id
    }

    /// Register `child` in the parent's region; the first child becomes the
    /// default initial target.
    fn adopt(&mut self, parent: StateId, child: StateId) {
        let Some(region) = self.region_mut(parent) else {
            return;
        };
        region.children.push(child);
        let rebind = !region.explicit_initial && region.children.len() == 1;
        if rebind {
            self.bind_initial(parent, child);
        }
    }

    /// Path from the root down to `id`, both included.
    pub fn ancestors(&self, id: StateId) -> Vec<StateId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.get(current).and_then(|node| node.parent);
        }
        path.reverse();
        path
    }

    /// `ancestor` lies on the path from the root to `id` (inclusive).
    pub fn is_within(&self, id: StateId, ancestor: StateId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|node| node.parent);
        }
        false
    }

    /// Exit and enter paths for a transition from `source` to `target`.
    ///
    /// States shared by both root paths are left untouched. A target on the
    /// source's own path is the exception: it is exited and re-entered.
    pub fn transition_paths(&self, source: StateId, target: StateId) -> TransitionPaths {
        let source_path = self.ancestors(source);
        let target_path = self.ancestors(target);

        let source_set: HashSet<StateId> = source_path.iter().copied().collect();
        let mut common: HashSet<StateId> = target_path
            .iter()
            .copied()
            .filter(|id| source_set.contains(id))
            .collect();
        common.remove(&target);

        TransitionPaths {
            exit: source_path
                .iter()
                .rev()
                .copied()
                .filter(|id| !common.contains(id))
                .collect(),
            enter: target_path
                .iter()
                .copied()
                .filter(|id| !common.contains(id))
                .collect(),
        }
    }
}
