//! Property-based tests for dispatch policies and transition ordering.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated handler lists and state trees.

use hierarch::core::{compatible, ActivityKind, HandlerList, HandlerResult, TransitionKind};
use hierarch::{
    impl_event, Action, Activity, Event, Fsm, Guard, Hsm, MachineConfig, StateId, Transition,
};
use proptest::prelude::*;
use proptest::sample::Index;

#[derive(Debug)]
struct Jump(usize);
#[derive(Debug)]
struct Flip;
#[derive(Debug)]
struct Input;
#[derive(Debug)]
struct Key;
#[derive(Debug)]
struct Click;

impl_event!(Jump, Flip, Input);
impl_event!(Key: Input);
impl_event!(Click: Input);

fn some_target() -> StateId {
    Fsm::new(()).final_state()
}

fn fixed<C: 'static>(result: bool) -> Guard<C> {
    Guard::new(move |_: &C, _: &dyn Event| result)
}

fn logging(index: usize) -> Action<Vec<usize>> {
    Action::new(move |log: &mut Vec<usize>, _| log.push(index))
}

/// Random forest under `Top`: entry `i` picks the parent of node `i` among
/// `Top` (0) and the nodes before it (`k` = node `k - 1`).
fn arbitrary_parents() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<Index>(), 1..12).prop_map(|picks| {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| pick.index(i + 1))
            .collect()
    })
}

type Log = Vec<(bool, usize)>;

/// Build the tree, logging `(true, k)` on entering node `k` and `(false, k)`
/// on exiting it. `Top` handles `Jump(k)` by moving to leaf `k`.
fn build_tree(parents: &[usize]) -> (Hsm<Log>, Vec<StateId>, Vec<usize>) {
    let mut hsm = Hsm::new(Log::new());
    let top = hsm.root();
    let mut ids = Vec::with_capacity(parents.len());
    let mut leaves = Vec::new();

    for (k, &parent) in parents.iter().enumerate() {
        let parent_id = if parent == 0 { top } else { ids[parent - 1] };
        let composite = parents.contains(&(k + 1));
        let id = if composite {
            hsm.add_composite(format!("S{k}"), parent_id).unwrap()
        } else {
            leaves.push(k);
            hsm.add_state(format!("S{k}"), parent_id).unwrap()
        };
        let enter_log = Action::new(move |log: &mut Log, _| log.push((true, k)));
        hsm.add_enter_activity(id, Activity::new(enter_log)).unwrap();
        let exit_log = Action::new(move |log: &mut Log, _| log.push((false, k)));
        hsm.add_exit_activity(id, Activity::new(exit_log)).unwrap();
        ids.push(id);
    }

    for &leaf in &leaves {
        let guard = Guard::new(move |_: &Log, event: &dyn Event| {
            event.downcast_ref::<Jump>().is_some_and(|jump| jump.0 == leaf)
        });
        hsm.add_transition::<Jump>(top, Transition::with_guard(guard, ids[leaf]))
            .unwrap();
    }

    (hsm, ids, leaves)
}

/// Node `k` and its ancestors below `Top`, innermost first.
fn chain(parents: &[usize], k: usize) -> Vec<usize> {
    let mut out = vec![k];
    let mut parent = parents[k];
    while parent != 0 {
        out.push(parent - 1);
        parent = parents[parent - 1];
    }
    out
}

proptest! {
    #[test]
    fn transition_list_fires_first_true_guard_only(
        guards in prop::collection::vec(any::<bool>(), 0..8),
    ) {
        let target = some_target();
        let mut list: HandlerList<Vec<usize>, TransitionKind> = HandlerList::new();
        for (i, &g) in guards.iter().enumerate() {
            list.push(Transition::with_guard_and_effect(fixed(g), target, logging(i)));
        }

        let mut log = Vec::new();
        let result = list.process(&mut log, &Flip).unwrap();

        let expected: Vec<usize> = guards.iter().position(|&g| g).into_iter().collect();
        prop_assert_eq!(&log, &expected);
        prop_assert_eq!(result.triggered(), !expected.is_empty());
    }

    #[test]
    fn activity_list_runs_every_true_guard(guards in prop::collection::vec(any::<bool>(), 0..8)) {
        let mut list: HandlerList<Vec<usize>, ActivityKind> = HandlerList::new();
        for (i, &g) in guards.iter().enumerate() {
            list.push(Activity::with_guard(fixed(g), logging(i)));
        }

        let mut log = Vec::new();
        let result = list.process(&mut log, &Flip).unwrap();

        let expected: Vec<usize> = (0..guards.len()).filter(|&i| guards[i]).collect();
        prop_assert_eq!(&log, &expected);
        prop_assert_eq!(result.triggered(), !expected.is_empty());
    }

    #[test]
    fn guard_is_deterministic(threshold in any::<i32>(), value in any::<i32>()) {
        let guard = Guard::new(move |v: &i32, _: &dyn Event| *v >= threshold);
        prop_assert_eq!(guard.check(&value, &Flip), guard.check(&value, &Flip));
    }

    #[test]
    fn exits_precede_enters_in_tree_order(
        parents in arbitrary_parents(),
        from in any::<Index>(),
        to in any::<Index>(),
    ) {
        let (mut hsm, ids, leaves) = build_tree(&parents);
        let source = leaves[from.index(leaves.len())];
        let target = leaves[to.index(leaves.len())];

        hsm.start().unwrap();
        hsm.dispatch(&Jump(source)).unwrap();
        prop_assert_eq!(hsm.current(), ids[source]);
        hsm.context_mut().clear();

        let outcome = hsm.dispatch(&Jump(target)).unwrap();
        prop_assert_eq!(hsm.current(), ids[target]);
        prop_assert_eq!(outcome.transitions_taken(), 1);

        let source_chain = chain(&parents, source);
        let target_chain = chain(&parents, target);
        let (exits, mut enters): (Vec<usize>, Vec<usize>) = if source == target {
            (vec![source], vec![target])
        } else {
            (
                source_chain.iter().copied().filter(|k| !target_chain.contains(k)).collect(),
                target_chain.iter().copied().filter(|k| !source_chain.contains(k)).collect(),
            )
        };
        enters.reverse();

        let expected: Log = exits
            .iter()
            .map(|&k| (false, k))
            .chain(enters.iter().map(|&k| (true, k)))
            .collect();
        prop_assert_eq!(hsm.context(), &expected);

        for &k in &target_chain {
            prop_assert!(hsm.is_active(ids[k]));
        }
        for &k in source_chain.iter().filter(|k| !target_chain.contains(k)) {
            prop_assert!(!hsm.is_active(ids[k]));
        }
    }

    #[test]
    fn history_is_bounded(capacity in 0usize..6, flips in 0usize..12) {
        let config = MachineConfig::default().with_history_capacity(capacity);
        let mut fsm = Fsm::with_config((), config);
        let a = fsm.add_state("A").unwrap();
        let b = fsm.add_state("B").unwrap();
        fsm.add_transition::<Flip>(a, Transition::new(b)).unwrap();
        fsm.add_transition::<Flip>(b, Transition::new(a)).unwrap();

        fsm.start().unwrap();
        for _ in 0..flips {
            fsm.process_event(&Flip).unwrap();
        }

        prop_assert_eq!(fsm.history().len(), (flips + 1).min(capacity));
        if capacity > 0 {
            let expected = if flips % 2 == 0 { "A" } else { "B" };
            prop_assert_eq!(fsm.history().last().map(|r| r.to_name.as_str()), Some(expected));
        }
    }

    #[test]
    fn compatibility_is_symmetric(a in 0u8..3, b in 0u8..3) {
        fn pick(i: u8) -> &'static dyn Event {
            match i {
                0 => &Input,
                1 => &Key,
                _ => &Click,
            }
        }
        prop_assert_eq!(
            compatible(Some(pick(a)), Some(pick(b))),
            compatible(Some(pick(b)), Some(pick(a)))
        );
    }
}
