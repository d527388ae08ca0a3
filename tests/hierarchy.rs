//! Integration tests for hierarchical machines: bubbling, exit/enter
//! ordering, composites and their pseudostates.

use hierarch::{
    impl_event, Action, Activity, Event, Guard, Hsm, HsmError, MachineConfig, StateId, StateKind,
    TopologyViolation, Transition,
};

#[derive(Debug)]
struct Next;
#[derive(Debug)]
struct Cross;
#[derive(Debug)]
struct Reset;
#[derive(Debug)]
struct Finish;
#[derive(Debug)]
struct Nothing;

impl_event!(Next, Cross, Reset, Finish, Nothing);

type Journal = Vec<String>;

fn note(text: String) -> Activity<Journal> {
    Activity::new(Action::new(move |journal: &mut Journal, _| journal.push(text.clone())))
}

fn trace_lifecycle(hsm: &mut Hsm<Journal>, id: StateId) {
    let name = hsm.name(id).unwrap_or("?").to_string();
    hsm.add_enter_activity(id, note(format!("enter {name}"))).unwrap();
    hsm.add_exit_activity(id, note(format!("exit {name}"))).unwrap();
}

struct Machine {
    hsm: Hsm<Journal>,
    p1: StateId,
    a: StateId,
    b: StateId,
    p2: StateId,
    c: StateId,
}

// Top
// ├── P1
// │   ├── A
// │   └── B
// └── P2
//     └── C
fn machine() -> Machine {
    let mut hsm = Hsm::new(Journal::new());
    let top = hsm.root();
    let p1 = hsm.add_composite("P1", top).unwrap();
    let a = hsm.add_state("A", p1).unwrap();
    let b = hsm.add_state("B", p1).unwrap();
    let p2 = hsm.add_composite("P2", top).unwrap();
    let c = hsm.add_state("C", p2).unwrap();
    for id in [p1, a, b, p2, c] {
        trace_lifecycle(&mut hsm, id);
    }
    hsm.add_transition::<Next>(a, Transition::new(b)).unwrap();
    hsm.add_transition::<Cross>(a, Transition::new(c)).unwrap();
    Machine {
        hsm,
        p1,
        a,
        b,
        p2,
        c,
    }
}

fn started() -> Machine {
    let mut m = machine();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();
    m
}

#[test]
fn start_descends_to_first_leaf() {
    let mut m = machine();
    m.hsm.add_start_activity(note("start".to_string())).unwrap();

    m.hsm.start().unwrap();

    assert_eq!(m.hsm.current(), m.a);
    assert!(m.hsm.is_running());
    assert!(m.hsm.is_active(m.hsm.root()));
    assert!(m.hsm.is_active(m.p1));
    assert_eq!(m.hsm.context(), &["start", "enter P1", "enter A"]);
    assert_eq!(m.hsm.active_child(m.hsm.root()), Some(m.p1));
    assert_eq!(m.hsm.active_child(m.p1), Some(m.a));
}

#[test]
fn sibling_transition_keeps_parent_active() {
    let mut m = started();

    m.hsm.dispatch(&Next).unwrap();

    assert_eq!(m.hsm.current(), m.b);
    assert_eq!(m.hsm.context(), &["exit A", "enter B"]);
    assert!(m.hsm.is_active(m.p1));
}

#[test]
fn cross_composite_transition_orders_exits_before_enters() {
    let mut m = started();

    m.hsm.dispatch(&Cross).unwrap();

    assert_eq!(m.hsm.current(), m.c);
    assert_eq!(m.hsm.context(), &["exit A", "exit P1", "enter P2", "enter C"]);
    assert!(!m.hsm.is_active(m.p1));
    assert_eq!(m.hsm.active_child(m.p1), None);
    assert_eq!(m.hsm.active_child(m.hsm.root()), Some(m.p2));
}

#[test]
fn unhandled_events_bubble_to_ancestors() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(m.p1, Transition::new(m.c))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    let outcome = m.hsm.dispatch(&Reset).unwrap();

    assert_eq!(outcome.transition().target(), Some(m.c));
    assert_eq!(m.hsm.current(), m.c);
    assert_eq!(m.hsm.context(), &["exit A", "exit P1", "enter P2", "enter C"]);
}

#[test]
fn child_handler_shadows_parent() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(m.p1, Transition::new(m.c))
        .unwrap();
    m.hsm
        .add_transition::<Reset>(m.a, Transition::new(m.b))
        .unwrap();
    m.hsm.start().unwrap();

    m.hsm.dispatch(&Reset).unwrap();
    assert_eq!(m.hsm.current(), m.b);
}

#[test]
fn activity_on_child_stops_bubbling() {
    let mut m = machine();
    m.hsm
        .add_activity::<Reset>(m.a, note("a saw reset".to_string()))
        .unwrap();
    m.hsm
        .add_transition::<Reset>(m.p1, Transition::new(m.c))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    let outcome = m.hsm.dispatch(&Reset).unwrap();

    assert!(outcome.handled());
    assert_eq!(m.hsm.current(), m.a);
    assert_eq!(m.hsm.context(), &["a saw reset"]);
}

#[test]
fn unknown_event_changes_nothing() {
    let mut m = started();

    let outcome = m.hsm.dispatch(&Nothing).unwrap();

    assert!(!outcome.handled());
    assert_eq!(m.hsm.current(), m.a);
    assert!(m.hsm.context().is_empty());
}

#[test]
fn transition_to_composite_enters_its_initial_child() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(m.a, Transition::new(m.p2))
        .unwrap();
    m.hsm
        .add_composite_start_activity(m.p2, note("P2 started".to_string()))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    let outcome = m.hsm.dispatch(&Reset).unwrap();

    assert_eq!(m.hsm.current(), m.c);
    assert_eq!(outcome.transitions_taken(), 2);
    assert_eq!(
        m.hsm.context(),
        &["exit A", "exit P1", "enter P2", "P2 started", "enter C"]
    );
}

#[test]
fn transition_to_enclosing_composite_reenters_it() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(m.b, Transition::new(m.p1))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.dispatch(&Next).unwrap();
    m.hsm.context_mut().clear();

    m.hsm.dispatch(&Reset).unwrap();

    assert_eq!(m.hsm.current(), m.a);
    assert_eq!(m.hsm.context(), &["exit B", "exit P1", "enter P1", "enter A"]);
}

#[test]
fn self_transition_exits_and_reenters() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(m.a, Transition::new(m.a))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    m.hsm.dispatch(&Reset).unwrap();

    assert_eq!(m.hsm.current(), m.a);
    assert_eq!(m.hsm.context(), &["exit A", "enter A"]);
}

#[test]
fn reaching_composite_final_stays_inside_composite() {
    let mut m = machine();
    let final_of_p1 = m.hsm.final_of(m.p1).unwrap();
    m.hsm
        .add_transition::<Finish>(m.a, Transition::new(final_of_p1))
        .unwrap();
    m.hsm
        .add_composite_stop_activity(m.p1, note("P1 finished".to_string()))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    m.hsm.dispatch(&Finish).unwrap();

    assert_eq!(m.hsm.current(), final_of_p1);
    assert!(m.hsm.is_running());
    assert!(m.hsm.is_completed(m.p1));
    assert!(m.hsm.is_in(m.p1));
    assert_eq!(m.hsm.context(), &["exit A", "P1 finished"]);
}

#[test]
fn stop_exits_every_ancestor_below_root() {
    let mut m = machine();
    m.hsm.add_stop_activity(note("stopped".to_string())).unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    let outcome = m.hsm.stop().unwrap();

    assert!(outcome.handled());
    assert_eq!(outcome.transition().target(), Some(m.hsm.final_state()));
    assert_eq!(m.hsm.current(), m.hsm.final_state());
    assert!(!m.hsm.is_running());
    assert!(m.hsm.is_active(m.hsm.root()));
    assert_eq!(m.hsm.context(), &["exit A", "exit P1", "stopped"]);
}

#[test]
fn guarded_transition_on_parent_is_skipped_when_false() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(
            m.p1,
            Transition::with_guard(Guard::new(|journal: &Journal, _| journal.len() > 100), m.c),
        )
        .unwrap();
    m.hsm.start().unwrap();

    let outcome = m.hsm.dispatch(&Reset).unwrap();
    assert!(!outcome.handled());
    assert_eq!(m.hsm.current(), m.a);
}

#[test]
fn explicit_initial_must_be_a_child() {
    let mut m = machine();
    let err = m.hsm.set_initial_state(m.p1, m.c).unwrap_err();
    assert!(matches!(err, HsmError::InvalidTopology { .. }));

    m.hsm.set_initial_state(m.p1, m.b).unwrap();
    m.hsm.start().unwrap();
    assert_eq!(m.hsm.current(), m.b);
}

#[test]
fn states_need_a_composite_parent() {
    let mut m = machine();
    let err = m.hsm.add_state("Orphan", m.a).unwrap_err();
    match err {
        HsmError::InvalidTopology { violations } => {
            assert_eq!(violations, vec![TopologyViolation::NotComposite("A".to_string())]);
        }
        other => panic!("expected topology error, got {other}"),
    }
}

#[test]
fn composite_pseudostates_are_exposed() {
    let m = machine();
    let initial = m.hsm.initial_of(m.p2).unwrap();
    assert_eq!(m.hsm.kind(initial), Some(StateKind::Initial));
    assert_eq!(m.hsm.kind(m.p2), Some(StateKind::Composite));
    assert_eq!(m.hsm.kind(m.c), Some(StateKind::Simple));
    assert_eq!(m.hsm.parent(m.c), Some(m.p2));
    assert_eq!(m.hsm.children(m.p1), &[m.a, m.b]);
    assert_eq!(m.hsm.ancestors(m.c), vec![m.hsm.root(), m.p2, m.c]);
}

#[test]
fn snapshot_carries_active_path() {
    let mut m = started();
    m.hsm.dispatch(&Cross).unwrap();

    let snapshot = m.hsm.snapshot();
    let restored = hierarch::MachineSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();

    assert_eq!(restored.current_path, vec!["Top", "P2", "C"]);
    assert!(restored.active.contains(&m.p2));
    assert!(!restored.active.contains(&m.p1));
    assert_eq!(restored.history.last().map(|r| r.to), Some(m.c));
}

#[test]
fn describe_shows_nesting() {
    let m = machine();
    let text = m.hsm.describe();
    assert!(text.contains("\n  Top: State"));
    assert!(text.contains("\n    P1: State"));
    assert!(text.contains("\n      A: State"));
}

#[test]
fn completion_hook_sees_each_trigger() {
    let mut m = machine();
    m.hsm
        .add_transition::<Reset>(m.a, Transition::new(m.p2))
        .unwrap();
    m.hsm
        .add_on_transition_completed_activity(Activity::new(Action::new(
            |journal: &mut Journal, event: &dyn Event| {
                journal.push(format!("done on {}", event.name()))
            },
        )))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    m.hsm.dispatch(&Reset).unwrap();

    assert_eq!(
        m.hsm.context(),
        &[
            "exit A",
            "exit P1",
            "enter P2",
            "done on Reset",
            "enter C",
            "done on Unnamed",
        ]
    );
}

#[test]
fn unnamed_transition_chains_after_crossing_composites() {
    let mut m = machine();
    let d = m.hsm.add_state("D", m.p2).unwrap();
    trace_lifecycle(&mut m.hsm, d);
    m.hsm
        .add_unnamed_transition(m.c, Transition::new(d))
        .unwrap();
    m.hsm.start().unwrap();
    m.hsm.context_mut().clear();

    let outcome = m.hsm.dispatch(&Cross).unwrap();

    assert_eq!(m.hsm.current(), d);
    assert_eq!(outcome.transitions_taken(), 2);
    assert_eq!(outcome.transition().target(), Some(m.c));
    assert_eq!(
        m.hsm.context(),
        &["exit A", "exit P1", "enter P2", "enter C", "exit C", "enter D"]
    );
}

#[test]
fn unnamed_transition_on_composite_fires_from_descendant() {
    let mut m = machine();
    let final_of_p1 = m.hsm.final_of(m.p1).unwrap();
    m.hsm
        .add_transition::<Finish>(m.a, Transition::new(final_of_p1))
        .unwrap();
    m.hsm
        .add_composite_stop_activity(m.p1, note("P1 finished".to_string()))
        .unwrap();
    m.hsm
        .add_unnamed_transition(
            m.p1,
            Transition::with_guard(
                Guard::named("p1_finished", |journal: &Journal, _| {
                    journal.iter().any(|entry| entry == "P1 finished")
                }),
                m.c,
            ),
        )
        .unwrap();
    m.hsm.start().unwrap();
    assert_eq!(m.hsm.current(), m.a);
    m.hsm.context_mut().clear();

    let outcome = m.hsm.dispatch(&Finish).unwrap();

    assert_eq!(m.hsm.current(), m.c);
    assert_eq!(outcome.transitions_taken(), 2);
    assert_eq!(
        m.hsm.context(),
        &["exit A", "P1 finished", "exit P1", "enter P2", "enter C"]
    );
}

/// `P1 --Unnamed--> P2 --Unnamed--> P1`, both unguarded. The leaves have no
/// `Unnamed` handler, so every probe bubbles to their composite.
fn ping_pong(config: MachineConfig) -> Hsm<Journal> {
    let mut hsm = Hsm::with_config(Journal::new(), config);
    let top = hsm.root();
    let p1 = hsm.add_composite("P1", top).unwrap();
    hsm.add_state("A", p1).unwrap();
    let p2 = hsm.add_composite("P2", top).unwrap();
    hsm.add_state("C", p2).unwrap();
    hsm.add_unnamed_transition(p1, Transition::new(p2)).unwrap();
    hsm.add_unnamed_transition(p2, Transition::new(p1)).unwrap();
    hsm
}

#[test]
fn unguarded_cycle_through_bubbling_is_rejected() {
    let mut hsm = ping_pong(MachineConfig::default().with_unguarded_cycle_check(true));

    let err = hsm.start().unwrap_err();

    match err {
        HsmError::InvalidTopology { violations } => match violations.as_slice() {
            [TopologyViolation::UnguardedCycle(path)] => {
                assert!(path.iter().any(|name| name == "A"));
                assert!(path.iter().any(|name| name == "C"));
            }
            other => panic!("expected one unguarded cycle, got {other:?}"),
        },
        other => panic!("expected topology error, got {other}"),
    }
    assert!(!hsm.is_running());
}

#[test]
fn guarded_hop_breaks_hierarchical_cycle() {
    let mut hsm = Hsm::with_config(
        Journal::new(),
        MachineConfig::default().with_unguarded_cycle_check(true),
    );
    let top = hsm.root();
    let p1 = hsm.add_composite("P1", top).unwrap();
    hsm.add_state("A", p1).unwrap();
    let p2 = hsm.add_composite("P2", top).unwrap();
    let c = hsm.add_state("C", p2).unwrap();
    hsm.add_unnamed_transition(p1, Transition::new(p2)).unwrap();
    hsm.add_unnamed_transition(
        p2,
        Transition::with_guard(Guard::new(|journal: &Journal, _| journal.len() > 1), p1),
    )
    .unwrap();

    hsm.start().unwrap();
    assert_eq!(hsm.current(), c);
}

#[test]
fn chain_limit_stops_hierarchical_runaway() {
    let mut hsm = ping_pong(MachineConfig::default().with_max_chain_steps(8));

    let err = hsm.start().unwrap_err();
    assert!(matches!(err, HsmError::ChainLimitExceeded { limit: 8 }));
}

/// `Top > P > A`: starting takes the root initial hop, then chains once
/// through `P`'s initial pseudostate.
fn nested_leaf(limit: usize) -> (Hsm<()>, StateId) {
    let mut hsm = Hsm::with_config((), MachineConfig::default().with_max_chain_steps(limit));
    let top = hsm.root();
    let p = hsm.add_composite("P", top).unwrap();
    let a = hsm.add_state("A", p).unwrap();
    (hsm, a)
}

#[test]
fn chain_limit_admits_exactly_limit_hops() {
    let (mut hsm, a) = nested_leaf(1);

    let outcome = hsm.start().unwrap();

    assert_eq!(hsm.current(), a);
    assert_eq!(outcome.transitions_taken(), 2);
}

#[test]
fn chain_limit_rejects_one_hop_more() {
    let (mut hsm, _) = nested_leaf(0);

    let err = hsm.start().unwrap_err();
    assert!(matches!(err, HsmError::ChainLimitExceeded { limit: 0 }));
}
