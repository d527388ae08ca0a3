//! Topology rules.
//!
//! Each rule yields one `Validation` per finding so that
//! [`Validation::all_vec`] reports every violation at once.

use crate::config::MachineConfig;
use crate::core::StateId;
use crate::error::{HsmError, TopologyViolation};
use crate::machine::StateKind;
use crate::validation::graph::TopologyGraph;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type Check = Validation<(), NonEmptyVec<TopologyViolation>>;

/// Run every rule enabled by `config` against `graph`.
pub(crate) fn check_topology(graph: &TopologyGraph, config: &MachineConfig) -> Check {
    let mut checks: Vec<Check> = vec![Validation::success(())];
    checks.extend(check_targets(graph));
    checks.extend(check_regions(graph));
    if config.reject_unguarded_cycles {
        checks.extend(check_unguarded_cycles(graph));
    }
    Validation::all_vec(checks).map(|_| ())
}

/// Collapse an accumulated check into the crate error.
pub(crate) fn into_result(check: Check) -> Result<(), HsmError> {
    match check {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(HsmError::InvalidTopology {
            violations: errors.iter().cloned().collect(),
        }),
    }
}

/// Transitions must target known states and never an initial pseudostate.
pub(crate) fn check_targets(graph: &TopologyGraph) -> Vec<Check> {
    let mut checks = Vec::new();
    for node in &graph.nodes {
        for &target in &node.targets {
            match graph.node(target) {
                None => checks.push(Validation::fail(TopologyViolation::UnknownTarget {
                    from: node.name.clone(),
                    target,
                })),
                Some(landed) if landed.kind == StateKind::Initial => {
                    checks.push(Validation::fail(
                        TopologyViolation::TargetsInitialPseudostate {
                            from: node.name.clone(),
                            target: graph.name(target),
                        },
                    ))
                }
                Some(_) => {}
            }
        }
    }
    checks
}

/// Every initial pseudostate holds exactly one transition, unguarded and
/// keyed on `Unnamed`, targeting a child of its region or the region's final
/// pseudostate.
pub(crate) fn check_regions(graph: &TopologyGraph) -> Vec<Check> {
    let mut checks = Vec::new();
    for region in &graph.regions {
        let Some(initial) = graph.node(region.initial) else {
            checks.push(Validation::fail(TopologyViolation::MalformedInitial(
                region.owner.clone(),
            )));
            continue;
        };

        let well_formed = initial.targets.len() == 1
            && matches!(initial.unnamed.as_slice(), [(_, true)]);
        if !well_formed {
            checks.push(Validation::fail(TopologyViolation::MalformedInitial(
                region.owner.clone(),
            )));
            continue;
        }

        let target = initial.unnamed[0].0;
        if target != region.final_state && !region.children.contains(&target) {
            checks.push(Validation::fail(TopologyViolation::InitialOutsideRegion {
                composite: region.owner.clone(),
                target: graph.name(target),
            }));
        }
    }
    checks
}

/// Reject states from which `Unnamed` probes would transition forever.
pub(crate) fn check_unguarded_cycles(graph: &TopologyGraph) -> Vec<Check> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unseen,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unseen; graph.nodes.len()];
    let mut checks = Vec::new();

    for start in 0..graph.nodes.len() {
        if marks[start] != Mark::Unseen {
            continue;
        }

        let mut path = Vec::new();
        let mut cursor = Some(StateId::new(start));
        while let Some(id) = cursor {
            match marks.get(id.index()).copied() {
                Some(Mark::Unseen) => {
                    marks[id.index()] = Mark::OnPath;
                    path.push(id);
                    cursor = graph.forced_successor(id);
                }
                Some(Mark::OnPath) => {
                    let from = path.iter().position(|&p| p == id).unwrap_or(0);
                    let mut names: Vec<String> =
                        path[from..].iter().map(|&p| graph.name(p)).collect();
                    names.push(graph.name(id));
                    checks.push(Validation::fail(TopologyViolation::UnguardedCycle(names)));
                    break;
                }
                Some(Mark::Done) | None => break,
            }
        }

        for id in path {
            marks[id.index()] = Mark::Done;
        }
    }
    checks
}
