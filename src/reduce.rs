//! Test-set reduction driven by the fault dominance relation

use rand::rngs::SmallRng;
use rand::Rng;

use crate::atpg::FaultReport;
use crate::circuit::{Circuit, Logic};
use crate::collapse::FaultEquiv;
use crate::podem::{ObjectiveStrategy, Podem, SimStrategy};
use crate::sim::pattern_detects;

/// Generate a reduced test set over the nodes of a collapsing graph
///
/// Nodes are processed with dominators before the nodes they dominate, so
/// the most constrained faults are attempted first. A successful test marks
/// every transitively dominated node detected, and the concrete pattern is
/// replayed once against the representatives still ahead in the order to
/// catch whatever else it happens to detect. Only the nodes where the search
/// actually ran produce a report; X inputs of emitted patterns are resolved
/// to concrete values from the rng. `progress` is called once per node, in
/// processing order, whether the node was searched or skipped.
pub fn reduce_tests(
    circuit: &Circuit,
    graph: &FaultEquiv,
    sim: SimStrategy,
    objective: ObjectiveStrategy,
    rng: &mut SmallRng,
    mut progress: impl FnMut(),
) -> Vec<FaultReport> {
    let order = dominance_order(graph);
    let mut detected = vec![false; graph.nb_slots()];
    let mut podem = Podem::new(circuit, sim, objective);
    let mut reports = Vec::new();

    for (pos, &id) in order.iter().enumerate() {
        progress();
        if detected[id] {
            continue;
        }
        let fault = graph.node_faults(id)[0];
        let Some(pattern) = podem.detect(fault, rng) else {
            reports.push(FaultReport {
                fault,
                pattern: None,
            });
            continue;
        };
        let concrete = complete_pattern(&pattern, rng);
        detected[id] = true;
        mark_dominated(graph, id, &mut detected);
        for &later in &order[pos + 1..] {
            if detected[later] {
                continue;
            }
            if pattern_detects(circuit, graph.node_faults(later)[0], &concrete) {
                detected[later] = true;
                mark_dominated(graph, later, &mut detected);
            }
        }
        reports.push(FaultReport {
            fault,
            pattern: Some(concrete),
        });
    }
    reports
}

/// Order the surviving nodes so that every node comes after its dominators
fn dominance_order(graph: &FaultEquiv) -> Vec<usize> {
    let mut order = Vec::new();
    let mut visited = vec![false; graph.nb_slots()];
    for root in graph.node_ids() {
        if visited[root] {
            continue;
        }
        let mut stack = vec![(root, false)];
        while let Some((n, expanded)) = stack.pop() {
            if expanded {
                order.push(n);
                continue;
            }
            if visited[n] {
                continue;
            }
            visited[n] = true;
            stack.push((n, true));
            for d in graph.dominators(n).into_iter().rev() {
                if !visited[d] {
                    stack.push((d, false));
                }
            }
        }
    }
    order
}

/// Mark everything a node transitively dominates as detected
fn mark_dominated(graph: &FaultEquiv, id: usize, detected: &mut [bool]) {
    let mut stack = vec![id];
    while let Some(n) = stack.pop() {
        for d in graph.dominated(n) {
            if !detected[d] {
                detected[d] = true;
                stack.push(d);
            }
        }
    }
}

/// Resolve the unassigned inputs of a pattern to concrete random values
fn complete_pattern(pattern: &[Logic], rng: &mut SmallRng) -> Vec<Logic> {
    pattern
        .iter()
        .map(|&v| {
            if v.is_unknown() {
                Logic::from_bool(rng.gen())
            } else {
                v
            }
        })
        .collect()
}
