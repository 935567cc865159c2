//! Fault collapsing: structural equivalence classes and dominance edges

use std::io::{self, Write};

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::circuit::{Circuit, Fault, GateKind, StuckAt};

/// One node of the collapsing graph: a set of mutually-equivalent faults
/// plus dominance adjacency
///
/// Adjacency lists hold slot indices; they are resolved through the
/// union-find at read time, so merging nodes never rewrites edges in place.
#[derive(Debug, Clone)]
struct EquivNode {
    faults: Vec<Fault>,
    dominates: Vec<usize>,
    dominated_by: Vec<usize>,
}

/// The fault-collapsing graph over a fixed universe of faults
///
/// Each initial fault gets its own slot; equivalence merges union slots
/// under the surviving node's id. Node membership always partitions the
/// original fault list, and a node never dominates itself.
#[derive(Debug, Clone)]
pub struct FaultEquiv {
    parent: Vec<usize>,
    nodes: Vec<Option<EquivNode>>,
    index: FxHashMap<Fault, usize>,
}

impl FaultEquiv {
    /// Initialize the graph with one node per fault, no equivalence or
    /// dominance recorded yet
    pub fn new(faults: &[Fault]) -> FaultEquiv {
        let mut index = FxHashMap::default();
        let mut nodes = Vec::new();
        for (slot, &f) in faults.iter().enumerate() {
            index.insert(f, slot);
            nodes.push(Some(EquivNode {
                faults: vec![f],
                dominates: Vec::new(),
                dominated_by: Vec::new(),
            }));
        }
        FaultEquiv {
            parent: (0..faults.len()).collect(),
            nodes,
            index,
        }
    }

    fn find(&self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            slot = self.parent[slot];
        }
        slot
    }

    /// Node id holding the given fault, or None if the fault is not part of
    /// the considered universe
    pub fn node_of(&self, fault: Fault) -> Option<usize> {
        self.index.get(&fault).map(|&slot| self.find(slot))
    }

    /// Number of fault slots in the universe; node ids stay below this bound
    pub fn nb_slots(&self) -> usize {
        self.parent.len()
    }

    /// Number of surviving nodes
    pub fn nb_nodes(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Ids of the surviving nodes, in ascending order
    pub fn node_ids(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].is_some())
            .collect()
    }

    /// The equivalent faults held by a node
    pub fn node_faults(&self, id: usize) -> &[Fault] {
        &self.nodes[id].as_ref().expect("dead collapsing node").faults
    }

    /// Ids of the nodes a node dominates, ascending and deduplicated
    pub fn dominated(&self, id: usize) -> Vec<usize> {
        self.resolve_adjacency(id, false)
    }

    /// Ids of the nodes dominating a node, ascending and deduplicated
    pub fn dominators(&self, id: usize) -> Vec<usize> {
        self.resolve_adjacency(id, true)
    }

    fn resolve_adjacency(&self, id: usize, inbound: bool) -> Vec<usize> {
        let node = self.nodes[id].as_ref().expect("dead collapsing node");
        let raw = if inbound {
            &node.dominated_by
        } else {
            &node.dominates
        };
        raw.iter()
            .map(|&slot| self.find(slot))
            .filter(|&n| n != id)
            .sorted()
            .dedup()
            .collect()
    }

    /// Record that two faults are equivalent, merging their nodes
    ///
    /// Returns false, without touching the graph, if either fault is outside
    /// the considered universe or the faults are already in the same node.
    pub fn merge(&mut self, f1: Fault, f2: Fault) -> bool {
        let (Some(&s1), Some(&s2)) = (self.index.get(&f1), self.index.get(&f2)) else {
            return false;
        };
        let (r1, r2) = (self.find(s1), self.find(s2));
        if r1 == r2 {
            return false;
        }
        let dead = self.nodes[r2].take().expect("dead collapsing node");
        self.parent[r2] = r1;
        let live = self.nodes[r1].as_mut().expect("dead collapsing node");
        live.faults.extend(dead.faults);
        live.dominates.extend(dead.dominates);
        live.dominated_by.extend(dead.dominated_by);
        true
    }

    /// Record that `dominator` dominates `dominated`: any test generated for
    /// the dominator is guaranteed to also detect the dominated fault
    ///
    /// Returns false if either fault is unknown, both are in the same node,
    /// or the edge is already present.
    pub fn add_dominance(&mut self, dominator: Fault, dominated: Fault) -> bool {
        let (Some(a), Some(b)) = (self.node_of(dominator), self.node_of(dominated)) else {
            return false;
        };
        if a == b {
            return false;
        }
        if self.dominated(a).contains(&b) {
            return false;
        }
        self.nodes[a].as_mut().expect("dead collapsing node").dominates.push(b);
        self.nodes[b].as_mut().expect("dead collapsing node").dominated_by.push(a);
        true
    }

    /// One representative fault per surviving node, in ascending node id
    pub fn collapsed_faults(&self) -> Vec<Fault> {
        self.nodes
            .iter()
            .flatten()
            .map(|n| n.faults[0])
            .collect()
    }

    /// Print the graph, one line per surviving node in ascending id, with
    /// fault sets sorted by gate name and adjacency sorted by node id
    pub fn write_dump<W: Write>(&self, circuit: &Circuit, w: &mut W) -> io::Result<()> {
        let fault_name = |f: &Fault| format!("{}/{}", circuit.gate(f.gate).name, f.stuck);
        for id in self.node_ids() {
            let faults = self
                .node_faults(id)
                .iter()
                .sorted_by_key(|f| &circuit.gate(f.gate).name)
                .map(fault_name)
                .join(" == ");
            write!(w, "Fault equivalence node ID {}: [{}]; ", id, faults)?;
            let dominated = self.dominated(id);
            if !dominated.is_empty() {
                let label = if dominated.len() > 1 { "nodes" } else { "node" };
                write!(w, "Dominates {}: [{}]; ", label, dominated.iter().join(", "))?;
            }
            let dominators = self.dominators(id);
            if !dominators.is_empty() {
                let label = if dominators.len() > 1 { "nodes" } else { "node" };
                write!(w, "Dominated by {}: [{}]", label, dominators.iter().join(", "))?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Build the collapsing graph for a circuit by structural traversal
///
/// Walks backward from the primary outputs, visiting each gate once.
/// Fanout branches and the Xor family contribute no equivalences; inverters
/// and buffers tie their faults to their input's; And-like gates merge the
/// controlling-output fault with the matching fault on every input.
/// When `with_dominance` is set, the opposite input-side fault is recorded
/// as dominating the opposite gate-side fault.
pub fn collapse_circuit(circuit: &Circuit, faults: &[Fault], with_dominance: bool) -> FaultEquiv {
    let mut graph = FaultEquiv::new(faults);
    let mut visited = vec![false; circuit.nb_gates()];
    let mut stack: Vec<usize> = circuit.outputs().iter().rev().copied().collect();

    while let Some(g) = stack.pop() {
        if visited[g] {
            continue;
        }
        visited[g] = true;
        collapse_gate(circuit, g, with_dominance, &mut graph);
        for &i in circuit.gate(g).inputs.iter().rev() {
            if !visited[i] {
                stack.push(i);
            }
        }
    }
    graph
}

fn collapse_gate(circuit: &Circuit, g: usize, with_dominance: bool, graph: &mut FaultEquiv) {
    let gate = circuit.gate(g);
    match gate.kind {
        GateKind::Not => {
            let i = gate.inputs[0];
            graph.merge(Fault::new(g, StuckAt::Zero), Fault::new(i, StuckAt::One));
            graph.merge(Fault::new(g, StuckAt::One), Fault::new(i, StuckAt::Zero));
        }
        GateKind::Buff => {
            let i = gate.inputs[0];
            graph.merge(Fault::new(g, StuckAt::Zero), Fault::new(i, StuckAt::Zero));
            graph.merge(Fault::new(g, StuckAt::One), Fault::new(i, StuckAt::One));
        }
        k if k.is_and_like() => {
            // The controlling input value forces the output: both stuck-at
            // faults are equivalent
            let stuck_in = stuck_from_value(k.controlling_input().unwrap());
            let stuck_out = stuck_from_value(k.controlling_output().unwrap());
            for &i in &gate.inputs {
                graph.merge(Fault::new(g, stuck_out), Fault::new(i, stuck_in));
                if with_dominance {
                    graph.add_dominance(
                        Fault::new(i, stuck_in.opposite()),
                        Fault::new(g, stuck_out.opposite()),
                    );
                }
            }
        }
        // Fanout branches and the Xor family break structural equivalence
        _ => (),
    }
}

fn stuck_from_value(value: bool) -> StuckAt {
    if value {
        StuckAt::One
    } else {
        StuckAt::Zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Circuit {
        // d = AND(a, b); e = OR(d, c)
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let ci = c.add_input("c");
        let d = c.add_gate("d", GateKind::And, vec![a, b]);
        let e = c.add_gate("e", GateKind::Or, vec![d, ci]);
        c.add_output(e);
        c.setup();
        c
    }

    #[test]
    fn test_merge_basics() {
        let c = fixture();
        let faults = Fault::all(&c);
        let mut graph = FaultEquiv::new(&faults);
        let a = c.gate_index("a").unwrap();
        let b = c.gate_index("b").unwrap();

        let f1 = Fault::new(a, StuckAt::Zero);
        let f2 = Fault::new(b, StuckAt::Zero);
        assert!(graph.merge(f1, f2));
        // merging twice is a no-op reported as already merged
        assert!(!graph.merge(f1, f2));
        assert!(!graph.merge(f2, f1));
        assert_eq!(graph.node_of(f1), graph.node_of(f2));
        assert_eq!(graph.nb_nodes(), faults.len() - 1);

        // unknown faults fail the merge without touching the graph
        let bogus = Fault::new(c.nb_gates(), StuckAt::Zero);
        assert!(!graph.merge(f1, bogus));
        assert_eq!(graph.nb_nodes(), faults.len() - 1);
    }

    #[test]
    fn test_and_gate_collapse() {
        let c = fixture();
        let faults = Fault::all(&c);
        let graph = collapse_circuit(&c, &faults, false);
        let a = c.gate_index("a").unwrap();
        let b = c.gate_index("b").unwrap();
        let ci = c.gate_index("c").unwrap();
        let d = c.gate_index("d").unwrap();
        let e = c.gate_index("e").unwrap();

        // AND merges stuck-at-0 of output and both inputs
        let d0 = graph.node_of(Fault::new(d, StuckAt::Zero)).unwrap();
        assert_eq!(graph.node_of(Fault::new(a, StuckAt::Zero)), Some(d0));
        assert_eq!(graph.node_of(Fault::new(b, StuckAt::Zero)), Some(d0));
        // OR merges stuck-at-1 of output and both inputs
        let e1 = graph.node_of(Fault::new(e, StuckAt::One)).unwrap();
        assert_eq!(graph.node_of(Fault::new(d, StuckAt::One)), Some(e1));
        assert_eq!(graph.node_of(Fault::new(ci, StuckAt::One)), Some(e1));
        // the stuck-at-1 input faults of the AND stay separate
        assert_ne!(
            graph.node_of(Fault::new(a, StuckAt::One)),
            graph.node_of(Fault::new(b, StuckAt::One))
        );

        // 10 faults collapse into 6 nodes: {d0,a0,b0}, {e1,d1,c1}, a1, b1, c0, e0
        assert_eq!(graph.nb_nodes(), 6);
        let collapsed = graph.collapsed_faults();
        assert_eq!(collapsed.len(), 6);
        // conservative: every original fault maps into exactly one node
        for f in &faults {
            assert!(graph.node_of(*f).is_some());
        }
    }

    #[test]
    fn test_fanout_blocks_collapse() {
        // a feeds two gates; the branches must not merge through the stem
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let x = c.add_gate("x", GateKind::And, vec![a, b]);
        let y = c.add_gate("y", GateKind::Not, vec![a]);
        c.add_output(x);
        c.add_output(y);
        c.setup();

        let faults = Fault::all(&c);
        let graph = collapse_circuit(&c, &faults, false);
        let br0 = c.gate_index("a_br0").unwrap();
        let br1 = c.gate_index("a_br1").unwrap();
        // branch faults merge upward into their sinks, never across the stem
        assert_ne!(
            graph.node_of(Fault::new(br0, StuckAt::Zero)),
            graph.node_of(Fault::new(br1, StuckAt::Zero))
        );
        assert_ne!(
            graph.node_of(Fault::new(br0, StuckAt::Zero)),
            graph.node_of(Fault::new(a, StuckAt::Zero))
        );
    }

    #[test]
    fn test_dominance_edges() {
        let c = fixture();
        let faults = Fault::all(&c);
        let graph = collapse_circuit(&c, &faults, true);
        let a = c.gate_index("a").unwrap();
        let d = c.gate_index("d").unwrap();

        // For the AND: a/1 dominates d/1 (a test for a/1 sets b=1 and
        // propagates the difference, which also detects d/1)
        let a1 = graph.node_of(Fault::new(a, StuckAt::One)).unwrap();
        let d1 = graph.node_of(Fault::new(d, StuckAt::One)).unwrap();
        assert!(graph.dominated(a1).contains(&d1));
        assert!(graph.dominators(d1).contains(&a1));
        // no self dominance even after d/1 merged with e/1 and c/1
        assert!(!graph.dominated(d1).contains(&d1));
    }

    /// Re-simulate over every dominance edge: a test generated for the
    /// dominator must detect every fault of the dominated node.
    #[test]
    fn test_dominator_tests_detect_dominated() {
        use crate::circuit::Logic;
        use crate::podem::{ObjectiveStrategy, Podem, SimStrategy};
        use crate::sim::pattern_detects;
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let ci = c.add_input("c");
        let d = c.add_gate("d", GateKind::And, vec![a, b]);
        let nb = c.add_gate("nb", GateKind::Not, vec![b]);
        let e = c.add_gate("e", GateKind::Or, vec![d, ci]);
        let nf = c.add_gate("f", GateKind::Nand, vec![nb, ci]);
        c.add_output(e);
        c.add_output(nf);
        c.setup();

        let faults = Fault::all(&c);
        let graph = collapse_circuit(&c, &faults, true);
        let mut podem = Podem::new(&c, SimStrategy::EventDriven, ObjectiveStrategy::GateOrder);
        let mut rng = SmallRng::seed_from_u64(1);

        let mut nb_edges = 0;
        for id in graph.node_ids() {
            for dominated in graph.dominated(id) {
                nb_edges += 1;
                let rep = graph.node_faults(id)[0];
                let pattern = podem
                    .detect(rep, &mut rng)
                    .expect("every dominator here is testable");
                // any concrete completion of the test must keep detecting
                let concrete: Vec<Logic> = pattern
                    .iter()
                    .map(|&v| {
                        if v.is_unknown() {
                            Logic::from_bool(rng.gen())
                        } else {
                            v
                        }
                    })
                    .collect();
                for &df in graph.node_faults(dominated) {
                    assert!(
                        pattern_detects(&c, df, &concrete),
                        "test for {} misses dominated fault {}",
                        rep,
                        df
                    );
                }
            }
        }
        // two inputs each for the And, the Or and the Nand
        assert_eq!(nb_edges, 6);
    }

    #[test]
    fn test_dominance_rejects_duplicates_and_self() {
        let c = fixture();
        let faults = Fault::all(&c);
        let mut graph = FaultEquiv::new(&faults);
        let a = c.gate_index("a").unwrap();
        let d = c.gate_index("d").unwrap();
        let fa = Fault::new(a, StuckAt::One);
        let fd = Fault::new(d, StuckAt::One);

        assert!(graph.add_dominance(fa, fd));
        assert!(!graph.add_dominance(fa, fd));
        assert!(!graph.add_dominance(fa, fa));

        // merging the endpoints collapses the edge away
        assert!(graph.merge(fa, fd));
        let n = graph.node_of(fa).unwrap();
        assert!(graph.dominated(n).is_empty());
        assert!(graph.dominators(n).is_empty());
    }

    #[test]
    fn test_dump_format() {
        let c = fixture();
        let faults = Fault::all(&c);
        let graph = collapse_circuit(&c, &faults, false);
        let mut buf = Vec::new();
        graph.write_dump(&c, &mut buf).unwrap();
        let dump = String::from_utf8(buf).unwrap();
        assert!(dump.contains("Fault equivalence node ID"));
        // the AND equivalence class, sorted by gate name
        assert!(dump.contains("[a/0 == b/0 == d/0]"));
        assert!(dump.contains("[c/1 == d/1 == e/1]"));
        assert_eq!(dump.lines().count(), 6);
    }
}
