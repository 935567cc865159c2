use core::fmt;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use fxhash::FxHashMap;

use crate::circuit::gate::{Gate, GateKind};

/// Gate-level representation of a combinational circuit
///
/// Gates are stored in an arena and addressed by stable indices; the
/// insertion order (primary inputs first, then gates as declared) is the
/// stable order used for every tie-break in the rest of the system.
/// After [`Circuit::setup`], every net driving more than one sink has been
/// split into explicit fanout branches, each gate knows its topological
/// depth, and a topological evaluation order is available.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    gates: Vec<Gate>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    names: FxHashMap<String, usize>,
    order: Vec<usize>,
}

impl Circuit {
    /// Create a new empty circuit
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of gates, fanout branches and primary inputs included
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.gates[i]
    }

    /// Primary input gate indices, in declaration order
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Primary output gate indices, in declaration order
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Gate indices in topological order, inputs first
    pub fn topo_order(&self) -> &[usize] {
        &self.order
    }

    /// Look up a gate by the name of its output net
    pub fn gate_index(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Add a new primary input
    pub fn add_input(&mut self, name: &str) -> usize {
        let i = self.add_named(Gate::new(name.to_string(), GateKind::Input, Vec::new()));
        self.inputs.push(i);
        i
    }

    /// Add a new gate fed by existing gate indices
    pub fn add_gate(&mut self, name: &str, kind: GateKind, inputs: Vec<usize>) -> usize {
        for &i in &inputs {
            assert!(i < self.gates.len(), "Invalid gate index {}", i);
        }
        self.add_named(Gate::new(name.to_string(), kind, inputs))
    }

    /// Add a gate that may reference indices not inserted yet
    ///
    /// Used by file readers, where statements come in declaration order and
    /// may name gates defined further down; [`Circuit::check`] validates the
    /// indices afterwards.
    pub(crate) fn add_gate_unresolved(
        &mut self,
        name: &str,
        kind: GateKind,
        inputs: Vec<usize>,
    ) -> usize {
        self.add_named(Gate::new(name.to_string(), kind, inputs))
    }

    /// Mark an existing gate as a primary output
    pub fn add_output(&mut self, gate: usize) {
        assert!(gate < self.gates.len(), "Invalid gate index {}", gate);
        self.outputs.push(gate);
    }

    fn add_named(&mut self, gate: Gate) -> usize {
        let i = self.gates.len();
        let present = self.names.insert(gate.name.clone(), i).is_some();
        assert!(!present, "{} is defined twice", gate.name);
        self.gates.push(gate);
        i
    }

    /// Finalize the circuit after construction
    ///
    /// Splits fanout stems into explicit branch gates, computes topological
    /// depths and the topological evaluation order.
    /// Panics if the netlist contains a combinational loop.
    pub fn setup(&mut self) {
        self.build_fanout();
        self.split_fanout();
        self.compute_order();
        self.compute_depth();
    }

    /// Rebuild the fan-out lists from the fan-in lists
    fn build_fanout(&mut self) {
        for g in &mut self.gates {
            g.outputs.clear();
        }
        for i in 0..self.gates.len() {
            // A gate using the same net twice counts as two sinks
            let fanin = self.gates[i].inputs.clone();
            for src in fanin {
                self.gates[src].outputs.push(i);
            }
        }
    }

    /// Insert one Fanout branch gate per sink of every multi-sink net
    fn split_fanout(&mut self) {
        let nb_stems = self.gates.len();
        for stem in 0..nb_stems {
            if self.gates[stem].outputs.len() <= 1 {
                continue;
            }
            let sinks = std::mem::take(&mut self.gates[stem].outputs);
            for (k, sink) in sinks.into_iter().enumerate() {
                let name = format!("{}_br{}", self.gates[stem].name, k);
                let branch = self.add_named(Gate::new(name, GateKind::Fanout, vec![stem]));
                self.gates[branch].outputs.push(sink);
                self.gates[stem].outputs.push(branch);
                // Rewire the first remaining occurrence of the stem
                let pos = self.gates[sink]
                    .inputs
                    .iter()
                    .position(|&i| i == stem)
                    .expect("fanout sink lost its stem connection");
                self.gates[sink].inputs[pos] = branch;
            }
        }
    }

    /// Compute the topological evaluation order, lowest index first among ready gates
    fn compute_order(&mut self) {
        let mut count_deps: Vec<usize> = self.gates.iter().map(|g| g.inputs.len()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = count_deps
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        self.order.clear();
        while let Some(Reverse(i)) = ready.pop() {
            self.order.push(i);
            for &s in &self.gates[i].outputs {
                count_deps[s] -= 1;
                if count_deps[s] == 0 {
                    ready.push(Reverse(s));
                }
            }
        }
        if self.order.len() != self.gates.len() {
            panic!("Unable to order the circuit: there must be a combinational loop");
        }
    }

    /// Compute topological depths; must run after the order is available
    fn compute_depth(&mut self) {
        for i in 0..self.order.len() {
            let g = self.order[i];
            let depth = self.gates[g]
                .inputs
                .iter()
                .map(|&i| self.gates[i].depth + 1)
                .max()
                .unwrap_or(0);
            self.gates[g].depth = depth;
        }
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        for (i, g) in self.gates.iter().enumerate() {
            for &src in &g.inputs {
                assert!(
                    self.gates[src].outputs.contains(&i),
                    "Fan-in/fan-out of gate {} is not symmetric",
                    g.name
                );
            }
            for &sink in &g.outputs {
                assert!(
                    self.gates[sink].inputs.contains(&i),
                    "Fan-out/fan-in of gate {} is not symmetric",
                    g.name
                );
            }
            if g.kind == GateKind::Input {
                assert!(g.inputs.is_empty());
            }
            if matches!(g.kind, GateKind::Not | GateKind::Buff | GateKind::Fanout) {
                assert_eq!(g.inputs.len(), 1, "{} must have a single input", g.kind);
            }
        }
        for &o in &self.outputs {
            assert!(o < self.gates.len(), "Invalid output index {o}");
        }
        assert_eq!(self.order.len(), self.gates.len());
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for g in &self.gates {
            if g.kind == GateKind::Input {
                continue;
            }
            let args = g
                .inputs
                .iter()
                .map(|&i| self.gates[i].name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "\t{} = {}({})", g.name, g.kind, args)?;
        }
        for &o in &self.outputs {
            writeln!(f, "\tOUTPUT({})", self.gates[o].name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let d = c.add_gate("d", GateKind::And, vec![a, b]);
        c.add_output(d);
        c.setup();
        c.check();

        assert_eq!(c.nb_inputs(), 2);
        assert_eq!(c.nb_outputs(), 1);
        assert_eq!(c.nb_gates(), 3);
        assert_eq!(c.gate_index("d"), Some(d));
        assert_eq!(c.gate_index("nope"), None);
        assert_eq!(c.gate(d).depth, 1);
        assert_eq!(c.topo_order(), &[a, b, d]);
    }

    #[test]
    fn test_fanout_split() {
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let x = c.add_gate("x", GateKind::And, vec![a, b]);
        let y = c.add_gate("y", GateKind::Not, vec![a]);
        c.add_output(x);
        c.add_output(y);
        c.setup();
        c.check();

        // a feeds two sinks: it gets two explicit branches
        assert_eq!(c.nb_gates(), 6);
        let br0 = c.gate_index("a_br0").unwrap();
        let br1 = c.gate_index("a_br1").unwrap();
        assert_eq!(c.gate(br0).kind, GateKind::Fanout);
        assert_eq!(c.gate(br0).inputs, vec![a]);
        assert_eq!(c.gate(x).inputs, vec![br0, b]);
        assert_eq!(c.gate(y).inputs, vec![br1]);
        assert_eq!(c.gate(a).outputs, vec![br0, br1]);
        assert_eq!(c.gate(x).depth, 2);
    }

    #[test]
    fn test_duplicate_sink_split() {
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let x = c.add_gate("x", GateKind::And, vec![a, a]);
        c.add_output(x);
        c.setup();
        c.check();

        let br0 = c.gate_index("a_br0").unwrap();
        let br1 = c.gate_index("a_br1").unwrap();
        assert_eq!(c.gate(x).inputs, vec![br0, br1]);
    }

    #[test]
    #[should_panic]
    fn test_loop_detection() {
        let mut c = Circuit::new();
        let a = c.add_input("a");
        // x and y feed each other
        let x = c.add_gate("x", GateKind::And, vec![a, a]);
        let y = c.add_gate("y", GateKind::And, vec![x, a]);
        c.gates[x].inputs[1] = y;
        c.add_output(y);
        c.setup();
    }

    #[test]
    #[should_panic]
    fn test_duplicate_name() {
        let mut c = Circuit::new();
        c.add_input("a");
        c.add_input("a");
    }
}
