//! PODEM backtracking search for a pattern detecting a single stuck-at fault

use rand::rngs::SmallRng;
use rand::Rng;

use crate::circuit::{Circuit, Fault, GateKind, Logic, StuckAt};
use crate::sim::{fault_observed, simulate_events, simulate_full, SimState};

/// Which simulation strategy PODEM uses to imply values after an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStrategy {
    /// Re-simulate the whole circuit after every assignment
    Full,
    /// Propagate only from the changed primary input
    EventDriven,
}

/// How PODEM breaks ties when several D-frontier gates are candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveStrategy {
    /// Always pick the first D-frontier gate in stable gate order
    GateOrder,
    /// Pick a D-frontier gate at random (seeded, reproducible)
    Random,
}

/// PODEM search engine for one circuit
///
/// Owns all per-attempt mutable state (gate values, injected fault,
/// D-frontier); a single engine is reused across faults by resetting it in
/// [`Podem::detect`]. Callers must not interleave two attempts on the same
/// engine.
pub struct Podem<'a> {
    circuit: &'a Circuit,
    state: SimState,
    frontier: Vec<usize>,
    fault: Fault,
    sim: SimStrategy,
    objective: ObjectiveStrategy,
}

impl<'a> Podem<'a> {
    /// Create an engine for a circuit with the given strategies
    pub fn new(circuit: &'a Circuit, sim: SimStrategy, objective: ObjectiveStrategy) -> Podem<'a> {
        Podem {
            circuit,
            state: SimState::new(circuit),
            frontier: Vec::new(),
            fault: Fault::new(0, StuckAt::Zero),
            sim,
            objective,
        }
    }

    /// Search for a test pattern detecting the given fault
    ///
    /// Returns the primary-input assignment (in stable input order, with D/D'
    /// already mapped back to their fault-free values) or None when the fault
    /// is proven undetectable. Every successful search is re-simulated from
    /// scratch; a pattern that fails that check is an internal error and
    /// panics.
    pub fn detect(&mut self, fault: Fault, rng: &mut SmallRng) -> Option<Vec<Logic>> {
        self.state.reset();
        self.state.inject(fault);
        self.fault = fault;
        self.frontier.clear();

        if !self.recurse(rng) {
            return None;
        }
        self.check_pattern();
        let pattern = self
            .circuit
            .inputs()
            .iter()
            .map(|&pi| match self.state.value(pi) {
                Logic::D => Logic::One,
                Logic::DBar => Logic::Zero,
                v => v,
            })
            .collect();
        Some(pattern)
    }

    /// The PODEM recursion: objective, backtrace, assign, recurse, backtrack
    fn recurse(&mut self, rng: &mut SmallRng) -> bool {
        if fault_observed(self.circuit, &self.state) {
            return true;
        }
        let Some((obj_gate, obj_val)) = self.objective(rng) else {
            return false;
        };
        let Some((pi, pi_val)) = self.backtrace(obj_gate, obj_val) else {
            return false;
        };

        self.imply(pi, Logic::from_bool(pi_val));
        if self.recurse(rng) {
            return true;
        }
        // Flipping a faulted input cannot help: its value is pinned
        if self.fault.gate == pi {
            return false;
        }
        self.imply(pi, Logic::from_bool(!pi_val));
        if self.recurse(rng) {
            return true;
        }
        self.imply(pi, Logic::X);
        false
    }

    /// Set a primary input and propagate per the configured strategy
    fn imply(&mut self, pi: usize, value: Logic) {
        self.state.set_value(pi, value);
        match self.sim {
            SimStrategy::Full => simulate_full(self.circuit, &mut self.state),
            SimStrategy::EventDriven => simulate_events(self.circuit, &mut self.state, pi),
        }
    }

    /// Pick the next objective (gate, value)
    ///
    /// Excite the fault first; once excited, pick an unassigned input of a
    /// D-frontier gate and aim for its non-controlling value. Returns None
    /// when the fault can no longer be excited or the frontier is empty.
    fn objective(&mut self, rng: &mut SmallRng) -> Option<(usize, bool)> {
        let site = self.state.value(self.fault.gate);
        if site.is_binary() {
            // The fault site settled to its stuck value: never excited
            return None;
        }
        if site.is_unknown() {
            return Some((self.fault.gate, self.fault.stuck.activation()));
        }

        self.update_frontier();
        if self.frontier.is_empty() {
            return None;
        }
        let gate = match self.objective {
            ObjectiveStrategy::GateOrder => self.frontier[0],
            ObjectiveStrategy::Random => self.frontier[rng.gen_range(0..self.frontier.len())],
        };
        for &i in &self.circuit.gate(gate).inputs {
            if self.state.value(i).is_unknown() {
                return Some((i, objective_value(self.circuit.gate(gate).kind)));
            }
        }
        None
    }

    /// Rebuild the D-frontier: gates with an X output and a D or D' input
    fn update_frontier(&mut self) {
        self.frontier.clear();
        for g in 0..self.circuit.nb_gates() {
            if self.state.value(g) != Logic::X {
                continue;
            }
            let has_effect = self
                .circuit
                .gate(g)
                .inputs
                .iter()
                .any(|&i| self.state.value(i).is_fault_effect());
            if has_effect {
                self.frontier.push(g);
            }
        }
    }

    /// Walk from the objective back to a primary input along X-valued fan-ins
    ///
    /// Counts inversions on the way; the chosen input gets the objective
    /// value if the count is even, its complement otherwise.
    fn backtrace(&self, obj_gate: usize, obj_val: bool) -> Option<(usize, bool)> {
        let mut g = obj_gate;
        let mut inversions = 0u32;
        while self.circuit.gate(g).kind != GateKind::Input {
            if self.circuit.gate(g).kind.inverts() {
                inversions += 1;
            }
            let next = self
                .circuit
                .gate(g)
                .inputs
                .iter()
                .find(|&&i| self.state.value(i).is_unknown())?;
            g = *next;
        }
        let val = if inversions % 2 == 0 {
            obj_val
        } else {
            !obj_val
        };
        Some((g, val))
    }

    /// Re-simulate the found assignment from scratch and require D or D' on
    /// an output; anything else means the search or the simulator is broken
    fn check_pattern(&mut self) {
        simulate_full(self.circuit, &mut self.state);
        if !fault_observed(self.circuit, &self.state) {
            panic!(
                "Internal error: generated test does not detect {} on any output",
                self.fault
            );
        }
    }
}

/// Objective value for an input of a D-frontier gate: the non-controlling
/// value, with Xor treated as Or and Xnor as Nor
fn objective_value(kind: GateKind) -> bool {
    match kind {
        GateKind::And | GateKind::Nand => true,
        GateKind::Or | GateKind::Nor | GateKind::Xor | GateKind::Xnor => false,
        // Single-input gates never sit on the D-frontier: their output
        // cannot stay X while the input carries D or D'
        _ => unreachable!("gate kind {} cannot be on the D-frontier", kind),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::sim::pattern_detects;

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

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(1)
    }

    fn wide_fixture() -> Circuit {
        // two outputs, an inverter and a fanout stem on b
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let ci = c.add_input("c");
        let d = c.add_gate("d", GateKind::And, vec![a, b]);
        let nb = c.add_gate("nb", GateKind::Not, vec![b]);
        let e = c.add_gate("e", GateKind::Or, vec![d, ci]);
        let f = c.add_gate("f", GateKind::Nand, vec![nb, ci]);
        c.add_output(e);
        c.add_output(f);
        c.setup();
        c
    }

    /// A gate belongs on the D-frontier exactly when its value is X and at
    /// least one fan-in carries D or D'; check that against the rebuilt
    /// frontier after every assignment of a partial search.
    #[test]
    fn test_frontier_matches_definition() {
        let c = wide_fixture();
        let b = c.gate_index("b").unwrap();
        let mut podem = Podem::new(&c, SimStrategy::EventDriven, ObjectiveStrategy::GateOrder);
        podem.fault = Fault::new(b, StuckAt::One);
        podem.state.inject(podem.fault);

        let pis = c.inputs().to_vec();
        for (step, (pi, v)) in [
            (pis[1], Logic::Zero),
            (pis[0], Logic::One),
            (pis[2], Logic::Zero),
        ]
        .into_iter()
        .enumerate()
        {
            podem.imply(pi, v);
            podem.update_frontier();
            if step == 0 {
                // the fault effect reached d and f but neither resolved yet
                assert_eq!(podem.frontier.len(), 2);
            }
            for g in 0..c.nb_gates() {
                let on_frontier = podem.state.value(g) == Logic::X
                    && c.gate(g)
                        .inputs
                        .iter()
                        .any(|&i| podem.state.value(i).is_fault_effect());
                assert_eq!(
                    podem.frontier.contains(&g),
                    on_frontier,
                    "frontier disagrees on {}",
                    c.gate(g).name
                );
            }
        }
        assert!(fault_observed(&c, &podem.state));
    }

    #[test]
    fn test_and_or_fixture() {
        let c = fixture();
        let d = c.gate_index("d").unwrap();
        let mut podem = Podem::new(&c, SimStrategy::Full, ObjectiveStrategy::GateOrder);

        // Exciting d stuck-at-0 needs a = b = 1; c must not mask the OR
        let pattern = podem
            .detect(Fault::new(d, StuckAt::Zero), &mut rng())
            .unwrap();
        assert_eq!(pattern[0], Logic::One);
        assert_eq!(pattern[1], Logic::One);
        assert_ne!(pattern[2], Logic::One);
    }

    #[test]
    fn test_or_output_stuck_at_one() {
        let c = fixture();
        let e = c.gate_index("e").unwrap();
        let mut podem = Podem::new(&c, SimStrategy::Full, ObjectiveStrategy::GateOrder);
        let fault = Fault::new(e, StuckAt::One);
        let pattern = podem.detect(fault, &mut rng()).unwrap();
        assert!(pattern_detects(&c, fault, &pattern));
    }

    #[test]
    fn test_all_faults_detected() {
        let c = fixture();
        for strategy in [SimStrategy::Full, SimStrategy::EventDriven] {
            let mut podem = Podem::new(&c, strategy, ObjectiveStrategy::GateOrder);
            for fault in Fault::all(&c) {
                // every fault in this small irredundant circuit is testable
                let pattern = podem.detect(fault, &mut rng()).unwrap();
                assert!(
                    pattern_detects(&c, fault, &pattern),
                    "bad pattern for {}",
                    fault
                );
            }
        }
    }

    #[test]
    fn test_undetectable_fault() {
        // x = AND(a, NOT(a)) is constant 0: x stuck-at-0 has no test
        let mut c = Circuit::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let n = c.add_gate("n", GateKind::Not, vec![a]);
        let x = c.add_gate("x", GateKind::And, vec![a, n]);
        let o = c.add_gate("o", GateKind::Or, vec![x, b]);
        c.add_output(o);
        c.setup();

        let mut podem = Podem::new(&c, SimStrategy::EventDriven, ObjectiveStrategy::GateOrder);
        assert!(podem
            .detect(Fault::new(x, StuckAt::Zero), &mut rng())
            .is_none());
        // but x stuck-at-1 is testable: any input drives x to 0
        assert!(podem
            .detect(Fault::new(x, StuckAt::One), &mut rng())
            .is_some());
    }

    #[test]
    fn test_fault_on_primary_input() {
        let c = fixture();
        let a = c.gate_index("a").unwrap();
        let mut podem = Podem::new(&c, SimStrategy::EventDriven, ObjectiveStrategy::GateOrder);
        let fault = Fault::new(a, StuckAt::One);
        let pattern = podem.detect(fault, &mut rng()).unwrap();
        assert_eq!(pattern[0], Logic::Zero);
        assert!(pattern_detects(&c, fault, &pattern));
    }

    #[test]
    fn test_strategies_agree() {
        let c = fixture();
        let mut full = Podem::new(&c, SimStrategy::Full, ObjectiveStrategy::GateOrder);
        let mut event = Podem::new(&c, SimStrategy::EventDriven, ObjectiveStrategy::GateOrder);
        for fault in Fault::all(&c) {
            let p1 = full.detect(fault, &mut rng());
            let p2 = event.detect(fault, &mut rng());
            assert_eq!(p1, p2, "strategies diverge on {}", fault);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let c = fixture();
        let e = c.gate_index("e").unwrap();
        let fault = Fault::new(e, StuckAt::One);
        let mut podem = Podem::new(&c, SimStrategy::EventDriven, ObjectiveStrategy::Random);
        let mut r1 = SmallRng::seed_from_u64(42);
        let mut r2 = SmallRng::seed_from_u64(42);
        let p1 = podem.detect(fault, &mut r1);
        let p2 = podem.detect(fault, &mut r2);
        assert_eq!(p1, p2);
    }
}
