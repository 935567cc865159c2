//! Fault simulation in the 6-valued D-calculus, with full and event-driven strategies

mod event_sim;
mod full_sim;

pub use event_sim::simulate_events;
pub use full_sim::simulate_full;

use crate::circuit::{Circuit, Fault, GateKind, Logic, StuckAt};

/// Mutable value state for one fault-detection attempt
///
/// Holds the logic value of every gate plus the single injected fault.
/// The circuit itself stays immutable; a fresh or reset `SimState` is used
/// for each fault.
#[derive(Debug, Clone)]
pub struct SimState {
    values: Vec<Logic>,
    fault: Option<Fault>,
}

impl SimState {
    /// Create a state for the given circuit, all values unset and no fault
    pub fn new(circuit: &Circuit) -> SimState {
        SimState {
            values: vec![Logic::Unset; circuit.nb_gates()],
            fault: None,
        }
    }

    /// Set all values back to unset and clear the injected fault
    pub fn reset(&mut self) {
        self.values.fill(Logic::Unset);
        self.fault = None;
    }

    /// Current value of a gate
    pub fn value(&self, gate: usize) -> Logic {
        self.values[gate]
    }

    /// Set the value of a gate, with no fault re-encoding
    pub fn set_value(&mut self, gate: usize, value: Logic) {
        self.values[gate] = value;
    }

    /// Inject a stuck-at fault; at most one fault is active at a time
    pub fn inject(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// The currently injected fault, if any
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Re-encode a computed value through the fault on this gate, if any
    ///
    /// A stuck-at-0 gate turns a computed 1 into D and a computed D' into the
    /// fault-free 0; symmetrically for stuck-at-1. Everything else is stored
    /// unchanged.
    pub fn faulty_encode(&self, gate: usize, value: Logic) -> Logic {
        let Some(fault) = self.fault else {
            return value;
        };
        if fault.gate != gate {
            return value;
        }
        match (fault.stuck, value) {
            (StuckAt::Zero, Logic::One) => Logic::D,
            (StuckAt::Zero, Logic::DBar) => Logic::Zero,
            (StuckAt::One, Logic::Zero) => Logic::DBar,
            (StuckAt::One, Logic::D) => Logic::One,
            (_, v) => v,
        }
    }
}

/// Compute the output value of a gate from its current input values
///
/// The gate's own fault is not applied here; callers re-encode the result
/// through [`SimState::faulty_encode`].
pub(crate) fn eval_gate(circuit: &Circuit, state: &SimState, gate: usize) -> Logic {
    let g = circuit.gate(gate);
    match g.kind {
        GateKind::And | GateKind::Or | GateKind::Nand | GateKind::Nor => {
            eval_and_like(circuit, state, gate)
        }
        GateKind::Xor | GateKind::Xnor => eval_xor_like(circuit, state, gate),
        GateKind::Not => state.value(g.inputs[0]).invert(),
        GateKind::Buff | GateKind::Fanout => state.value(g.inputs[0]),
        GateKind::Input => state.value(gate),
    }
}

fn eval_and_like(circuit: &Circuit, state: &SimState, gate: usize) -> Logic {
    let g = circuit.gate(gate);
    let ctrl = g.kind.controlling_input().unwrap();
    let out_inv = g.kind.inverts();
    let mut has_x = false;
    let mut has_d = false;
    let mut has_dbar = false;
    for &i in &g.inputs {
        let v = state.value(i);
        if v == Logic::from_bool(ctrl) {
            return Logic::from_bool(ctrl ^ out_inv);
        }
        match v {
            Logic::D => has_d = true,
            Logic::DBar => has_dbar = true,
            Logic::X | Logic::Unset => has_x = true,
            _ => (),
        }
    }
    if has_d && has_dbar {
        // D and D' together mean a controlling value on one side or the other
        return Logic::from_bool(ctrl ^ out_inv);
    }
    if has_x {
        return Logic::X;
    }
    if has_d {
        return if out_inv { Logic::DBar } else { Logic::D };
    }
    if has_dbar {
        return if out_inv { Logic::D } else { Logic::DBar };
    }
    Logic::from_bool(!ctrl ^ out_inv)
}

fn eval_xor_like(circuit: &Circuit, state: &SimState, gate: usize) -> Logic {
    let g = circuit.gate(gate);
    let mut good = false;
    let mut bad = false;
    for &i in &g.inputs {
        let Some((g_bit, b_bit)) = state.value(i).good_bad() else {
            return Logic::X;
        };
        good ^= g_bit;
        bad ^= b_bit;
    }
    if g.kind.inverts() {
        Logic::from_good_bad(!good, !bad)
    } else {
        Logic::from_good_bad(good, bad)
    }
}

/// Returns whether some primary output currently carries D or D'
pub fn fault_observed(circuit: &Circuit, state: &SimState) -> bool {
    circuit
        .outputs()
        .iter()
        .any(|&o| state.value(o).is_fault_effect())
}

/// Returns whether a concrete test pattern detects a fault
///
/// Runs a fresh full simulation of the pattern with the fault injected and
/// looks for D or D' on a primary output.
pub fn pattern_detects(circuit: &Circuit, fault: Fault, pattern: &[Logic]) -> bool {
    assert_eq!(pattern.len(), circuit.nb_inputs());
    let mut state = SimState::new(circuit);
    state.inject(fault);
    for (&pi, &v) in circuit.inputs().iter().zip(pattern.iter()) {
        state.set_value(pi, v);
    }
    simulate_full(circuit, &mut state);
    fault_observed(circuit, &state)
}
