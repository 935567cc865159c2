use crate::circuit::{Circuit, GateKind};
use crate::sim::{eval_gate, SimState};

/// Recompute every gate value from the current primary-input assignment
///
/// Primary inputs keep their assigned value, re-encoded through the injected
/// fault; never-assigned inputs simply stay unset and evaluate as unknown.
/// Every other gate is then evaluated in topological order, so each gate
/// sees fully resolved fan-in values.
pub fn simulate_full(circuit: &Circuit, state: &mut SimState) {
    for &pi in circuit.inputs() {
        state.set_value(pi, state.faulty_encode(pi, state.value(pi)));
    }
    for &g in circuit.topo_order() {
        if circuit.gate(g).kind == GateKind::Input {
            continue;
        }
        let v = eval_gate(circuit, state, g);
        state.set_value(g, state.faulty_encode(g, v));
    }
}
