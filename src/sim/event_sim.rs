use std::collections::VecDeque;

use crate::circuit::Circuit;
use crate::sim::{eval_gate, SimState};

/// Propagate the consequences of a single changed gate value
///
/// The changed gate is first re-encoded through the injected fault, then its
/// fan-out is re-evaluated; a gate is queued again only when its value
/// actually changed, so untouched logic is never visited.
pub fn simulate_events(circuit: &Circuit, state: &mut SimState, changed: usize) {
    let seed = state.faulty_encode(changed, state.value(changed));
    state.set_value(changed, seed);

    let mut queue = VecDeque::new();
    queue.push_back(changed);
    while let Some(g) = queue.pop_front() {
        for &sink in &circuit.gate(g).outputs {
            let old = state.value(sink);
            let new = state.faulty_encode(sink, eval_gate(circuit, state, sink));
            if new != old {
                state.set_value(sink, new);
                queue.push_back(sink);
            }
        }
    }
}
