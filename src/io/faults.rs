//! Fault list files: alternating gate name and stuck-at code lines

use std::io::{BufRead, BufReader, Read};

use crate::circuit::{Circuit, Fault, StuckAt};

/// Read a fault list for a circuit
///
/// Non-empty lines alternate between a gate output name and a stuck-at code
/// (0 or 1). A name that resolves to no gate fails the read; a trailing name
/// with no code line is ignored.
pub fn read_faults<R: Read>(r: R, circuit: &Circuit) -> Result<Vec<Fault>, String> {
    let mut lines = Vec::new();
    for l in BufReader::new(r).lines() {
        let Ok(s) = l else {
            return Err("Error during file IO".to_string());
        };
        let t = s.trim().to_owned();
        if !t.is_empty() {
            lines.push(t);
        }
    }

    let mut faults = Vec::new();
    for pair in lines.chunks_exact(2) {
        let Some(gate) = circuit.gate_index(&pair[0]) else {
            return Err(format!("Fault site {} does not name a gate", pair[0]));
        };
        let stuck = pair[1]
            .parse::<u32>()
            .ok()
            .and_then(StuckAt::from_code)
            .ok_or_else(|| format!("Invalid stuck-at code {} for {}", pair[1], pair[0]))?;
        faults.push(Fault::new(gate, stuck));
    }
    Ok(faults)
}
