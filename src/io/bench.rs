//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read};

use fxhash::FxHashMap;

use crate::circuit::{Circuit, GateKind};

fn circuit_from_statements(
    statements: &[Vec<String>],
    inputs: &[String],
    outputs: &[String],
) -> Result<Circuit, String> {
    // Names resolve to their final indices before any gate is created, so
    // statements may reference gates defined further down the file
    let mut name_to_gate = FxHashMap::default();
    for (i, name) in inputs.iter().enumerate() {
        if name_to_gate.insert(name.clone(), i).is_some() {
            return Err(format!("{} is defined twice", name));
        }
    }
    for (j, s) in statements.iter().enumerate() {
        if name_to_gate.insert(s[0].clone(), inputs.len() + j).is_some() {
            return Err(format!("{} is defined twice", s[0]));
        }
    }

    let mut circuit = Circuit::new();
    for name in inputs {
        circuit.add_input(name);
    }
    for s in statements {
        let Some(kind) = GateKind::from_name(&s[1]) else {
            return Err(format!("Unknown gate type {}", s[1]));
        };
        let mut deps = Vec::new();
        for dep in &s[2..] {
            match name_to_gate.get(dep) {
                Some(&i) => deps.push(i),
                None => return Err(format!("Gate input {} is not generated anywhere", dep)),
            }
        }
        if deps.is_empty() {
            return Err(format!("Gate {} has no input", s[0]));
        }
        if matches!(kind, GateKind::Not | GateKind::Buff) && deps.len() != 1 {
            return Err(format!(
                "{} takes a single input, {} has {}",
                s[1],
                s[0],
                deps.len()
            ));
        }
        circuit.add_gate_unresolved(&s[0], kind, deps);
    }
    for o in outputs {
        match name_to_gate.get(o) {
            Some(&i) => circuit.add_output(i),
            None => return Err(format!("Output {} is not generated anywhere", o)),
        }
    }
    circuit.setup();
    circuit.check();
    Ok(circuit)
}

/// Read a circuit in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUF(x4)
///     x6 = NOT(x5)
///     OUTPUT(x4)
/// ```
pub fn read_bench<R: Read>(r: R) -> Result<Circuit, String> {
    let mut statements = Vec::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for l in BufReader::new(r).lines() {
        let Ok(s) = l else {
            return Err("Error during file IO".to_string());
        };
        let t = s.trim().to_owned();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if !t.contains('=') {
            let parts: Vec<_> = t
                .split(&['(', ')'])
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return Err(format!("Cannot parse statement {}", t));
            }
            if parts[0] == "INPUT" {
                inputs.push(parts[1].to_string());
            } else if parts[0] == "OUTPUT" {
                outputs.push(parts[1].to_string());
            } else {
                return Err(format!("Unknown keyword {}", parts[0]));
            }
        } else {
            let parts: Vec<_> = t
                .split(&['=', '(', ',', ')'])
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() < 2 {
                return Err(format!("Cannot parse statement {}", t));
            }
            statements.push(parts);
        }
    }
    circuit_from_statements(&statements, &inputs, &outputs)
}
