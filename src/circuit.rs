//! Gate-level circuit model: arena of gates, fanout branches, logic values and faults

mod circuit;
mod gate;

pub use circuit::Circuit;
pub use gate::{Fault, Gate, GateKind, Logic, StuckAt};
