//! Read and write circuits, fault lists and test patterns

mod bench;
mod faults;
mod patterns;

use std::fs::File;
use std::path::PathBuf;

pub use bench::read_bench;
pub use faults::read_faults;
pub use patterns::write_patterns;

use crate::atpg::FaultReport;
use crate::circuit::{Circuit, Fault};
use crate::collapse::FaultEquiv;

/// Read a circuit from a .bench file
pub fn read_circuit_file(path: &PathBuf) -> Result<Circuit, String> {
    let f = File::open(path).map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;
    read_bench(f)
}

/// Read a fault list for an already-loaded circuit
pub fn read_fault_file(path: &PathBuf, circuit: &Circuit) -> Result<Vec<Fault>, String> {
    let f = File::open(path).map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;
    read_faults(f, circuit)
}

/// Write the generated test patterns to a file
pub fn write_pattern_file(path: &PathBuf, reports: &[FaultReport]) -> Result<(), String> {
    let mut f = File::create(path).map_err(|e| format!("Cannot create {}: {}", path.display(), e))?;
    write_patterns(&mut f, reports).map_err(|e| format!("Cannot write {}: {}", path.display(), e))
}

/// Write the fault-collapsing graph to a file
pub fn write_graph_file(
    path: &PathBuf,
    circuit: &Circuit,
    graph: &FaultEquiv,
) -> Result<(), String> {
    let mut f = File::create(path).map_err(|e| format!("Cannot create {}: {}", path.display(), e))?;
    graph
        .write_dump(circuit, &mut f)
        .map_err(|e| format!("Cannot write {}: {}", path.display(), e))
}
