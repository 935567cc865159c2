//! Test pattern generation for stuck-at faults in combinational circuits
//!
//! This crate implements [automatic test pattern generation](https://en.wikipedia.org/wiki/Automatic_test_pattern_generation)
//! for the single stuck-at fault model, built around the classic PODEM
//! algorithm: a backtracking search that assigns primary inputs only,
//! guided by a fault simulator running a six-valued logic
//! (0, 1, D, D', X and unset).
//!
//! # Usage
//!
//! ```bash
//! # Show available commands
//! podem help
//! # Print a circuit after fanout splitting
//! podem show circuit.bench
//! # Generate test patterns with event-driven simulation and fault collapsing
//! podem atpg 3 circuit.bench circuit.faults -o results
//! # Dump the fault equivalence graph on its own
//! podem collapse circuit.bench -o circuit.fc
//! ```
//!
//! # Datastructures
//!
//! All algorithms operate on a single datastructure, [`Circuit`]: a flat
//! arena of named gates addressed by stable indices. After loading, every
//! net feeding several sinks is split into explicit fanout branches, so a
//! fault can be placed on a branch independently of its stem. Values are
//! never stored in the circuit itself; each detection attempt owns a
//! [`sim::SimState`] holding the six-valued assignment and the injected
//! fault.
//!
//! On top of the search, a fault-collapsing graph
//! ([`collapse::FaultEquiv`]) groups structurally equivalent faults and
//! records dominance edges, and the reduction controller uses it to emit a
//! smaller test set with the same coverage.
//!
//! For example, running the search by hand:
//! ```
//! # use podem::{Circuit, Fault, GateKind, StuckAt};
//! use podem::podem::{ObjectiveStrategy, Podem, SimStrategy};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let mut circuit = Circuit::new();
//! let a = circuit.add_input("a");
//! let b = circuit.add_input("b");
//! let d = circuit.add_gate("d", GateKind::And, vec![a, b]);
//! circuit.add_output(d);
//! circuit.setup();
//!
//! let mut podem = Podem::new(&circuit, SimStrategy::EventDriven, ObjectiveStrategy::GateOrder);
//! let mut rng = SmallRng::seed_from_u64(1);
//! let pattern = podem.detect(Fault::new(d, StuckAt::Zero), &mut rng);
//! assert!(pattern.is_some());
//! ```

#![warn(missing_docs)]

pub mod atpg;
pub mod circuit;
pub mod cmd;
pub mod collapse;
pub mod io;
pub mod podem;
pub mod reduce;
pub mod sim;

pub use circuit::{Circuit, Fault, Gate, GateKind, Logic, StuckAt};
