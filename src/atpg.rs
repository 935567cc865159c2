//! Top-level test pattern generation driver

use kdam::{tqdm, BarExt};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::circuit::{Circuit, Fault, Logic};
use crate::collapse::{collapse_circuit, FaultEquiv};
use crate::podem::{ObjectiveStrategy, Podem, SimStrategy};
use crate::reduce::reduce_tests;

/// Explicit configuration for one test generation run
#[derive(Debug, Clone, Copy)]
pub struct AtpgConfig {
    /// Simulation strategy used to imply values during the search
    pub sim: SimStrategy,
    /// Whether to collapse the fault list by structural equivalence
    pub collapse: bool,
    /// D-frontier tie-break strategy
    pub objective: ObjectiveStrategy,
    /// Whether to record dominance edges in the collapsing graph
    pub dominance: bool,
    /// Whether to run dominance-ordered test-set reduction
    pub reduce: bool,
    /// Seed for every randomized choice of the run
    pub seed: u64,
}

impl AtpgConfig {
    /// Decode a numeric mode into a configuration
    ///
    /// Modes stack: 1 is the full-simulation baseline, 2 switches to
    /// event-driven simulation, 3 adds equivalence collapsing, 4 adds the
    /// randomized objective and dominance recording, 5 adds test-set
    /// reduction.
    pub fn from_mode(mode: u8, seed: u64) -> AtpgConfig {
        assert!((1..=5).contains(&mode), "mode must be between 1 and 5");
        AtpgConfig {
            sim: if mode == 1 {
                SimStrategy::Full
            } else {
                SimStrategy::EventDriven
            },
            collapse: mode >= 3,
            objective: if mode >= 4 {
                ObjectiveStrategy::Random
            } else {
                ObjectiveStrategy::GateOrder
            },
            dominance: mode >= 4,
            reduce: mode >= 5,
            seed,
        }
    }
}

/// Result of the search for one target fault
#[derive(Debug, Clone)]
pub struct FaultReport {
    /// The fault the search ran for
    pub fault: Fault,
    /// The detecting input pattern, or None when the fault is undetectable
    pub pattern: Option<Vec<Logic>>,
}

/// Everything a test generation run produced
#[derive(Debug)]
pub struct AtpgOutcome {
    /// One report per target fault, in processing order
    pub reports: Vec<FaultReport>,
    /// The collapsing graph, when the configuration built one
    pub graph: Option<FaultEquiv>,
}

/// Run test pattern generation for a list of faults
///
/// With collapsing enabled the targets are one representative per
/// equivalence node; with reduction enabled the dominance-ordered controller
/// takes over the loop and emits fewer tests. Every generated pattern has
/// already survived the re-simulation self-check.
pub fn generate_tests(circuit: &Circuit, faults: &[Fault], config: &AtpgConfig) -> AtpgOutcome {
    let graph = if config.collapse {
        Some(collapse_circuit(circuit, faults, config.dominance))
    } else {
        None
    };
    let targets: Vec<Fault> = match &graph {
        Some(g) => g.collapsed_faults(),
        None => faults.to_vec(),
    };
    let mut rng = SmallRng::seed_from_u64(config.seed);

    let mut progress = tqdm!(total = targets.len());
    progress.set_description("Faults processed");
    progress
        .write(format!(
            "Analyzing circuit with {} inputs, {} outputs and {} target faults",
            circuit.nb_inputs(),
            circuit.nb_outputs(),
            targets.len(),
        ))
        .unwrap();

    let reports = if config.reduce {
        let g = graph
            .as_ref()
            .expect("test-set reduction requires the collapsing graph");
        reduce_tests(circuit, g, config.sim, config.objective, &mut rng, || {
            progress.update(1).unwrap();
        })
    } else {
        let mut podem = Podem::new(circuit, config.sim, config.objective);
        let mut reports = Vec::new();
        for &fault in &targets {
            let pattern = podem.detect(fault, &mut rng);
            reports.push(FaultReport { fault, pattern });
            progress.update(1).unwrap();
        }
        reports
    };

    let nb_found = reports.iter().filter(|r| r.pattern.is_some()).count();
    progress.update_to(targets.len()).unwrap();
    progress
        .write(format!(
            "Generated {} test patterns, {} fault(s) left undetectable",
            nb_found,
            reports.len() - nb_found,
        ))
        .unwrap();
    AtpgOutcome { reports, graph }
}
