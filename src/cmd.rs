//! Command line interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::exit;

use crate::atpg::{generate_tests, AtpgConfig};
use crate::circuit::Fault;
use crate::collapse::collapse_circuit;
use crate::io::{read_circuit_file, read_fault_file, write_graph_file, write_pattern_file};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a circuit
    ///
    /// Will print the number of inputs and outputs and the gate statements
    /// after fanout splitting.
    #[clap()]
    Show(ShowArgs),

    /// Generate test patterns for stuck-at faults
    ///
    /// Runs the PODEM search for every fault in the fault list and writes
    /// one pattern line per fault. The mode selects the strategies:
    ///   1: full re-simulation after each assignment
    ///   2: event-driven simulation
    ///   3: adds equivalence-based fault collapsing
    ///   4: adds the randomized objective and dominance recording
    ///   5: adds dominance-ordered test-set reduction
    #[clap(verbatim_doc_comment)]
    Atpg(AtpgArgs),

    /// Collapse a fault list without generating tests
    ///
    /// Builds the equivalence graph for the circuit and writes its dump.
    #[clap()]
    Collapse(CollapseArgs),
}

fn unwrap_or_fail<T>(res: Result<T, String>) -> T {
    res.unwrap_or_else(|e| {
        eprintln!("{}", e);
        exit(1);
    })
}

/// Command arguments for circuit informations
#[derive(Args)]
pub struct ShowArgs {
    /// Circuit to show
    network: PathBuf,
}

impl ShowArgs {
    /// Run the show command
    pub fn run(&self) {
        let circuit = unwrap_or_fail(read_circuit_file(&self.network));
        println!("{}", circuit);
    }
}

/// Command arguments for test pattern generation
#[derive(Args)]
pub struct AtpgArgs {
    /// Generation mode, 1 through 5
    #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
    mode: u8,

    /// Circuit to generate test patterns for
    network: PathBuf,

    /// Fault list file
    faults: PathBuf,

    /// Base name for the output files: <base>.out for the patterns,
    /// <base>.fc for the collapsing graph in modes 3 and up
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Random seed for test pattern generation
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl AtpgArgs {
    /// Run the atpg command
    pub fn run(&self) {
        let circuit = unwrap_or_fail(read_circuit_file(&self.network));
        let faults = unwrap_or_fail(read_fault_file(&self.faults, &circuit));
        let config = AtpgConfig::from_mode(self.mode, self.seed);
        let outcome = generate_tests(&circuit, &faults, &config);

        let out_path = PathBuf::from(format!("{}.out", self.output.display()));
        unwrap_or_fail(write_pattern_file(&out_path, &outcome.reports));
        if let Some(graph) = &outcome.graph {
            let fc_path = PathBuf::from(format!("{}.fc", self.output.display()));
            unwrap_or_fail(write_graph_file(&fc_path, &circuit, graph));
        }
    }
}

/// Command arguments for fault collapsing
#[derive(Args)]
pub struct CollapseArgs {
    /// Circuit to collapse faults for
    network: PathBuf,

    /// Output file for the collapsing graph
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Record dominance edges as well
    #[arg(long)]
    dominance: bool,
}

impl CollapseArgs {
    /// Run the collapse command
    pub fn run(&self) {
        let circuit = unwrap_or_fail(read_circuit_file(&self.network));
        let faults = Fault::all(&circuit);
        let graph = collapse_circuit(&circuit, &faults, self.dominance);
        println!(
            "Collapsed {} faults into {} equivalence nodes",
            faults.len(),
            graph.nb_nodes()
        );
        unwrap_or_fail(write_graph_file(&self.output, &circuit, &graph));
    }
}
