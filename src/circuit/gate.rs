use std::fmt;

use crate::circuit::circuit::Circuit;

/// Types of gates in the circuit model
///
/// Fanout branches are explicit gates: a net driving more than one sink is
/// split at load time into a stem plus one `Fanout` gate per sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Primary input
    Input,
    /// N-input And gate
    And,
    /// N-input Or gate
    Or,
    /// N-input Nand gate
    Nand,
    /// N-input Nor gate
    Nor,
    /// N-input Xor gate
    Xor,
    /// N-input Xnor gate
    Xnor,
    /// Inverter
    Not,
    /// Buffer
    Buff,
    /// Explicit fanout branch, forwarding the stem value to a single sink
    Fanout,
}

impl GateKind {
    /// Returns whether the gate is And, Or, Nand or Nor
    pub fn is_and_like(self) -> bool {
        matches!(
            self,
            GateKind::And | GateKind::Or | GateKind::Nand | GateKind::Nor
        )
    }

    /// Returns whether the gate is Xor or Xnor
    pub fn is_xor_like(self) -> bool {
        matches!(self, GateKind::Xor | GateKind::Xnor)
    }

    /// Returns whether the gate inverts its result (Nand, Nor, Not, Xnor)
    pub fn inverts(self) -> bool {
        matches!(
            self,
            GateKind::Nand | GateKind::Nor | GateKind::Not | GateKind::Xnor
        )
    }

    /// The input value that alone determines the output, for And-like gates
    pub fn controlling_input(self) -> Option<bool> {
        match self {
            GateKind::And | GateKind::Nand => Some(false),
            GateKind::Or | GateKind::Nor => Some(true),
            _ => None,
        }
    }

    /// The output produced when some input holds the controlling value
    pub fn controlling_output(self) -> Option<bool> {
        self.controlling_input().map(|c| c ^ self.inverts())
    }

    /// Parse a gate kind as spelled in .bench files
    pub fn from_name(name: &str) -> Option<GateKind> {
        match name.to_uppercase().as_str() {
            "AND" => Some(GateKind::And),
            "OR" => Some(GateKind::Or),
            "NAND" => Some(GateKind::Nand),
            "NOR" => Some(GateKind::Nor),
            "XOR" => Some(GateKind::Xor),
            "XNOR" => Some(GateKind::Xnor),
            "NOT" => Some(GateKind::Not),
            "BUF" | "BUFF" => Some(GateKind::Buff),
            _ => None,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateKind::Input => "INPUT",
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Not => "NOT",
            GateKind::Buff => "BUFF",
            GateKind::Fanout => "FANOUT",
        };
        write!(f, "{}", s)
    }
}

/// Logic values of the 6-valued D-calculus
///
/// `D` stands for a point that is 1 in the fault-free circuit but 0 in the
/// faulty one; `DBar` is its complement. `Unset` marks a value that was never
/// assigned, as opposed to `X` which was explicitly left unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    /// Never assigned
    Unset,
    /// Logic 0 in both the fault-free and the faulty circuit
    Zero,
    /// Logic 1 in both the fault-free and the faulty circuit
    One,
    /// 1 fault-free, 0 faulty
    D,
    /// 0 fault-free, 1 faulty
    DBar,
    /// Unknown
    X,
}

impl Logic {
    /// Convert a plain boolean to a logic value
    pub fn from_bool(b: bool) -> Logic {
        if b {
            Logic::One
        } else {
            Logic::Zero
        }
    }

    /// Complement of the value, with D and D' swapped
    pub fn invert(self) -> Logic {
        match self {
            Logic::Zero => Logic::One,
            Logic::One => Logic::Zero,
            Logic::D => Logic::DBar,
            Logic::DBar => Logic::D,
            v => v,
        }
    }

    /// Returns whether the value is a plain 0 or 1
    pub fn is_binary(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Returns whether the value is unknown or never assigned
    pub fn is_unknown(self) -> bool {
        matches!(self, Logic::X | Logic::Unset)
    }

    /// Returns whether the value carries a fault effect (D or D')
    pub fn is_fault_effect(self) -> bool {
        matches!(self, Logic::D | Logic::DBar)
    }

    /// Decompose into (fault-free, faulty) booleans; None for X and Unset
    pub fn good_bad(self) -> Option<(bool, bool)> {
        match self {
            Logic::Zero => Some((false, false)),
            Logic::One => Some((true, true)),
            Logic::D => Some((true, false)),
            Logic::DBar => Some((false, true)),
            _ => None,
        }
    }

    /// Re-encode a (fault-free, faulty) pair as a logic value
    pub fn from_good_bad(good: bool, bad: bool) -> Logic {
        match (good, bad) {
            (false, false) => Logic::Zero,
            (true, true) => Logic::One,
            (true, false) => Logic::D,
            (false, true) => Logic::DBar,
        }
    }

    /// Character used when printing a primary input value in a test pattern
    ///
    /// D prints as the fault-free value 1, D' as 0.
    pub fn pattern_char(self) -> char {
        match self {
            Logic::Zero | Logic::DBar => '0',
            Logic::One | Logic::D => '1',
            Logic::Unset => 'U',
            Logic::X => 'X',
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Logic::Unset => "U",
            Logic::Zero => "0",
            Logic::One => "1",
            Logic::D => "D",
            Logic::DBar => "D'",
            Logic::X => "X",
        };
        write!(f, "{}", s)
    }
}

/// Stuck-at polarity of a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StuckAt {
    /// Output stuck at logic 0
    Zero,
    /// Output stuck at logic 1
    One,
}

impl StuckAt {
    /// Parse the integer fault code used in fault-list files (0 or 1)
    pub fn from_code(code: u32) -> Option<StuckAt> {
        match code {
            0 => Some(StuckAt::Zero),
            1 => Some(StuckAt::One),
            _ => None,
        }
    }

    /// The value the fault site must be driven to in order to excite the fault
    pub fn activation(self) -> bool {
        match self {
            StuckAt::Zero => true,
            StuckAt::One => false,
        }
    }

    /// The opposite polarity
    pub fn opposite(self) -> StuckAt {
        match self {
            StuckAt::Zero => StuckAt::One,
            StuckAt::One => StuckAt::Zero,
        }
    }
}

impl fmt::Display for StuckAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StuckAt::Zero => write!(f, "0"),
            StuckAt::One => write!(f, "1"),
        }
    }
}

/// A single stuck-at fault, located on the output of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fault {
    /// Index of the gate whose output carries the fault
    pub gate: usize,
    /// Stuck-at polarity
    pub stuck: StuckAt,
}

impl Fault {
    /// Create a fault on the output of the given gate
    pub fn new(gate: usize, stuck: StuckAt) -> Fault {
        Fault { gate, stuck }
    }

    /// All possible output stuck-at faults of a circuit, in stable gate order
    pub fn all(circuit: &Circuit) -> Vec<Fault> {
        let mut ret = Vec::new();
        for gate in 0..circuit.nb_gates() {
            ret.push(Fault::new(gate, StuckAt::Zero));
            ret.push(Fault::new(gate, StuckAt::One));
        }
        ret
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gate {} stuck at {}", self.gate, self.stuck)
    }
}

/// A gate of the circuit: identity, connectivity and topological depth
///
/// Values and fault annotations are deliberately not stored here; they live
/// in the per-attempt simulation state.
#[derive(Debug, Clone)]
pub struct Gate {
    /// Name of the gate's output net
    pub name: String,
    /// Kind of the gate
    pub kind: GateKind,
    /// Fan-in gates, in input order
    pub inputs: Vec<usize>,
    /// Fan-out gates
    pub outputs: Vec<usize>,
    /// Largest number of gates on any path from a primary input; 0 for inputs
    pub depth: u32,
}

impl Gate {
    pub(crate) fn new(name: String, kind: GateKind, inputs: Vec<usize>) -> Gate {
        Gate {
            name,
            kind,
            inputs,
            outputs: Vec::new(),
            depth: 0,
        }
    }
}
