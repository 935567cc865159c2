//! Test pattern output, one line per processed fault

use std::io::{self, Write};

use crate::atpg::FaultReport;

/// Write the generated patterns in processing order
///
/// Each line holds one character per primary input: `0`, `1`, `U` for an
/// input the search never assigned, `X` for an explicit unknown. Faults
/// proven undetectable print `none found` instead.
pub fn write_patterns<W: Write>(w: &mut W, reports: &[FaultReport]) -> io::Result<()> {
    for r in reports {
        match &r.pattern {
            Some(p) => {
                let line: String = p.iter().map(|v| v.pattern_char()).collect();
                writeln!(w, "{}", line)?;
            }
            None => writeln!(w, "none found")?,
        }
    }
    Ok(())
}
