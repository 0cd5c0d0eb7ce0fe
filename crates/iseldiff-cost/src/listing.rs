//! Extraction of the instruction listing from raw code-printer output.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

/// A classified line inside the instruction listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// Block boundary marker, e.g. `--- B1 ---`; carries the full label.
    BlockMarker(&'a str),
    /// Instruction line: mnemonic plus its operand text.
    Instruction { mnemonic: &'a str, operands: &'a str },
}

static INSTR_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Parse an instruction line: hex address, raw encoding, mnemonic, operands.
fn parse_instruction(line: &str) -> Option<Line<'_>> {
    let re = INSTR_PATTERN.get_or_init(|| {
        Regex::new(r"^0x[0-9a-fA-F]+\s+[0-9a-fA-F]+\s+(\S+)\s*(.*)$").unwrap()
    });
    let caps = re.captures(line)?;
    let mnemonic = caps.get(1)?.as_str();
    let operands = caps.get(2).map_or("", |m| m.as_str());
    Some(Line::Instruction { mnemonic, operands })
}

/// Iterate over the usable lines of a disassembly dump.
///
/// Everything before the `Instructions` header is skipped. Inside the
/// listing, a blank line ends it - the printer separates the instruction
/// region from relocation/safepoint tables with an empty line. Lines that
/// are neither block markers nor well-formed instruction lines are dropped;
/// malformed instruction text is a tool mismatch, not a fatal condition.
pub fn listing_lines(asm: &str) -> Vec<Line<'_>> {
    let mut in_listing = false;
    let mut lines = Vec::new();

    for raw in asm.lines() {
        if !in_listing {
            if raw.starts_with("Instructions") {
                in_listing = true;
            }
            continue;
        }

        let line = raw.trim();
        if line.is_empty() {
            break;
        }

        if line.starts_with("--") {
            lines.push(Line::BlockMarker(line));
        } else if line.starts_with("0x") {
            match parse_instruction(line) {
                Some(parsed) => lines.push(parsed),
                None => trace!(line, "skipping malformed instruction line"),
            }
        }
        // Anything else: comments, headers, padding. Ignored.
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
kind = TURBOFAN
Instructions (size = 24)
--- prologue ---
0x2b5180004000    2a93  add a3, a4, a5
0x2b5180004004    2a97  sw a3, 0(sp)
;; some comment line
--- body ---
0x2b5180004008    2a9b  beq a3, a4, 8

Safepoints (size = 8)
0x2b518000400c    dead  this is past the listing
";

    #[test]
    fn test_listing_extraction() {
        let lines = listing_lines(DUMP);
        assert_eq!(
            lines,
            vec![
                Line::BlockMarker("--- prologue ---"),
                Line::Instruction { mnemonic: "add", operands: "a3, a4, a5" },
                Line::Instruction { mnemonic: "sw", operands: "a3, 0(sp)" },
                Line::BlockMarker("--- body ---"),
                Line::Instruction { mnemonic: "beq", operands: "a3, a4, 8" },
            ]
        );
    }

    #[test]
    fn test_blank_line_terminates_listing() {
        let lines = listing_lines(DUMP);
        assert!(!lines.iter().any(|l| matches!(
            l,
            Line::Instruction { mnemonic: "dead", .. }
        )));
    }

    #[test]
    fn test_nothing_before_header() {
        let lines = listing_lines("0x1000 2a93 add a0, a1, a2\n--- B0 ---\n");
        assert!(lines.is_empty());
    }

    #[test]
    fn test_malformed_address_skipped() {
        let dump = "Instructions\n0xZZZZ nonsense\n0x10 2a93 nop\n";
        let lines = listing_lines(dump);
        assert_eq!(
            lines,
            vec![Line::Instruction { mnemonic: "nop", operands: "" }]
        );
    }

    #[test]
    fn test_instruction_without_operands() {
        let lines = listing_lines("Instructions\n0x10 8082 ret\n");
        assert_eq!(
            lines,
            vec![Line::Instruction { mnemonic: "ret", operands: "" }]
        );
    }
}
