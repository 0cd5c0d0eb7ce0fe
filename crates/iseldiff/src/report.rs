//! Case artifact formatting and persistence.
//!
//! A flagged case is written once and never mutated: a `[scenario]` block
//! with the exact reproduction command, the per-block cost table, the
//! generated source, and both full disassembly dumps under labeled headings.

use std::fmt::Write as _;
use std::path::Path;

use iseldiff_cost::BlockCosts;
use iseldiff_v8::Invoker;

/// Strip the marker dashes off a block label for display.
fn display_label(label: &str) -> &str {
    label.trim_matches('-').trim()
}

/// Render the per-block cost comparison as a pipe table.
///
/// Iterates the blocks of `a`; a label absent from `b` renders a `-` cell
/// (broken block alignment is reported by the comparator, not here).
#[must_use]
pub fn cost_table(name_a: &str, name_b: &str, a: &BlockCosts, b: &BlockCosts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "| Basic Block | {name_a} cost | {name_b} cost | Difference |");
    let _ = writeln!(out, "|-------------|------|------|------|");
    for (label, cost_a) in a.iter() {
        match b.get(label) {
            Some(cost_b) => {
                let diff = i64::from(cost_a) - i64::from(cost_b);
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {:+} |",
                    display_label(label),
                    cost_a,
                    cost_b,
                    diff
                );
            }
            None => {
                let _ = writeln!(out, "| {} | {} | - | - |", display_label(label), cost_a);
            }
        }
    }
    out
}

/// The `[scenario]` reproduction descriptor.
#[must_use]
pub fn scenario(case_id: &str, source: &Path, invoker_a: &Invoker, invoker_b: &Invoker) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[scenario]");
    let _ = writeln!(out, "case = {case_id}");
    let _ = writeln!(out, "source = {}", source.display());
    let _ = writeln!(out, "backend_a = {}", invoker_a.backend());
    let _ = writeln!(out, "backend_b = {}", invoker_b.backend());
    let _ = writeln!(out, "run_command_a = {}", invoker_a.repro_command(source));
    let _ = writeln!(out, "run_command_b = {}", invoker_b.repro_command(source));
    out
}

/// Full report for a cost-divergence finding.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn divergence_report(
    scenario: &str,
    score: u32,
    table: &str,
    source_text: &str,
    name_a: &str,
    asm_a: &str,
    name_b: &str,
    asm_b: &str,
) -> String {
    let mut out = String::new();
    out.push_str(scenario);
    let _ = writeln!(out, "\ndivergence score: {score}\n");
    out.push_str(table);
    let _ = writeln!(out, "\n### Source:\n{source_text}");
    let _ = writeln!(out, "\n### {name_a}:\n{asm_a}");
    let _ = writeln!(out, "\n### {name_b}:\n{asm_b}");
    out
}

/// Report for a backend that crashed or exited non-zero.
#[must_use]
pub fn crash_report(scenario: &str, source_text: &str, failure: &str) -> String {
    let mut out = String::new();
    out.push_str(scenario);
    let _ = writeln!(out, "\n### Failure:\n{failure}");
    let _ = writeln!(out, "\n### Source:\n{source_text}");
    out
}
