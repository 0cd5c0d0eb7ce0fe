//! Basic-block partitioning and cost accumulation.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::cost::{COST_ALU, instruction_cost};
use crate::listing::{Line, listing_lines};

/// Label the code printer never emits; used for instructions that appear
/// before the first block marker.
const ENTRY_LABEL: &str = "<entry>";

/// Per-block accumulated costs, in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockCosts {
    entries: Vec<(String, u32)>,
}

impl BlockCosts {
    /// Open a new block at cost zero. The printer emits each marker exactly
    /// once, so labels are not deduplicated.
    fn open(&mut self, label: &str) {
        self.entries.push((label.to_string(), 0));
    }

    /// Add cost to the most recently opened block, opening the synthetic
    /// entry block if no marker has been seen yet.
    fn add(&mut self, cost: u32) {
        if self.entries.is_empty() {
            self.open(ENTRY_LABEL);
        }
        if let Some(last) = self.entries.last_mut() {
            last.1 += cost;
        }
    }

    /// Cost of a block by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, cost)| *cost)
    }

    /// Blocks in appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, cost)| (name.as_str(), *cost))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total cost across all blocks.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, cost)| cost).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for BlockCosts {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(s, c)| (s.into(), c)).collect(),
        }
    }
}

/// Runs the cost table over disassembly text.
///
/// Unknown mnemonics are costed at one ALU unit and collected so the table
/// can be extended later; the vocabulary across two backends is open-ended
/// and a closed table is inherently incomplete.
#[derive(Debug, Default)]
pub struct CostModel {
    unknown: FxHashSet<String>,
}

impl CostModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition `asm` into basic blocks and accumulate per-block cost.
    ///
    /// Pure with respect to the input text: the same dump always yields the
    /// same map. The unknown-mnemonic set is the only state carried across
    /// calls.
    pub fn block_costs(&mut self, asm: &str) -> BlockCosts {
        let mut costs = BlockCosts::default();

        for line in listing_lines(asm) {
            match line {
                Line::BlockMarker(label) => costs.open(label),
                Line::Instruction { mnemonic, operands } => {
                    let cost = instruction_cost(mnemonic, operands).unwrap_or_else(|| {
                        if self.unknown.insert(mnemonic.to_string()) {
                            debug!(mnemonic, "unrecognized mnemonic, assuming ALU cost");
                        }
                        COST_ALU
                    });
                    costs.add(cost);
                }
            }
        }

        costs
    }

    /// Mnemonics seen so far that the cost table does not know.
    pub fn unknown_mnemonics(&self) -> impl Iterator<Item = &str> {
        self.unknown.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
Instructions (size = 32)
--block1--
0x10    2a93  add a0, a1, a2
0x14    2a94  add a0, a0, a3
0x18    2a95  sw a0, 0(sp)
--block2--
0x1c    2a96  beq a0, a1, 8
";

    #[test]
    fn test_block_partitioning() {
        let costs = CostModel::new().block_costs(DUMP);
        let expect: BlockCosts = [("--block1--", 4), ("--block2--", 3)].into_iter().collect();
        assert_eq!(costs, expect);
    }

    #[test]
    fn test_appearance_order_preserved() {
        let costs = CostModel::new().block_costs(DUMP);
        let labels: Vec<&str> = costs.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["--block1--", "--block2--"]);
    }

    #[test]
    fn test_idempotent() {
        let mut model = CostModel::new();
        assert_eq!(model.block_costs(DUMP), model.block_costs(DUMP));
    }

    #[test]
    fn test_unknown_mnemonic_default_cost() {
        let dump = "Instructions\n--b--\n0x10 2a93 vfrobnicate v0, v1\n";
        let mut model = CostModel::new();
        let costs = model.block_costs(dump);
        assert_eq!(costs.get("--b--"), Some(COST_ALU));
        let unknown: Vec<&str> = model.unknown_mnemonics().collect();
        assert_eq!(unknown, vec!["vfrobnicate"]);
    }

    #[test]
    fn test_instructions_before_first_marker() {
        let dump = "Instructions\n0x10 2a93 add a0, a1, a2\n--b--\n0x14 8082 ret\n";
        let costs = CostModel::new().block_costs(dump);
        assert_eq!(costs.get("<entry>"), Some(1));
        assert_eq!(costs.get("--b--"), Some(2));
    }

    #[test]
    fn test_empty_dump() {
        let costs = CostModel::new().block_costs("no listing here\n");
        assert!(costs.is_empty());
        assert_eq!(costs.total(), 0);
    }
}
