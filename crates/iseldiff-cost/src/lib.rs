//! Static per-basic-block cost model over printed disassembly.
//!
//! Takes the raw `--print-code` output of a backend, extracts the
//! instruction listing, partitions it into basic blocks by the `--`-prefixed
//! block markers the code printer emits, and accumulates a static cost per
//! block from a per-mnemonic cost table. The result feeds the asymmetric
//! divergence score that decides whether two backends' outputs differ enough
//! to be interesting.

mod blocks;
mod compare;
mod cost;
mod listing;

pub use blocks::{BlockCosts, CostModel};
pub use compare::divergence;
pub use cost::{COST_ALU, COST_BRANCH, COST_CALL, COST_DIV, COST_LOAD_STORE, instruction_cost};
pub use listing::{Line, listing_lines};
