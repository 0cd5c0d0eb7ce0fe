//! Divergence scoring between two block-cost maps.

use tracing::warn;

use crate::blocks::BlockCosts;

/// Asymmetric clamped divergence of `a` over `b`.
///
/// Sums `max(cost_a - cost_b, 0)` over the blocks of `a`: only blocks where
/// `a` is strictly worse contribute, so improvements elsewhere in the same
/// program cannot mask a regression. A positive score marks the pair as
/// interesting.
///
/// Both maps are assumed to carry the same labels in the same order - the
/// backends are expected to preserve block structure for the same input. If
/// a label of `a` is missing from `b` that assumption broke; the block is
/// scored zero and a warning is logged rather than guessing an alignment.
#[must_use]
pub fn divergence(a: &BlockCosts, b: &BlockCosts) -> u32 {
    let mut total = 0;
    for (label, cost_a) in a.iter() {
        match b.get(label) {
            Some(cost_b) => total += cost_a.saturating_sub(cost_b),
            None => warn!(label, "block missing from other backend, skipping"),
        }
    }
    total
}
