//! Convex piecewise-linear cost evaluation.
//!
//! A device offers its energy as an ordered list of blocks, each with a width
//! and a marginal price. Dispatch fills the blocks in order:
//!
//! ```text
//! cost(p) = Σ_b c_b · min(w_b, max(0, p − Σ_{b' < b} w_b'))
//! ```
//!
//! Dispatch beyond the total offered width is priced at the last block's
//! marginal cost. Non-positive dispatch costs nothing.

use gridscore_core::CostBlock;

pub fn piecewise_convex_cost(blocks: &[CostBlock], p: f64) -> f64 {
    let mut remaining = p;
    let mut cost = 0.0;
    for block in blocks {
        if remaining <= 0.0 {
            return cost;
        }
        let used = remaining.min(block.p_max);
        cost += block.cost * used;
        remaining -= used;
    }
    if remaining > 0.0 {
        if let Some(last) = blocks.last() {
            cost += last.cost * remaining;
        }
    }
    cost
}
