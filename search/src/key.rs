//! Two-component priority key.
//!
//! Keys order lexicographically: `first`, then `second`. The comparison
//! operators (`lt`, `le`, `eq`, `ge`, `gt`) come from `Ord`/`PartialOrd`, so
//! `a.lt(&b)` and `a < b` are the same O(1) test.
//!
//! Components are never NaN: every cost entering the planner is validated and
//! heuristics are required to be finite, so `min(g, rhs) + h + offset` is either
//! a non-negative real or `+infinity`. `f64::total_cmp` therefore agrees with
//! numeric comparison on every key the engine can produce.

use std::cmp::Ordering;

use replan_kernel::cost::{Cost, INFINITE_COST};

/// Priority of a node in the open list.
///
/// `first` is the estimated total path cost under the current heuristic frame
/// (including the drift offset); `second` is the tie-breaking path cost.
#[derive(Debug, Clone, Copy)]
pub struct PriorityKey {
    pub first: Cost,
    pub second: Cost,
}

impl PriorityKey {
    /// Key that sorts after every finite key; the implicit top of an empty queue.
    pub const INFINITE: Self = Self {
        first: INFINITE_COST,
        second: INFINITE_COST,
    };

    #[must_use]
    pub const fn new(first: Cost, second: Cost) -> Self {
        Self { first, second }
    }
}

impl PartialEq for PriorityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityKey {}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.first
            .total_cmp(&other.first)
            .then_with(|| self.second.total_cmp(&other.second))
    }
}

impl std::fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}; {}]", self.first, self.second)
    }
}
