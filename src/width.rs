//! The novelty classification tag attached to `SearchNode`s, and the
//! strategy enums referenced throughout `sbfws::heuristic`.

use strum_macros::Display;

/// Classification of a node's novelty with respect to some partitioned set
/// of tables (`w_g` or `w_gr`).
///
/// Order is `One < Two < GTTwo` and `One < GTOne`; `GTOne` and `Two`/`GTTwo`
/// are not comparable in a meaningful way beyond that (a node is only ever
/// compared against others evaluated through the same sequence of levels),
/// so a manual `Ord` is provided rather than relying on declaration order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthTag {
    /// Not yet evaluated.
    Unknown,
    /// Novelty 1 with respect to the relevant table.
    One,
    /// Evaluated at level 1 only, and found not to have novelty 1.
    GTOne,
    /// Novelty 2 with respect to the relevant table (implies not novelty 1).
    Two,
    /// Evaluated at level 2, and found to have novelty greater than 2.
    GTTwo,
}

impl WidthTag {
    fn rank(self) -> u8 {
        match self {
            WidthTag::One => 0,
            WidthTag::Two => 1,
            WidthTag::GTTwo => 2,
            WidthTag::GTOne => 1,
            WidthTag::Unknown => 3,
        }
    }
}

impl PartialOrd for WidthTag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WidthTag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Strategy used by [`crate::sbfws::SbfwsHeuristic`] to compute `#r`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelevantSetStrategy {
    /// `#r` is always 0 and the `(#g, #r)` queues are effectively disabled.
    None,
    /// Delegate to the L0 numeric-landmark heuristic.
    L0,
    /// Delegate to the L2-norm geodesic index.
    G0,
    /// Compute `#r` via an inner IW simulation (the default).
    #[default]
    Simulation,
}

/// Strategy used by [`crate::sbfws::SbfwsHeuristic::compute_r`] to decide
/// when a node's `RelevantAtomSet` must be recomputed from scratch (via a
/// fresh IW simulation) rather than inherited from its parent.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum RComputation {
    /// Recompute only for the root (seed) node of a search.
    Seed,
    /// Recompute for the root, or for any node that strictly decreases #g
    /// relative to its parent (the default).
    #[default]
    SeedAndGDecreasers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_spec() {
        assert!(WidthTag::One < WidthTag::Two);
        assert!(WidthTag::Two < WidthTag::GTTwo);
        assert!(WidthTag::One < WidthTag::GTOne);
    }
}
