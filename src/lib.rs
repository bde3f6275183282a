#![warn(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unit_bindings)]
#![warn(unused_qualifications)]

// Crate dependencies used in tests but not in the library proper. Unfortunately
// cargo does not yet allow specifying dependencies for tests only.
#[cfg(test)]
use assert_approx_eq as _;
#[cfg(test)]
use serial_test as _;

pub mod error;
pub mod globals;
pub mod iw;
pub mod model;
pub mod novelty;
pub mod sbfws;
pub mod stats;
#[cfg(test)]
mod test_utils;
pub mod trace;
pub mod width;

pub use error::SearchError;
pub use globals::{GlobalSearchConfig, ZccGuard};
pub use iw::{IwConfig, IwEngine, IwOutcome, IwRunStats, SimulationNode};
pub use model::{FeatureSet, FeatureVector, RewardFunction, StateModel};
pub use sbfws::{
    AtomsetHelper, NoveltyIndexer, RelevantAtomSet, SbfwsConfig, SbfwsEngine, SbfwsHeuristic,
    SbfwsHeuristicConfig, SbfwsOutcome, SearchNode,
};
pub use stats::BfwsStats;
pub use trace::{SearchTrace, VisitedNode, IW_TRACE_FILE, SBFWS_TRACE_FILE};
pub use width::WidthTag;
