//! Simulated Best-First Width Search (§4.3-4.4): the heuristic that scores
//! nodes and the multi-queue engine that drives the search loop.

mod engine;
mod heuristic;
mod node;
mod queues;

pub use engine::{SbfwsConfig, SbfwsEngine, SbfwsOutcome};
pub use heuristic::{NoveltyIndexer, SbfwsHeuristic, SbfwsHeuristicConfig};
pub use node::{AtomsetHelper, RelevantAtomSet, SearchNode};
