//! In-memory trace documents for `log_search`-enabled runs.
//!
//! Grounded on `original_source/.../iw.hxx`'s `IW::report`, which builds a
//! `rapidjson::Document` out of `_visited` and `_optimal_paths` and writes it
//! to `mv_iw_run.json`, and on `SBFWS::search`'s analogous
//! `dump_search_tree(..., "bfws.lookahead.json")` call. Building the document
//! is this crate's job; writing it to a file (or anywhere else) is left to
//! the host, via whatever `serde_json` writer it prefers.

use serde::Serialize;
use std::rc::Rc;

use crate::iw::SimulationNode;
use crate::sbfws::SearchNode as BfwsNode;

/// Default file name used by the original IW simulation dump.
pub const IW_TRACE_FILE: &str = "mv_iw_run.json";
/// Default file name used by the original SBFWS search-tree dump.
pub const SBFWS_TRACE_FILE: &str = "bfws.lookahead.json";

/// One generated node, as recorded in a trace's `visited` list.
#[derive(Debug, Clone, Serialize)]
pub struct VisitedNode<S> {
    pub state: S,
    pub gen_order: u32,
}

/// A search run's trace: every node generated (if `log_search` was set), and
/// the root-to-leaf path of each noteworthy terminal node (the per-subgoal
/// first-satisfier paths for an IW run, or the single solution path for an
/// SBFWS run). Paths are stored leaf-first, matching the order the original
/// dump produces by walking `parent` pointers from each path's end.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchTrace<S> {
    pub visited: Vec<VisitedNode<S>>,
    pub paths: Vec<Vec<S>>,
}

impl<S> SearchTrace<S> {
    fn new() -> Self {
        Self {
            visited: Vec::new(),
            paths: Vec::new(),
        }
    }
}

fn path_to_root<S: Clone, A>(leaf: &Rc<SimulationNode<S, A>>) -> Vec<S> {
    let mut path = Vec::new();
    let mut node = Rc::clone(leaf);
    loop {
        path.push(node.state.clone());
        match node.parent.clone() {
            Some(parent) => node = parent,
            None => break,
        }
    }
    path
}

fn bfws_path_to_root<S: Clone, A>(leaf: &Rc<BfwsNode<S, A>>) -> Vec<S> {
    let mut path = Vec::new();
    let mut node = Rc::clone(leaf);
    loop {
        path.push(node.state.clone());
        match node.parent.clone() {
            Some(parent) => node = parent,
            None => break,
        }
    }
    path
}

/// Builds the trace document for one [`crate::iw::IwEngine::search`] run.
pub fn iw_trace<S: Clone, A>(
    visited: &[Rc<SimulationNode<S, A>>],
    optimal_paths: &[Option<Rc<SimulationNode<S, A>>>],
) -> SearchTrace<S> {
    let mut trace = SearchTrace::new();
    for node in visited {
        trace.visited.push(VisitedNode {
            state: node.state.clone(),
            gen_order: node.gen_order,
        });
    }
    for path_end in optimal_paths.iter().flatten() {
        trace.paths.push(path_to_root(path_end));
    }
    trace
}

/// Builds the trace document for one [`crate::sbfws::SbfwsEngine::search`]
/// run. SBFWS has no per-subgoal optimal paths to dump, only the single
/// solution (if any), so `paths` holds at most one entry.
pub fn sbfws_trace<S: Clone, A>(
    visited: &[Rc<BfwsNode<S, A>>],
    solution: Option<&Rc<BfwsNode<S, A>>>,
) -> SearchTrace<S> {
    let mut trace = SearchTrace::new();
    for node in visited {
        trace.visited.push(VisitedNode {
            state: node.state.clone(),
            gen_order: node.gen_order,
        });
    }
    if let Some(solution) = solution {
        trace.paths.push(bfws_path_to_root(solution));
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iw_trace_collects_visited_and_paths() {
        let root = SimulationNode::<&str, u32>::root("s0", 1);
        let child = SimulationNode::child("s1", 7u32, &root, 2);
        let visited = vec![Rc::clone(&root), Rc::clone(&child)];
        let optimal_paths = vec![None, Some(Rc::clone(&child))];

        let trace = iw_trace(&visited, &optimal_paths);
        assert_eq!(trace.visited.len(), 2);
        assert_eq!(trace.paths.len(), 1);
        assert_eq!(trace.paths[0], vec!["s1", "s0"]);
    }

    #[test]
    fn sbfws_trace_without_solution_has_no_paths() {
        let root = BfwsNode::<&str, u32>::root("s0", 1);
        let visited = vec![Rc::clone(&root)];
        let trace = sbfws_trace(&visited, None);
        assert_eq!(trace.visited.len(), 1);
        assert!(trace.paths.is_empty());
    }
}
