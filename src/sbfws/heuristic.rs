//! Per-node evaluation for SBFWS (§4.3): `#g`, `#r`, and the two novelty
//! classifications `w_g` and `w_gr`.
//!
//! Grounded on `original_source/.../sbfws.hxx`'s `SBFWSHeuristic`. The three
//! auxiliary black-box heuristics (`UnsatGoalAtomsHeuristic`, `L0Heuristic`,
//! `L2Norm`) are accepted as trait objects rather than extra generic type
//! parameters, since they are genuinely optional and swappable at
//! construction time — unlike the state model and feature set, which are
//! the performance-critical generic core.

use crate::model::{FeatureSet, L0Heuristic, L2NormHeuristic, StateModel, UnsatGoalHeuristic};
use crate::novelty::{NoveltyFactory, NoveltyOracle, INFINITE_NOVELTY};
use crate::stats::BfwsStats;
use crate::width::{RComputation, RelevantSetStrategy, WidthTag};
use crate::iw::{IwConfig, IwEngine};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::node::{AtomsetHelper, RelevantAtomSet, SearchNode};

/// Packs `(#g, #r)` into a single key used to partition the `w_gr` novelty
/// tables. Mirrors `SBFWSNoveltyIndexer` from the original, which the
/// comment there calls "a hackish way to obtain an integer index".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoveltyIndexer;

impl NoveltyIndexer {
    pub fn index(&self, unachieved: u32, relaxed_achieved: u32) -> u64 {
        (u64::from(unachieved) << 32) | u64::from(relaxed_achieved)
    }
}

/// Static configuration for [`SbfwsHeuristic`].
#[derive(Debug, Clone)]
pub struct SbfwsHeuristicConfig {
    pub simulation_width: u32,
    pub complete_simulation: bool,
    pub relevant_set_type: RelevantSetStrategy,
    pub r_computation: RComputation,
}

impl Default for SbfwsHeuristicConfig {
    fn default() -> Self {
        Self {
            simulation_width: 1,
            complete_simulation: false,
            relevant_set_type: RelevantSetStrategy::Simulation,
            r_computation: RComputation::SeedAndGDecreasers,
        }
    }
}

/// Evaluates `SearchNode`s on behalf of [`crate::sbfws::SbfwsEngine`].
pub struct SbfwsHeuristic<'m, M: StateModel, F> {
    model: &'m M,
    features: &'m F,
    unsat_heuristic: &'m dyn UnsatGoalHeuristic<M::State>,
    l0_heuristic: Option<&'m dyn L0Heuristic<M::State>>,
    l2_heuristic: Option<&'m dyn L2NormHeuristic<M::State>>,
    indexer: NoveltyIndexer,
    config: SbfwsHeuristicConfig,
    wg_evaluators: RefCell<HashMap<(u32, u64), NoveltyOracle>>,
    wgr_evaluators: RefCell<HashMap<(u32, u64), NoveltyOracle>>,
    stats: Rc<RefCell<BfwsStats>>,
}

impl<'m, M, F> SbfwsHeuristic<'m, M, F>
where
    M: StateModel,
    F: FeatureSet<M::State>,
{
    pub fn new(
        model: &'m M,
        features: &'m F,
        unsat_heuristic: &'m dyn UnsatGoalHeuristic<M::State>,
        l0_heuristic: Option<&'m dyn L0Heuristic<M::State>>,
        l2_heuristic: Option<&'m dyn L2NormHeuristic<M::State>>,
        config: SbfwsHeuristicConfig,
        stats: Rc<RefCell<BfwsStats>>,
    ) -> Self {
        Self {
            model,
            features,
            unsat_heuristic,
            l0_heuristic,
            l2_heuristic,
            indexer: NoveltyIndexer,
            config,
            wg_evaluators: RefCell::new(HashMap::new()),
            wgr_evaluators: RefCell::new(HashMap::new()),
            stats,
        }
    }

    pub fn reset(&self) {
        for evaluator in self.wg_evaluators.borrow_mut().values_mut() {
            evaluator.reset();
        }
        for evaluator in self.wgr_evaluators.borrow_mut().values_mut() {
            evaluator.reset();
        }
    }

    pub fn compute_unachieved(&self, state: &M::State) -> u32 {
        self.unsat_heuristic.evaluate(state)
    }

    pub fn evaluate_wg1(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> u32 {
        let ptype = node.parent.as_ref().map_or(0, |p| u64::from(p.unachieved_subgoals()));
        let nov = self.evaluate_novelty(&self.wg_evaluators, 1, u64::from(node.unachieved_subgoals()), ptype, node);
        node.set_w_g(if nov == 1 { WidthTag::One } else { WidthTag::GTOne });
        nov
    }

    pub fn evaluate_wg2(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> u32 {
        let ptype = node.parent.as_ref().map_or(0, |p| u64::from(p.unachieved_subgoals()));
        let nov = self.evaluate_novelty(&self.wg_evaluators, 2, u64::from(node.unachieved_subgoals()), ptype, node);
        if node.w_g() != WidthTag::One {
            node.set_w_g(if nov == 2 { WidthTag::Two } else { WidthTag::GTTwo });
        }
        nov
    }

    pub fn evaluate_wgr1(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> u32 {
        if self.config.relevant_set_type == RelevantSetStrategy::None {
            node.set_w_gr(WidthTag::GTOne);
            return INFINITE_NOVELTY;
        }
        let type_ = self.compute_node_complex_type(node);
        let ptype = node
            .parent
            .as_ref()
            .map_or(0, |p| self.compute_node_complex_type(p));
        let nov = self.evaluate_novelty(&self.wgr_evaluators, 1, type_, ptype, node);
        node.set_w_gr(if nov == 1 { WidthTag::One } else { WidthTag::GTOne });
        nov
    }

    pub fn evaluate_wgr2(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> u32 {
        let type_ = self.compute_node_complex_type(node);
        let ptype = node
            .parent
            .as_ref()
            .map_or(0, |p| self.compute_node_complex_type(p));
        let nov = self.evaluate_novelty(&self.wgr_evaluators, 2, type_, ptype, node);
        if node.w_gr() != WidthTag::One {
            node.set_w_gr(if nov == 2 { WidthTag::Two } else { WidthTag::GTTwo });
        }
        nov
    }

    fn compute_node_complex_type(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> u64 {
        self.indexer.index(node.unachieved_subgoals(), self.hash_r(node))
    }

    fn hash_r(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> u32 {
        let value = match self.config.relevant_set_type {
            RelevantSetStrategy::None => 0,
            RelevantSetStrategy::L0 => self
                .l0_heuristic
                .expect("L0 relevant-set strategy requires an L0 heuristic")
                .evaluate(&node.state),
            RelevantSetStrategy::G0 => self
                .l2_heuristic
                .expect("G0 relevant-set strategy requires an L2-norm heuristic")
                .ball_geodesic_index(&node.state),
            RelevantSetStrategy::Simulation => self.compute_r(node).num_reached() as u32,
        };
        node.set_hash_r(value);
        value
    }

    fn evaluate_novelty(
        &self,
        evaluators: &RefCell<HashMap<(u32, u64), NoveltyOracle>>,
        k: u32,
        type_: u64,
        parent_type: u64,
        node: &Rc<SearchNode<M::State, M::ActionId>>,
    ) -> u32 {
        let mut evaluators = evaluators.borrow_mut();
        let is_new = !evaluators.contains_key(&(k, type_));
        let evaluator = evaluators.entry((k, type_)).or_insert_with(|| {
            NoveltyFactory.create_evaluator(k)
        });
        if is_new {
            self.stats.borrow_mut().search_table_created();
        }

        let features = self.features.evaluate(&node.state);
        if node.has_parent() && type_ == parent_type {
            let parent_features = self.features.evaluate(&node.parent.as_ref().unwrap().state);
            evaluator.evaluate_with_parent(&features, &parent_features, k)
        } else {
            evaluator.evaluate(&features, k)
        }
    }

    /// Computes (and caches on the node) the [`RelevantAtomSet`] that yields
    /// `#r`. Recurses along the parent chain, but each node pays for the
    /// recursion at most once thanks to the cache.
    pub fn compute_r(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> RelevantAtomSet {
        if let Some(cached) = node.cached_relevant_atoms() {
            return cached;
        }

        let set = if self.computation_of_r_necessary(node) {
            // Only the seed's R-computation simulation is traced: the same
            // simulation re-runs for most generated nodes, and logging every
            // one of them would drown out everything else.
            let verbose = !node.has_parent();
            let iw_config = IwConfig {
                complete: self.config.complete_simulation,
                max_width: self.config.simulation_width,
                goal_directed: false,
                enforce_state_constraints: true,
                r_file: None,
                filter_r_set: false,
                log_search: verbose,
            };
            let mut engine = IwEngine::new(self.model, self.features, iw_config)
                .expect("simulation_width is validated at construction time");
            let outcome = engine.search(node.state.clone());
            {
                let mut stats = self.stats.borrow_mut();
                stats.sim_table_created();
                stats.merge_simulation(outcome.stats);
            }

            let helper = AtomsetHelper::new(outcome.relevant_tuples);
            let mut relevant = RelevantAtomSet::new(helper);
            relevant.init(&self.features.evaluate(&node.state));
            relevant
        } else {
            let parent = node.parent.as_ref().expect("computation_of_r_necessary guards this");
            let mut relevant = self.compute_r(parent);
            if node.decreases_unachieved_subgoals() {
                relevant.init(&self.features.evaluate(&node.state));
            } else {
                relevant.update(&self.features.evaluate(&node.state));
            }
            relevant
        };

        node.set_relevant_atoms(set.clone());
        set
    }

    fn computation_of_r_necessary(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> bool {
        match self.config.r_computation {
            RComputation::Seed => !node.has_parent(),
            RComputation::SeedAndGDecreasers => {
                !node.has_parent() || node.decreases_unachieved_subgoals()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexer_packs_distinct_pairs_to_distinct_keys() {
        let indexer = NoveltyIndexer;
        assert_ne!(indexer.index(1, 2), indexer.index(2, 1));
        assert_eq!(indexer.index(1, 2), indexer.index(1, 2));
    }
}
