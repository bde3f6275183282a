//! The multi-queue Simulated Best-First Width Search driver (§4.4).
//!
//! Grounded on `original_source/.../sbfws.hxx`'s `SBFWS` class:
//! `process_one_node`/`create_node`/`expand_node`/`update_best_node`/
//! `setup_novelty_levels`/`evaluate_reward`, translated into the engine/node
//! split the teacher's `search_engines::gbfs::GBFS` uses.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::info;

use crate::error::SearchError;
use crate::globals::GlobalSearchConfig;
use crate::model::{FeatureSet, RewardFunction, StateModel};
use crate::stats::BfwsStats;
use crate::trace::{self, SearchTrace};
use crate::width::WidthTag;

use super::heuristic::SbfwsHeuristic;
use super::node::SearchNode;
use super::queues::{NodeQueue, UnachievedPriority};

/// Static configuration accepted by [`SbfwsEngine::new`].
#[derive(Debug, Clone)]
pub struct SbfwsConfig {
    /// Overrides the automatically-computed novelty-levels count (2 or 3).
    /// `None` means "auto".
    pub novelty_levels: Option<u32>,
    /// Whether to discard (rather than spill to QREST) nodes proven to have
    /// `w_{#g,#r} > 2`.
    pub prune: bool,
    /// Whether Q1 is checked first, ahead of QWGR1/QWGR2/QREST.
    pub lazy_iw_1_search: bool,
    /// Hard cap on the number of generated nodes for one `search()` call.
    pub max_generations: u32,
    /// Discount factor applied to reward contributions as `discount^g`.
    pub discount: f64,
    /// If true, every created node is retained for trace output.
    pub log_search: bool,
}

impl Default for SbfwsConfig {
    fn default() -> Self {
        Self {
            novelty_levels: None,
            prune: false,
            lazy_iw_1_search: true,
            max_generations: 10_000,
            discount: 1.0,
            log_search: false,
        }
    }
}

const EXPECTED_R_SIZE: f64 = 10.0;

/// Chooses 2 or 3 novelty levels for the search, following the same
/// memory-budget heuristic as `SBFWS::setup_novelty_levels`.
fn auto_novelty_levels(num_subgoals: usize, num_atoms: usize) -> u32 {
    let num_atoms = num_atoms as f64;
    let size_novelty2_table = (num_atoms * (num_atoms - 1.0) + num_atoms) / (1024.0 * 1024.0 * 8.0);
    let size_novelty2_tables = num_subgoals as f64 * EXPECTED_R_SIZE * size_novelty2_table;
    if size_novelty2_tables > 2048.0 {
        2
    } else {
        3
    }
}

/// Runs Simulated Best-First Width Search against a fixed model.
pub struct SbfwsEngine<'m, M: StateModel, F> {
    model: &'m M,
    heuristic: SbfwsHeuristic<'m, M, F>,
    reward_function: Option<&'m dyn RewardFunction<M::State>>,
    config: SbfwsConfig,
    novelty_levels: u32,

    q1: NodeQueue<M::State, M::ActionId, UnachievedPriority>,
    qwgr1: NodeQueue<M::State, M::ActionId, UnachievedPriority>,
    qwgr2: NodeQueue<M::State, M::ActionId, UnachievedPriority>,
    qrest: NodeQueue<M::State, M::ActionId, UnachievedPriority>,
    closed: HashSet<M::State>,

    generated: u32,
    min_subgoals_to_reach: u32,
    stats: Rc<RefCell<BfwsStats>>,

    solution: Option<Rc<SearchNode<M::State, M::ActionId>>>,
    best_node: Option<Rc<SearchNode<M::State, M::ActionId>>>,
    visited: Vec<Rc<SearchNode<M::State, M::ActionId>>>,
}

/// The result of one [`SbfwsEngine::search`] call.
#[derive(Debug)]
pub struct SbfwsOutcome<S, A> {
    pub solved: bool,
    pub plan: Vec<A>,
    pub best_node: Rc<SearchNode<S, A>>,
    pub generated: u32,
    /// Present only when [`SbfwsConfig::log_search`] was set.
    pub trace: Option<SearchTrace<S>>,
}

impl<'m, M, F> SbfwsEngine<'m, M, F>
where
    M: StateModel,
    F: FeatureSet<M::State>,
{
    pub fn new(
        model: &'m M,
        heuristic: SbfwsHeuristic<'m, M, F>,
        reward_function: Option<&'m dyn RewardFunction<M::State>>,
        config: SbfwsConfig,
        stats: Rc<RefCell<BfwsStats>>,
    ) -> Result<Self, SearchError> {
        let novelty_levels = match config.novelty_levels {
            Some(n) if n == 2 || n == 3 => n,
            Some(n) => return Err(SearchError::UnsupportedNoveltyLevels(n as i32)),
            None => auto_novelty_levels(model.num_subgoals(), model.get_tuple_index()),
        };
        info!(novelty_levels, "novelty levels configured");

        Ok(Self {
            model,
            heuristic,
            reward_function,
            config,
            novelty_levels,
            q1: NodeQueue::default(),
            qwgr1: NodeQueue::default(),
            qwgr2: NodeQueue::default(),
            qrest: NodeQueue::default(),
            closed: HashSet::new(),
            generated: 0,
            min_subgoals_to_reach: u32::MAX,
            stats,
            solution: None,
            best_node: None,
            visited: Vec::new(),
        })
    }

    pub fn solve_model(&mut self) -> SbfwsOutcome<M::State, M::ActionId> {
        self.search(self.model.init())
    }

    /// Runs a search from `seed`. Resets every queue, the closed list, the
    /// generation counter and the heuristic's novelty tables first, so one
    /// engine can be driven through repeated, independent `search()` calls.
    pub fn search(&mut self, seed: M::State) -> SbfwsOutcome<M::State, M::ActionId> {
        self.solution = None;
        self.best_node = None;
        self.q1.clear();
        self.qwgr1.clear();
        self.qwgr2.clear();
        self.qrest.clear();
        self.closed.clear();
        self.generated = 0;
        self.visited.clear();
        self.heuristic.reset();
        self.stats.borrow_mut().reset();

        let root = SearchNode::root(seed, self.next_gen_order());
        self.create_node(&root);
        self.stats.borrow_mut().set_initial_reward(root.reward());

        loop {
            if self.solution.is_some() {
                break;
            }
            if !self.process_one_node() {
                break;
            }
        }

        self.stats.borrow().log_summary();

        let best_node = self
            .best_node
            .clone()
            .unwrap_or_else(|| Rc::clone(&root));
        let solution = self.solution.clone();
        let (solved, target) = match solution {
            Some(ref solution_node) => (true, Rc::clone(solution_node)),
            None => (false, Rc::clone(&best_node)),
        };
        let plan = target.extract_plan();
        let trace = self
            .config
            .log_search
            .then(|| trace::sbfws_trace(&self.visited, self.solution.as_ref()));

        SbfwsOutcome {
            solved,
            plan,
            best_node,
            generated: self.generated,
            trace,
        }
    }

    fn next_gen_order(&mut self) -> u32 {
        assert!(
            self.generated < u32::MAX,
            "gen_order overflow: more than u32::MAX nodes generated in one search"
        );
        self.generated += 1;
        self.generated
    }

    fn update_best_node(&mut self, node: &Rc<SearchNode<M::State, M::ActionId>>) {
        match &self.best_node {
            None => self.best_node = Some(Rc::clone(node)),
            Some(best) => {
                // Preserved verbatim from the source this was distilled from:
                // this is not a lexicographic ordering over (g, R) and can in
                // principle oscillate. See DESIGN.md.
                if node.g < best.g || node.reward() > best.reward() {
                    self.stats.borrow_mut().reward(node.reward());
                    self.best_node = Some(Rc::clone(node));
                }
            }
        }
    }

    /// Processes exactly one node from whichever queue has priority.
    /// Returns false iff every queue was empty (nothing left to do).
    fn process_one_node(&mut self) -> bool {
        if self.stats.borrow().generated() >= u64::from(self.config.max_generations) {
            return false;
        }

        if self.config.lazy_iw_1_search && !self.q1.is_empty() {
            let node = self.q1.next().unwrap();
            self.process_node(&node);
            self.stats.borrow_mut().wg1_node();
            return true;
        }

        if !self.qwgr1.is_empty() {
            let node = self.qwgr1.next().unwrap();
            let nov = self.heuristic.evaluate_wgr1(&node);
            if !node.processed() {
                if nov == 1 {
                    self.stats.borrow_mut().wgr1_node();
                    self.process_node(&node);
                } else {
                    self.handle_unprocessed_node(&node, self.novelty_levels == 2);
                }
            }
            return true;
        }

        if self.novelty_levels == 3 && !self.qwgr2.is_empty() {
            let node = self.qwgr2.next().unwrap();
            let nov = self.heuristic.evaluate_wgr2(&node);
            if !node.processed() {
                if nov == 2 {
                    self.stats.borrow_mut().wgr2_node();
                    self.process_node(&node);
                } else {
                    self.handle_unprocessed_node(&node, true);
                }
            }
            return true;
        }

        if !self.qrest.is_empty() {
            let node = self.qrest.next().unwrap();
            if !node.processed() {
                self.stats.borrow_mut().wgr_gt2_node();
                self.process_node(&node);
            }
            return true;
        }

        false
    }

    fn handle_unprocessed_node(&mut self, node: &Rc<SearchNode<M::State, M::ActionId>>, is_last_queue: bool) {
        if is_last_queue && !self.config.prune {
            self.qrest.insert(node);
        }
    }

    fn is_terminal(&self, node: &SearchNode<M::State, M::ActionId>) -> bool {
        self.model.clock_time(&node.state) >= GlobalSearchConfig::instance().horizon_time()
    }

    fn is_goal(&self, node: &SearchNode<M::State, M::ActionId>) -> bool {
        self.model.goal(&node.state)
    }

    fn evaluate_reward(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) {
        let own = match self.reward_function {
            None => 0.0,
            Some(reward_fn) => self.config.discount.powi(node.g as i32) * reward_fn.evaluate(&node.state),
        };
        let total = own + node.parent.as_ref().map_or(0.0, |p| p.reward());
        node.set_reward(total);
    }

    /// Evaluates and enqueues `node`. Returns true iff it is a solution.
    fn create_node(&mut self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> bool {
        if self.is_goal(node) {
            self.evaluate_reward(node);
            self.update_best_node(node);
            if self.config.log_search {
                self.visited.push(Rc::clone(node));
            }
            info!(generated = self.generated, reward = node.reward(), "goal node found");
            self.solution = Some(Rc::clone(node));
            return true;
        }

        if self.is_terminal(node) {
            self.evaluate_reward(node);
            self.update_best_node(node);
            if self.config.log_search {
                self.visited.push(Rc::clone(node));
            }
            info!(generated = self.generated, reward = node.reward(), "terminal node found");
            return false;
        }

        self.evaluate_reward(node);
        self.update_best_node(node);

        let unachieved = self.heuristic.compute_unachieved(&node.state);
        node.set_unachieved_subgoals(unachieved);
        if unachieved < self.min_subgoals_to_reach {
            self.min_subgoals_to_reach = unachieved;
            info!(
                min_unachieved = unachieved,
                total = self.model.num_subgoals(),
                "new minimum unachieved subgoal count"
            );
        }

        self.heuristic.evaluate_wg1(node);
        if node.w_g() == WidthTag::One {
            self.q1.insert(node);
        }
        self.qwgr1.insert(node);
        if self.novelty_levels == 3 {
            self.qwgr2.insert(node);
        }

        {
            let mut stats = self.stats.borrow_mut();
            stats.generation();
            if node.decreases_unachieved_subgoals() {
                stats.generation_g_decrease();
            }
        }

        if self.config.log_search {
            self.visited.push(Rc::clone(node));
        }
        false
    }

    fn process_node(&mut self, node: &Rc<SearchNode<M::State, M::ActionId>>) {
        node.mark_processed();
        self.closed.insert(node.state.clone());
        self.expand_node(node);
    }

    fn expand_node(&mut self, node: &Rc<SearchNode<M::State, M::ActionId>>) {
        {
            let mut stats = self.stats.borrow_mut();
            stats.expansion();
            if node.decreases_unachieved_subgoals() {
                stats.expansion_g_decrease();
            }
        }

        for action in self.model.applicable_actions(&node.state, true) {
            let successor_state = self.model.next(&node.state, action);
            let gen_order = self.next_gen_order();
            let successor = SearchNode::child(successor_state, action, node, gen_order);

            if self.closed.contains(&successor.state) || self.is_open(&successor) {
                continue;
            }

            if self.create_node(&successor) {
                break;
            }
        }
    }

    fn is_open(&self, node: &Rc<SearchNode<M::State, M::ActionId>>) -> bool {
        self.q1.contains(node)
            || self.qwgr1.contains(node)
            || self.qwgr2.contains(node)
            || self.qrest.contains(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GoalAtomCounter, UnsatGoalHeuristic};
    use crate::sbfws::{SbfwsHeuristic, SbfwsHeuristicConfig};
    use crate::test_utils::{GoalReward, SwitchFeatures, SwitchModel};
    use assert_approx_eq::assert_approx_eq;

    fn new_engine<'m>(
        model: &'m SwitchModel,
        features: &'m SwitchFeatures,
        unsat: &'m dyn UnsatGoalHeuristic<Vec<bool>>,
        reward: Option<&'m dyn RewardFunction<Vec<bool>>>,
        config: SbfwsConfig,
    ) -> SbfwsEngine<'m, SwitchModel, SwitchFeatures> {
        let stats = Rc::new(RefCell::new(BfwsStats::new()));
        let heuristic = SbfwsHeuristic::new(
            model,
            features,
            unsat,
            None,
            None,
            SbfwsHeuristicConfig::default(),
            Rc::clone(&stats),
        );
        SbfwsEngine::new(model, heuristic, reward, config, stats).unwrap()
    }

    #[test]
    fn solves_two_switch_chain_and_reports_discounted_reward() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let unsat = GoalAtomCounter::new(&model);
        let reward = GoalReward;
        let config = SbfwsConfig {
            discount: 0.9,
            ..SbfwsConfig::default()
        };
        let mut engine = new_engine(&model, &features, &unsat, Some(&reward), config);

        let outcome = engine.solve_model();
        assert!(outcome.solved);
        assert_eq!(outcome.plan.len(), 2);
        assert_approx_eq!(outcome.best_node.reward(), 0.9_f64.powi(2));
    }

    #[test]
    fn already_satisfied_seed_is_solved_without_expansion() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let unsat = GoalAtomCounter::new(&model);
        let mut engine = new_engine(&model, &features, &unsat, None, SbfwsConfig::default());

        let outcome = engine.search(vec![true, true]);
        assert!(outcome.solved);
        assert!(outcome.plan.is_empty());
    }

    #[test]
    fn zero_max_generations_yields_no_solution() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let unsat = GoalAtomCounter::new(&model);
        let config = SbfwsConfig {
            max_generations: 0,
            ..SbfwsConfig::default()
        };
        let mut engine = new_engine(&model, &features, &unsat, None, config);

        let outcome = engine.solve_model();
        assert!(!outcome.solved);
    }

    #[test]
    fn reentrant_search_clears_prior_solution() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let unsat = GoalAtomCounter::new(&model);
        let mut engine = new_engine(&model, &features, &unsat, None, SbfwsConfig::default());

        let first = engine.solve_model();
        assert!(first.solved);
        let second = engine.search(vec![false, false]);
        assert!(second.solved);
        assert_eq!(first.plan, second.plan);
    }
}
