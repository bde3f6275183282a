//! The bounded-width breadth-first simulation run by [`crate::sbfws`] as a
//! subroutine, and usable standalone as a lookahead search in its own right.
//!
//! Grounded on `original_source/.../iw.hxx`'s `IW::run`/`process_node`/
//! `process_node_complete`/`update_best_node`/`mark_seed_subgoals`, and on
//! the teacher's `search_engines::gbfs::GBFS` for the general shape of a
//! queue-driven search loop and its accompanying statistics struct.

use crate::error::SearchError;
use crate::globals::ZccGuard;
use crate::model::{FeatureSet, StateModel};
use crate::novelty::{NoveltyFactory, NoveltyOracle, Width1Tuple, INFINITE_NOVELTY};
use crate::trace::{self, SearchTrace};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use tracing::info;

use super::node::SimulationNode;

/// Configuration accepted by [`IwEngine::new`].
///
/// `r_file` and `filter_r_set` are accepted for parity with the original
/// configuration surface but are documented no-ops: the goal-ball-filter
/// algorithm they gate is not implemented by this crate (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct IwConfig {
    /// If true, keep running past full subgoal satisfaction until the
    /// reachable state space is exhausted.
    pub complete: bool,
    /// Maximum novelty level considered, 1 or 2.
    pub max_width: u32,
    /// Restrict the extracted relevant tuples to those seen on paths leading
    /// to a satisfied subgoal.
    pub goal_directed: bool,
    /// Forwarded to [`StateModel::applicable_actions`]; when false, also
    /// deactivates zero-crossing control for the duration of the run.
    pub enforce_state_constraints: bool,
    /// Unused: accepted for configuration-surface parity only.
    pub r_file: Option<String>,
    /// Unused: accepted for configuration-surface parity only.
    pub filter_r_set: bool,
    /// If true, every generated node is retained in [`IwOutcome`] for trace
    /// output (see [`crate::trace`]).
    pub log_search: bool,
}

impl Default for IwConfig {
    fn default() -> Self {
        Self {
            complete: false,
            max_width: 2,
            goal_directed: false,
            enforce_state_constraints: true,
            r_file: None,
            filter_r_set: false,
            log_search: false,
        }
    }
}

/// Per-run node counters, surfaced to [`crate::stats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IwRunStats {
    pub w1_nodes_expanded: u32,
    pub w2_nodes_expanded: u32,
    pub w1_nodes_generated: u32,
    pub w2_nodes_generated: u32,
    pub w_gt2_nodes_generated: u32,
    pub reachable_subgoals: usize,
}

/// The result of one [`IwEngine::search`] call.
#[derive(Debug)]
pub struct IwOutcome<S, A> {
    /// Whether every subgoal was reached before the bound (or, in
    /// `complete` mode, always `false`: completeness runs never "stop early
    /// on success", matching the original's always-exhaustive semantics).
    pub solved: bool,
    /// The highest-reward node found, root if nothing improved on it.
    pub best_node: Rc<SimulationNode<S, A>>,
    /// The plan from the initial state to `best_node`.
    pub plan: Vec<A>,
    /// Number of subgoals reached (out of the model's total).
    pub reached_subgoals: usize,
    /// The relevant width-1 tuples extracted from this run, the "R" set.
    pub relevant_tuples: Vec<Width1Tuple>,
    pub stats: IwRunStats,
    /// Present only when [`IwConfig::log_search`] was set.
    pub trace: Option<SearchTrace<S>>,
}

/// Runs IW simulations against a fixed model and feature set.
pub struct IwEngine<'m, M: StateModel, F> {
    model: &'m M,
    features: &'m F,
    config: IwConfig,
    evaluator: NoveltyOracle,
    generated: u32,
    w1_nodes_expanded: u32,
    w2_nodes_expanded: u32,
    w1_nodes_generated: u32,
    w2_nodes_generated: u32,
    w_gt2_nodes_generated: u32,
    visited: Vec<Rc<SimulationNode<M::State, M::ActionId>>>,
}

impl<'m, M, F> IwEngine<'m, M, F>
where
    M: StateModel,
    F: FeatureSet<M::State>,
{
    pub fn new(model: &'m M, features: &'m F, config: IwConfig) -> Result<Self, SearchError> {
        if config.max_width != 1 && config.max_width != 2 {
            return Err(SearchError::UnsupportedMaxWidth(config.max_width));
        }
        let evaluator = NoveltyFactory.create_evaluator(config.max_width);
        Ok(Self {
            model,
            features,
            config,
            evaluator,
            generated: 1,
            w1_nodes_expanded: 0,
            w2_nodes_expanded: 0,
            w1_nodes_generated: 0,
            w2_nodes_generated: 0,
            w_gt2_nodes_generated: 0,
            visited: Vec::new(),
        })
    }

    /// Resets all per-run counters and the novelty tables, as if this engine
    /// were freshly constructed. Allows a single engine to be reused across
    /// repeated simulations without reallocating its internals.
    pub fn reset(&mut self) {
        self.generated = 1;
        self.w1_nodes_expanded = 0;
        self.w2_nodes_expanded = 0;
        self.w1_nodes_generated = 0;
        self.w2_nodes_generated = 0;
        self.w_gt2_nodes_generated = 0;
        self.visited.clear();
        self.evaluator.reset();
    }

    pub fn solve_model(&mut self) -> IwOutcome<M::State, M::ActionId> {
        self.search(self.model.init())
    }

    /// Runs one IW simulation from `seed`.
    pub fn search(&mut self, seed: M::State) -> IwOutcome<M::State, M::ActionId> {
        let _zcc_guard = (!self.config.enforce_state_constraints).then(ZccGuard::new);

        let root = SimulationNode::root(seed, self.generated);
        assert!(
            self.generated < u32::MAX,
            "gen_order overflow: more than u32::MAX nodes generated in one search"
        );
        self.generated += 1;

        let num_subgoals = self.model.num_subgoals();
        let mut in_seed = vec![false; num_subgoals];
        let mut unreached = HashSet::new();
        for i in 0..num_subgoals {
            if self.model.goal_atom(&root.state, i) {
                in_seed[i] = true;
            } else {
                unreached.insert(i);
            }
        }

        let root_novelty = self.evaluate(&root, None);
        debug_assert_eq!(root_novelty, 1, "the seed node must have novelty 1");
        root.set_novelty(root_novelty);
        self.count_generation(root_novelty);

        let mut best_node = Rc::clone(&root);
        let mut optimal_paths: Vec<Option<Rc<SimulationNode<M::State, M::ActionId>>>> =
            vec![None; num_subgoals];

        let mut open1: VecDeque<Rc<SimulationNode<M::State, M::ActionId>>> = VecDeque::new();
        let mut open2: VecDeque<Rc<SimulationNode<M::State, M::ActionId>>> = VecDeque::new();
        open1.push_back(Rc::clone(&root));

        'layers: loop {
            let mut next1 = VecDeque::new();
            let mut next2 = VecDeque::new();

            while !open1.is_empty() || !open2.is_empty() {
                let current = if !open1.is_empty() {
                    open1.pop_front().unwrap()
                } else {
                    open2.pop_front().unwrap()
                };
                self.count_expansion(current.novelty());

                for action in self
                    .model
                    .applicable_actions(&current.state, self.config.enforce_state_constraints)
                {
                    let successor_state = self.model.next(&current.state, action);
                    let successor =
                        SimulationNode::child(successor_state, action, &current, self.generated);
                    assert!(
                        self.generated < u32::MAX,
                        "gen_order overflow: more than u32::MAX nodes generated in one search"
                    );
                    self.generated += 1;

                    let novelty = self.evaluate(&successor, Some(&current));
                    successor.set_novelty(novelty);
                    self.count_generation(novelty);

                    if self.config.log_search {
                        self.visited.push(Rc::clone(&successor));
                    }

                    let finished =
                        self.process_node(&successor, &mut unreached, &in_seed, &mut optimal_paths);
                    if successor.reward() > best_node.reward() {
                        best_node = Rc::clone(&successor);
                    }

                    if finished && !self.config.complete {
                        let reached = Self::reached_subgoal_count(&in_seed, &optimal_paths);
                        self.report(reached, num_subgoals, "all subgoals reached");
                        return self.finish(root, best_node, optimal_paths, true, reached);
                    }

                    if novelty <= self.config.max_width && novelty == 1 {
                        next1.push_back(successor);
                    } else if novelty <= self.config.max_width && novelty == 2 {
                        next2.push_back(successor);
                    }
                }
            }

            open1 = next1;
            open2 = next2;
            if open1.is_empty() && open2.is_empty() {
                break 'layers;
            }
        }

        let reached = Self::reached_subgoal_count(&in_seed, &optimal_paths);
        self.report(reached, num_subgoals, "state space exhausted");
        self.finish(root, best_node, optimal_paths, unreached.is_empty(), reached)
    }

    fn finish(
        &self,
        root: Rc<SimulationNode<M::State, M::ActionId>>,
        best_node: Rc<SimulationNode<M::State, M::ActionId>>,
        optimal_paths: Vec<Option<Rc<SimulationNode<M::State, M::ActionId>>>>,
        solved: bool,
        reached_subgoals: usize,
    ) -> IwOutcome<M::State, M::ActionId> {
        let plan = best_node.extract_plan();
        let relevant_tuples = if self.config.goal_directed {
            self.goal_directed_tuples(&root, &optimal_paths)
        } else {
            let mut tuples = Vec::new();
            self.evaluator.mark_tuples_in_novelty1_table(&mut tuples);
            tuples
        };
        let trace = self
            .config
            .log_search
            .then(|| trace::iw_trace(&self.visited, &optimal_paths));
        IwOutcome {
            solved,
            best_node,
            plan,
            reached_subgoals,
            relevant_tuples,
            trace,
            stats: IwRunStats {
                w1_nodes_expanded: self.w1_nodes_expanded,
                w2_nodes_expanded: self.w2_nodes_expanded,
                w1_nodes_generated: self.w1_nodes_generated,
                w2_nodes_generated: self.w2_nodes_generated,
                w_gt2_nodes_generated: self.w_gt2_nodes_generated,
                reachable_subgoals: reached_subgoals,
            },
        }
    }

    /// When `goal_directed` is set, restricts the relevant set to width-1
    /// tuples observed along the root-to-first-satisfier path of each
    /// subgoal that was actually reached, rather than every tuple observed
    /// anywhere during the run.
    fn goal_directed_tuples(
        &self,
        root: &Rc<SimulationNode<M::State, M::ActionId>>,
        optimal_paths: &[Option<Rc<SimulationNode<M::State, M::ActionId>>>],
    ) -> Vec<Width1Tuple> {
        let mut seen = HashSet::new();
        let mut tuples = Vec::new();
        for path_end in optimal_paths.iter().flatten() {
            let mut node = Rc::clone(path_end);
            loop {
                let features = self.features.evaluate(&node.state);
                for (i, &v) in features.iter().enumerate() {
                    if seen.insert((i as u32, v)) {
                        tuples.push((i as u32, v));
                    }
                }
                match node.parent.clone() {
                    Some(parent) => node = parent,
                    None => break,
                }
            }
        }
        let _ = root;
        tuples
    }

    /// Checks `node` against the subgoals still pending, recording the first
    /// node to satisfy each one, and returns whether every subgoal has now
    /// been reached.
    ///
    /// In `complete` mode this iterates every subgoal on every node but
    /// deliberately does *not* remove satisfied indices from `unreached` —
    /// this mirrors a documented oddity of the source this was distilled
    /// from, under which `unreached` can never become empty via this branch.
    /// `reached_subgoals` is computed separately, from `optimal_paths`, so
    /// this quirk does not corrupt the reported statistics.
    fn process_node(
        &self,
        node: &Rc<SimulationNode<M::State, M::ActionId>>,
        unreached: &mut HashSet<usize>,
        in_seed: &[bool],
        optimal_paths: &mut [Option<Rc<SimulationNode<M::State, M::ActionId>>>],
    ) -> bool {
        if self.config.complete {
            for i in 0..self.model.num_subgoals() {
                if !in_seed[i] && self.model.goal_atom(&node.state, i) {
                    node.add_reward(1.0);
                    if optimal_paths[i].is_none() {
                        optimal_paths[i] = Some(Rc::clone(node));
                    }
                }
            }
            unreached.is_empty()
        } else {
            let satisfied: Vec<usize> = unreached
                .iter()
                .copied()
                .filter(|&i| self.model.goal_atom(&node.state, i))
                .collect();
            for i in satisfied {
                node.add_reward(1.0);
                if optimal_paths[i].is_none() {
                    optimal_paths[i] = Some(Rc::clone(node));
                }
                unreached.remove(&i);
            }
            unreached.is_empty()
        }
    }

    fn reached_subgoal_count(
        in_seed: &[bool],
        optimal_paths: &[Option<Rc<SimulationNode<M::State, M::ActionId>>>],
    ) -> usize {
        in_seed.iter().filter(|&&b| b).count()
            + optimal_paths.iter().filter(|p| p.is_some()).count()
    }

    fn evaluate(
        &mut self,
        node: &SimulationNode<M::State, M::ActionId>,
        parent: Option<&SimulationNode<M::State, M::ActionId>>,
    ) -> u32 {
        let features = self.features.evaluate(&node.state);
        match parent {
            Some(parent) => {
                let parent_features = self.features.evaluate(&parent.state);
                let mut novelty = INFINITE_NOVELTY;
                for k in 1..=self.config.max_width {
                    // Every k must be evaluated, even once a smaller k has already
                    // proven novel: each k's table is only ever updated by its own
                    // call, and skipping a k here would leave it never having seen
                    // this node's k-subtuples, corrupting later novelty checks.
                    let w = self
                        .evaluator
                        .evaluate_with_parent(&features, &parent_features, k);
                    if w <= k && novelty == INFINITE_NOVELTY {
                        novelty = w;
                    }
                }
                novelty
            }
            None => {
                let mut novelty = INFINITE_NOVELTY;
                for k in 1..=self.config.max_width {
                    let w = self.evaluator.evaluate(&features, k);
                    if w <= k && novelty == INFINITE_NOVELTY {
                        novelty = w;
                    }
                }
                novelty
            }
        }
    }

    fn count_expansion(&mut self, novelty: u32) {
        match novelty {
            1 => self.w1_nodes_expanded += 1,
            2 => self.w2_nodes_expanded += 1,
            _ => {}
        }
    }

    fn count_generation(&mut self, novelty: u32) {
        match novelty {
            1 => self.w1_nodes_generated += 1,
            2 => self.w2_nodes_generated += 1,
            _ => self.w_gt2_nodes_generated += 1,
        }
    }

    fn report(&self, reached_subgoals: usize, num_subgoals: usize, result: &str) {
        info!(
            result,
            reached_subgoals,
            total_subgoals = num_subgoals,
            w1_nodes_expanded = self.w1_nodes_expanded,
            w2_nodes_expanded = self.w2_nodes_expanded,
            w1_nodes_generated = self.w1_nodes_generated,
            w2_nodes_generated = self.w2_nodes_generated,
            w_gt2_nodes_generated = self.w_gt2_nodes_generated,
            "simulation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SwitchFeatures, SwitchModel};

    #[test]
    fn solves_trivial_already_satisfied_seed() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let mut engine = IwEngine::new(&model, &features, IwConfig::default()).unwrap();
        let outcome = engine.search(vec![true, true]);
        assert!(outcome.solved);
        assert_eq!(outcome.reached_subgoals, 2);
        assert!(outcome.plan.is_empty());
    }

    #[test]
    fn solves_two_switch_chain() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let mut engine = IwEngine::new(&model, &features, IwConfig::default()).unwrap();
        let outcome = engine.solve_model();
        assert!(outcome.solved);
        assert_eq!(outcome.reached_subgoals, 2);
        assert_eq!(outcome.plan.len(), 2);
    }

    #[test]
    fn complete_mode_runs_past_first_success_without_early_return() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let config = IwConfig {
            complete: true,
            ..IwConfig::default()
        };
        let mut engine = IwEngine::new(&model, &features, config).unwrap();
        let outcome = engine.solve_model();
        assert!(!outcome.solved, "complete mode never reports early success");
        assert_eq!(outcome.reached_subgoals, 2);
    }

    #[test]
    fn rejects_unsupported_max_width() {
        let model = SwitchModel::new(1);
        let features = SwitchFeatures;
        let config = IwConfig {
            max_width: 3,
            ..IwConfig::default()
        };
        assert!(matches!(
            IwEngine::new(&model, &features, config),
            Err(SearchError::UnsupportedMaxWidth(3))
        ));
    }

    #[test]
    fn reentrant_search_resets_counters() {
        let model = SwitchModel::new(2);
        let features = SwitchFeatures;
        let mut engine = IwEngine::new(&model, &features, IwConfig::default()).unwrap();
        let first = engine.search(model.init());
        let second = engine.search(model.init());
        assert_eq!(first.stats.w1_nodes_generated, second.stats.w1_nodes_generated);
    }
}
