//! External collaborator interfaces (spec §6): the state model, the feature
//! set, and the auxiliary black-box heuristics. Production implementations
//! of these (PDDL state representations, learned feature sets, relaxed-plan
//! heuristics) are out of scope for this crate; only the trait boundary and
//! a couple of reference/test implementations live here.

use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// A single feature value. The original source parametrizes over an opaque
/// `FeatureValueT`; this crate uses plain `i64`, which is sufficient to
/// represent both boolean/proposition features (0/1) and small numeric
/// features.
pub type FeatureValue = i64;

/// The feature vector produced by a [`FeatureSet`] for one state. Compared
/// by equality and hashed, treated as opaque by everything except the
/// novelty machinery, which reads sub-tuples out of it.
pub type FeatureVector = Rc<[FeatureValue]>;

/// The transition model consumed by both search engines.
///
/// Implementations are expected to be cheap to borrow (the engines hold a
/// `&StateModel` for their entire lifetime) and must give applicable actions
/// in a stable, deterministic order, since action order feeds directly into
/// tie-breaking via `gen_order`.
pub trait StateModel {
    /// A state of the underlying transition system.
    type State: Clone + Debug + Eq + Hash;
    /// An identifier for an applicable action, opaque to the search core.
    type ActionId: Clone + Copy + Debug + Eq;

    /// The initial state.
    fn init(&self) -> Self::State;

    /// All actions applicable in `state`, in canonical order. When
    /// `enforce_constraints` is false the model should skip whatever
    /// soft-constraint checks it normally applies (see
    /// [`crate::globals::GlobalSearchConfig`]).
    fn applicable_actions(
        &self,
        state: &Self::State,
        enforce_constraints: bool,
    ) -> Vec<Self::ActionId>;

    /// The successor of `state` under `action`. Assumed applicable.
    fn next(&self, state: &Self::State, action: Self::ActionId) -> Self::State;

    /// Whether `state` satisfies the overall goal condition.
    fn goal(&self, state: &Self::State) -> bool;

    /// Whether `state` satisfies the `subgoal_index`-th atomic subgoal.
    fn goal_atom(&self, state: &Self::State, subgoal_index: usize) -> bool;

    /// The number of atomic subgoals jointly defining the goal condition.
    fn num_subgoals(&self) -> usize;

    /// The size of the model's ground-atom index: the total count of atoms a
    /// state can assert, used to size the novelty tables
    /// ([`crate::sbfws::SbfwsEngine::new`]'s `auto_novelty_levels`). Named
    /// after the source this was distilled from, where it is the `size()` of
    /// the `AtomIndex` returned by the task's `get_tuple_index()`.
    fn get_tuple_index(&self) -> usize;

    /// The clock variable's current value in `state`, used against the
    /// global horizon by [`crate::sbfws::SbfwsEngine`]. Models that never
    /// terminate on a horizon may return `0.0` unconditionally (with the
    /// global horizon left at its default of `+inf`).
    fn clock_time(&self, state: &Self::State) -> f64 {
        let _ = state;
        0.0
    }
}

/// The feature-set evaluator: an external collaborator that reduces a state
/// to a [`FeatureVector`] the novelty machinery can compare sub-tuples of.
pub trait FeatureSet<S> {
    fn evaluate(&self, state: &S) -> FeatureVector;

    /// Whether this feature set includes extra (non-propositional) features
    /// beyond the atom-indicator ones; affects how the novelty factory sizes
    /// its tables. Defaults to false.
    fn uses_extra_features(&self) -> bool {
        false
    }
}

/// Counts unsatisfied goal atoms. A black-box auxiliary heuristic (§6).
pub trait UnsatGoalHeuristic<S> {
    fn evaluate(&self, state: &S) -> u32;
}

/// The trivial, always-correct implementation of [`UnsatGoalHeuristic`],
/// built directly against [`StateModel::goal_atom`]. Production planners
/// typically use a cheaper incremental counter, but this is sufficient as a
/// reference/test implementation and as the default wired into
/// [`crate::sbfws::SbfwsHeuristic`].
#[derive(Debug, Clone, Copy)]
pub struct GoalAtomCounter<'m, M> {
    model: &'m M,
}

impl<'m, M> GoalAtomCounter<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }
}

impl<M: StateModel> UnsatGoalHeuristic<M::State> for GoalAtomCounter<'_, M> {
    fn evaluate(&self, state: &M::State) -> u32 {
        (0..self.model.num_subgoals())
            .filter(|&i| !self.model.goal_atom(state, i))
            .count() as u32
    }
}

/// The L0 numeric-landmark heuristic (§6). Out of scope to implement for
/// real; this trait is the boundary a host implementation plugs into.
pub trait L0Heuristic<S> {
    fn evaluate(&self, state: &S) -> u32;
}

/// The L2-norm geodesic ball index heuristic (§6). Out of scope to implement
/// for real.
pub trait L2NormHeuristic<S> {
    fn ball_geodesic_index(&self, state: &S) -> u32;
}

/// The optional, time-discounted reward function (§4.4). When absent,
/// `SbfwsEngine` treats every node's reward contribution as zero.
pub trait RewardFunction<S> {
    fn evaluate(&self, state: &S) -> f64;
}
