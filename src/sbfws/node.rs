//! The node type used by [`crate::sbfws::SbfwsEngine`], and the relevant-atom
//! bookkeeping ([`AtomsetHelper`]/[`RelevantAtomSet`]) cached on it.
//!
//! Grounded on `original_source/.../sbfws.hxx`'s `SBFWSNode`, whose mutable
//! fields (`w_g`, `w_gr`, `_processed`, `_relevant_atoms`, `_hash_r`) are
//! written well after construction as the heuristic lazily evaluates the
//! node; here those become `Cell`/`RefCell` fields rather than raw mutable
//! members, following the same `Rc` parent-chain choice as
//! [`crate::iw::SimulationNode`].

use crate::model::FeatureValue;
use crate::novelty::Width1Tuple;
use crate::width::WidthTag;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The fixed "ground truth" set of relevant tuples computed for some node
/// (typically the seed, or a node that strictly decreased `#g`). Shared by
/// every descendant node that inherits rather than recomputes its
/// [`RelevantAtomSet`].
#[derive(Debug)]
pub struct AtomsetHelper {
    relevant: Vec<Width1Tuple>,
}

impl AtomsetHelper {
    pub fn new(relevant: Vec<Width1Tuple>) -> Rc<Self> {
        Rc::new(Self { relevant })
    }

    pub fn num_relevant(&self) -> usize {
        self.relevant.len()
    }

    pub fn tuples(&self) -> &[Width1Tuple] {
        &self.relevant
    }
}

/// Tracks, for one node, how many of its [`AtomsetHelper`]'s relevant tuples
/// have been witnessed true along the path from the root to that node (`#r`).
#[derive(Debug, Clone)]
pub struct RelevantAtomSet {
    helper: Rc<AtomsetHelper>,
    reached: Vec<bool>,
}

impl RelevantAtomSet {
    pub fn new(helper: Rc<AtomsetHelper>) -> Self {
        let len = helper.num_relevant();
        Self {
            helper,
            reached: vec![false; len],
        }
    }

    pub fn helper(&self) -> &Rc<AtomsetHelper> {
        &self.helper
    }

    pub fn num_reached(&self) -> usize {
        self.reached.iter().filter(|&&b| b).count()
    }

    /// Resets reached-status, then marks every relevant tuple witnessed in
    /// `features`. Used when (re-)seeding a set at a node whose `#g`
    /// strictly decreased relative to its parent.
    pub fn init(&mut self, features: &[FeatureValue]) {
        self.reached.iter_mut().for_each(|b| *b = false);
        self.mark(features);
    }

    /// Monotonically ORs in newly-reached tuples witnessed in `features`,
    /// without clearing any tuple already marked reached.
    pub fn update(&mut self, features: &[FeatureValue]) {
        self.mark(features);
    }

    fn mark(&mut self, features: &[FeatureValue]) {
        for (i, tuple) in self.helper.tuples().iter().enumerate() {
            let (feature_index, value) = *tuple;
            if !self.reached[i] && features[feature_index as usize] == value {
                self.reached[i] = true;
            }
        }
    }
}

/// A node generated during an SBFWS search.
#[derive(Debug)]
pub struct SearchNode<S, A> {
    pub state: S,
    pub action: Option<A>,
    pub parent: Option<Rc<SearchNode<S, A>>>,
    pub g: u32,
    pub gen_order: u32,
    unachieved_subgoals: Cell<u32>,
    processed: Cell<bool>,
    w_g: Cell<WidthTag>,
    w_gr: Cell<WidthTag>,
    relevant_atoms: RefCell<Option<RelevantAtomSet>>,
    hash_r: Cell<u32>,
    reward: Cell<f64>,
}

/// Sentinel used for `unachieved_subgoals` before it has been computed.
pub const UNACHIEVED_UNKNOWN: u32 = u32::MAX;

impl<S, A> SearchNode<S, A> {
    pub fn root(state: S, gen_order: u32) -> Rc<Self> {
        Rc::new(Self {
            state,
            action: None,
            parent: None,
            g: 0,
            gen_order,
            unachieved_subgoals: Cell::new(UNACHIEVED_UNKNOWN),
            processed: Cell::new(false),
            w_g: Cell::new(WidthTag::Unknown),
            w_gr: Cell::new(WidthTag::Unknown),
            relevant_atoms: RefCell::new(None),
            hash_r: Cell::new(0),
            reward: Cell::new(0.0),
        })
    }

    pub fn child(state: S, action: A, parent: &Rc<Self>, gen_order: u32) -> Rc<Self> {
        Rc::new(Self {
            state,
            action: Some(action),
            parent: Some(Rc::clone(parent)),
            g: parent.g + 1,
            gen_order,
            unachieved_subgoals: Cell::new(UNACHIEVED_UNKNOWN),
            processed: Cell::new(false),
            w_g: Cell::new(WidthTag::Unknown),
            w_gr: Cell::new(WidthTag::Unknown),
            relevant_atoms: RefCell::new(None),
            hash_r: Cell::new(0),
            reward: Cell::new(0.0),
        })
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn unachieved_subgoals(&self) -> u32 {
        self.unachieved_subgoals.get()
    }

    pub fn set_unachieved_subgoals(&self, value: u32) {
        self.unachieved_subgoals.set(value);
    }

    /// Whether `#g` strictly decreased relative to the parent (always true,
    /// vacuously, for the root).
    pub fn decreases_unachieved_subgoals(&self) -> bool {
        match &self.parent {
            None => true,
            Some(parent) => self.unachieved_subgoals() < parent.unachieved_subgoals(),
        }
    }

    pub fn processed(&self) -> bool {
        self.processed.get()
    }

    pub fn mark_processed(&self) {
        self.processed.set(true);
    }

    pub fn w_g(&self) -> WidthTag {
        self.w_g.get()
    }

    pub fn set_w_g(&self, tag: WidthTag) {
        self.w_g.set(tag);
    }

    pub fn w_gr(&self) -> WidthTag {
        self.w_gr.get()
    }

    pub fn set_w_gr(&self, tag: WidthTag) {
        self.w_gr.set(tag);
    }

    pub fn hash_r(&self) -> u32 {
        self.hash_r.get()
    }

    pub fn set_hash_r(&self, value: u32) {
        self.hash_r.set(value);
    }

    pub fn reward(&self) -> f64 {
        self.reward.get()
    }

    pub fn set_reward(&self, value: f64) {
        self.reward.set(value);
    }

    /// Returns the cached [`RelevantAtomSet`], if any has been computed yet.
    pub fn cached_relevant_atoms(&self) -> Option<RelevantAtomSet> {
        self.relevant_atoms.borrow().clone()
    }

    pub fn set_relevant_atoms(&self, set: RelevantAtomSet) {
        *self.relevant_atoms.borrow_mut() = Some(set);
    }
}

impl<S: std::fmt::Debug, A: Clone> SearchNode<S, A> {
    pub fn extract_plan(self: &Rc<Self>) -> Vec<A> {
        let mut plan = Vec::new();
        let mut node = Rc::clone(self);
        while let Some(parent) = node.parent.clone() {
            plan.push(node.action.clone().expect("non-root node has an action"));
            node = parent;
        }
        plan.reverse();
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_atom_set_init_then_update() {
        let helper = AtomsetHelper::new(vec![(0, 1), (1, 0)]);
        let mut set = RelevantAtomSet::new(helper);
        set.init(&[1, 5]);
        assert_eq!(set.num_reached(), 1);
        set.update(&[1, 0]);
        assert_eq!(set.num_reached(), 2);
    }

    #[test]
    fn relevant_atom_set_init_resets_reached() {
        let helper = AtomsetHelper::new(vec![(0, 1)]);
        let mut set = RelevantAtomSet::new(helper);
        set.init(&[1]);
        assert_eq!(set.num_reached(), 1);
        set.init(&[0]);
        assert_eq!(set.num_reached(), 0);
    }

    #[test]
    fn root_decreases_unachieved_subgoals_vacuously() {
        let root = SearchNode::<&str, u32>::root("s0", 1);
        assert!(root.decreases_unachieved_subgoals());
    }

    #[test]
    fn child_decrease_depends_on_unachieved_counts() {
        let root = SearchNode::<&str, u32>::root("s0", 1);
        root.set_unachieved_subgoals(3);
        let child = SearchNode::child("s1", 1u32, &root, 2);
        child.set_unachieved_subgoals(2);
        assert!(child.decreases_unachieved_subgoals());
        child.set_unachieved_subgoals(3);
        assert!(!child.decreases_unachieved_subgoals());
    }
}
