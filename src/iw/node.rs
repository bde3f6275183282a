//! The node type produced by [`crate::iw::IwEngine`] during a simulation.
//!
//! Grounded on `original_source/.../iw.hxx`'s `IWNode`: shared ownership of
//! the parent chain (there `std::shared_ptr`, here [`Rc`]) with a handful of
//! fields mutated after construction (there raw fields, here
//! [`Cell`]-wrapped) — `_w` (novelty) and `R` (reward) are only known once the
//! node has been run through the novelty evaluator and goal check.

use crate::novelty::INFINITE_NOVELTY;
use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

/// A node generated during an IW simulation.
#[derive(Debug)]
pub struct SimulationNode<S, A> {
    /// The state reached at this node.
    pub state: S,
    /// The action that led here, `None` only for the root.
    pub action: Option<A>,
    /// The parent node, `None` only for the root.
    pub parent: Option<Rc<SimulationNode<S, A>>>,
    /// Accumulated path cost (number of actions since the root).
    pub g: u32,
    /// The generation order; strictly increasing, uniquely identifies the
    /// node within one run.
    pub gen_order: u32,
    /// The novelty classification assigned when this node was generated.
    /// [`INFINITE_NOVELTY`] until [`SimulationNode::set_novelty`] is called.
    novelty: Cell<u32>,
    /// The reward accumulated at this node (one point per newly-satisfied
    /// subgoal witnessed here).
    reward: Cell<f64>,
}

impl<S, A> SimulationNode<S, A> {
    /// Builds the root node of a simulation.
    pub fn root(state: S, gen_order: u32) -> Rc<Self> {
        Rc::new(Self {
            state,
            action: None,
            parent: None,
            g: 0,
            gen_order,
            novelty: Cell::new(INFINITE_NOVELTY),
            reward: Cell::new(0.0),
        })
    }

    /// Builds a child of `parent` reached via `action`.
    pub fn child(state: S, action: A, parent: &Rc<Self>, gen_order: u32) -> Rc<Self> {
        Rc::new(Self {
            state,
            action: Some(action),
            parent: Some(Rc::clone(parent)),
            g: parent.g + 1,
            gen_order,
            novelty: Cell::new(INFINITE_NOVELTY),
            reward: Cell::new(0.0),
        })
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn novelty(&self) -> u32 {
        self.novelty.get()
    }

    pub fn set_novelty(&self, value: u32) {
        self.novelty.set(value);
    }

    pub fn reward(&self) -> f64 {
        self.reward.get()
    }

    pub fn add_reward(&self, delta: f64) {
        self.reward.set(self.reward.get() + delta);
    }
}

impl<S: Debug, A: Debug> SimulationNode<S, A> {
    /// Walks the parent chain from `self` up to (and including) the root,
    /// collecting the actions taken in root-to-`self` order.
    pub fn extract_plan(self: &Rc<Self>) -> Vec<A>
    where
        A: Clone,
    {
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
    fn root_has_no_parent_and_zero_cost() {
        let root = SimulationNode::<&str, u32>::root("s0", 1);
        assert!(!root.has_parent());
        assert_eq!(root.g, 0);
    }

    #[test]
    fn child_accumulates_cost_and_shares_parent() {
        let root = SimulationNode::<&str, u32>::root("s0", 1);
        let child = SimulationNode::child("s1", 7, &root, 2);
        assert!(child.has_parent());
        assert_eq!(child.g, 1);
        assert_eq!(child.parent.as_ref().unwrap().gen_order, 1);
    }

    #[test]
    fn extract_plan_collects_actions_root_to_leaf() {
        let root = SimulationNode::<&str, u32>::root("s0", 1);
        let mid = SimulationNode::child("s1", 10, &root, 2);
        let leaf = SimulationNode::child("s2", 20, &mid, 3);
        assert_eq!(leaf.extract_plan(), vec![10, 20]);
    }

    #[test]
    fn novelty_and_reward_default_and_mutate_through_shared_ref() {
        let root = SimulationNode::<&str, u32>::root("s0", 1);
        assert_eq!(root.novelty(), INFINITE_NOVELTY);
        root.set_novelty(1);
        assert_eq!(root.novelty(), 1);
        root.add_reward(1.0);
        root.add_reward(1.0);
        assert_eq!(root.reward(), 2.0);
    }
}
