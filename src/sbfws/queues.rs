//! The four priority queues driving lazy novelty evaluation in SBFWS.
//!
//! Grounded on `original_source/.../sbfws.hxx`'s `unachieved_subgoals_comparer`
//! and `novelty_comparer` structs, translated from `std::priority_queue`
//! comparator objects (where `true` means "lower priority, popped later")
//! into `Ord` keys consumed by `priority_queue::PriorityQueue`, which pops
//! the greatest key first.

use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::node::SearchNode;
use crate::width::WidthTag;

/// Identifies a queued node by its underlying state, mirroring the
/// state-keyed closed/open list lookups (`ClosedListT::check`,
/// `UpdatableOpenList::contains`) in the source this was distilled from:
/// two nodes reaching the same state are the same queue entry regardless of
/// how they were generated.
#[derive(Debug, Clone)]
struct QueueItem<S, A>(Rc<SearchNode<S, A>>);

impl<S: Eq, A> PartialEq for QueueItem<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.0.state == other.0.state
    }
}
impl<S: Eq, A> Eq for QueueItem<S, A> {}
impl<S: Hash, A> Hash for QueueItem<S, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.state.hash(state);
    }
}

/// Priority for the `Q1` queue: nodes ordered by fewest unachieved subgoals,
/// then lowest `g`, then preferring `w_g == One`, then oldest `gen_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnachievedPriority {
    neg_unachieved: Reverse<u32>,
    neg_g: Reverse<u32>,
    prefers_w_g_one: bool,
    neg_gen_order: Reverse<u32>,
}

fn unachieved_priority<S, A>(node: &SearchNode<S, A>) -> UnachievedPriority {
    UnachievedPriority {
        neg_unachieved: Reverse(node.unachieved_subgoals()),
        neg_g: Reverse(node.g),
        prefers_w_g_one: node.w_g() == WidthTag::One,
        neg_gen_order: Reverse(node.gen_order),
    }
}

/// A queue whose priority is recomputed from the node's current state every
/// time it is pushed, rather than cached — simpler than the original's
/// `UpdatableOpenList`, and correct as long as callers never mutate a node's
/// queue-relevant fields while it's still enqueued (true here: `w_g`/`w_gr`
/// are set once, before insertion, and never revised in place).
#[derive(Debug)]
pub struct NodeQueue<S, A, P: Ord + std::hash::Hash> {
    inner: PriorityQueue<QueueItem<S, A>, P>,
}

impl<S, A, P: Ord + std::hash::Hash> Default for NodeQueue<S, A, P> {
    fn default() -> Self {
        Self {
            inner: PriorityQueue::new(),
        }
    }
}

impl<S: Eq + Hash, A, P: Ord + std::hash::Hash> NodeQueue<S, A, P> {
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn contains(&self, node: &Rc<SearchNode<S, A>>) -> bool {
        self.inner.get(&QueueItem(Rc::clone(node))).is_some()
    }

    fn push_with(&mut self, node: &Rc<SearchNode<S, A>>, priority: P) {
        self.inner.push(QueueItem(Rc::clone(node)), priority);
    }

    fn pop(&mut self) -> Option<Rc<SearchNode<S, A>>> {
        self.inner.pop().map(|(item, _)| item.0)
    }
}

impl<S: Eq + Hash, A> NodeQueue<S, A, UnachievedPriority> {
    pub fn insert(&mut self, node: &Rc<SearchNode<S, A>>) {
        let priority = unachieved_priority(node);
        self.push_with(node, priority);
    }

    pub fn next(&mut self) -> Option<Rc<SearchNode<S, A>>> {
        self.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unachieved_queue_prefers_fewest_unachieved_then_lowest_g() {
        let mut queue: NodeQueue<&str, u32, UnachievedPriority> = NodeQueue::default();
        let a = SearchNode::<&str, u32>::root("a", 1);
        a.set_unachieved_subgoals(3);
        let b = SearchNode::<&str, u32>::root("b", 2);
        b.set_unachieved_subgoals(1);
        queue.insert(&a);
        queue.insert(&b);
        assert_eq!(queue.next().unwrap().gen_order, 2);
        assert_eq!(queue.next().unwrap().gen_order, 1);
    }

    #[test]
    fn unachieved_queue_prefers_w_g_one_as_tiebreak() {
        let mut queue: NodeQueue<&str, u32, UnachievedPriority> = NodeQueue::default();
        let a = SearchNode::<&str, u32>::root("a", 1);
        a.set_unachieved_subgoals(1);
        a.set_w_g(WidthTag::GTOne);
        let b = SearchNode::<&str, u32>::root("b", 2);
        b.set_unachieved_subgoals(1);
        b.set_w_g(WidthTag::One);
        queue.insert(&a);
        queue.insert(&b);
        assert_eq!(queue.next().unwrap().gen_order, 2);
    }

    #[test]
    fn queue_item_identity_follows_state_not_gen_order() {
        let mut queue: NodeQueue<&str, u32, UnachievedPriority> = NodeQueue::default();
        let a = SearchNode::<&str, u32>::root("same-state", 1);
        let b = SearchNode::<&str, u32>::root("same-state", 2);
        queue.insert(&a);
        assert!(queue.contains(&b));
    }

    #[test]
    fn contains_reflects_membership() {
        let mut queue: NodeQueue<&str, u32, UnachievedPriority> = NodeQueue::default();
        let a = SearchNode::<&str, u32>::root("a", 1);
        assert!(!queue.contains(&a));
        queue.insert(&a);
        assert!(queue.contains(&a));
        queue.next();
        assert!(!queue.contains(&a));
    }
}
