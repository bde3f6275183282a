//! A tiny synthetic [`StateModel`]/[`FeatureSet`] pair used by unit tests
//! across `iw`/`sbfws`, standing in for the PDDL-backed models this crate's
//! external interfaces are meant to wrap.
//!
//! State is a fixed-size vector of independent boolean switches; each action
//! flips one switch from false to true; the goal is every switch true, with
//! subgoal `i` being "switch `i` is true". Actions are irreversible, so the
//! reachable state space is exactly the subset lattice over the switches.

use crate::model::{FeatureSet, FeatureValue, FeatureVector, RewardFunction, StateModel};

#[derive(Debug, Clone)]
pub struct SwitchModel {
    num_switches: usize,
}

impl SwitchModel {
    pub fn new(num_switches: usize) -> Self {
        Self { num_switches }
    }
}

impl StateModel for SwitchModel {
    type State = Vec<bool>;
    type ActionId = usize;

    fn init(&self) -> Self::State {
        vec![false; self.num_switches]
    }

    fn applicable_actions(&self, state: &Self::State, _enforce_constraints: bool) -> Vec<Self::ActionId> {
        (0..self.num_switches).filter(|&i| !state[i]).collect()
    }

    fn next(&self, state: &Self::State, action: Self::ActionId) -> Self::State {
        let mut next = state.clone();
        next[action] = true;
        next
    }

    fn goal(&self, state: &Self::State) -> bool {
        state.iter().all(|&b| b)
    }

    fn goal_atom(&self, state: &Self::State, subgoal_index: usize) -> bool {
        state[subgoal_index]
    }

    fn num_subgoals(&self) -> usize {
        self.num_switches
    }

    fn get_tuple_index(&self) -> usize {
        self.num_switches
    }
}

/// The atom-indicator feature set for [`SwitchModel`]: feature `i` is `1` iff
/// switch `i` is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchFeatures;

impl FeatureSet<Vec<bool>> for SwitchFeatures {
    fn evaluate(&self, state: &Vec<bool>) -> FeatureVector {
        state
            .iter()
            .map(|&b| b as FeatureValue)
            .collect::<Vec<_>>()
            .into()
    }
}

/// Rewards `1.0` for reaching the fully-on state, `0.0` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalReward;

impl RewardFunction<Vec<bool>> for GoalReward {
    fn evaluate(&self, state: &Vec<bool>) -> f64 {
        if state.iter().all(|&b| b) {
            1.0
        } else {
            0.0
        }
    }
}
