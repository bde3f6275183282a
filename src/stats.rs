//! Ambient search statistics shared by [`crate::iw::IwEngine`] and
//! [`crate::sbfws::SbfwsEngine`].
//!
//! Grounded on the teacher's `search_engines::search_statistics::SearchStatistics`
//! for the counter-struct shape, and on
//! `search_engines::termination_condition::TerminationCondition` for logging
//! a snapshot through `tracing` rather than printing directly.

use tracing::info;

/// Node counters accumulated over the lifetime of one [`crate::sbfws::SbfwsEngine`]
/// run, including the simulations it launches as a subroutine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfwsStats {
    pub generated_nodes: u64,
    pub generated_nodes_g_decrease: u64,
    pub expanded_nodes: u64,
    pub expanded_nodes_g_decrease: u64,
    pub wg1_nodes: u64,
    pub wgr1_nodes: u64,
    pub wgr2_nodes: u64,
    pub wgr_gt2_nodes: u64,
    pub search_tables_created: u64,
    pub sim_tables_created: u64,
    pub simulations_run: u64,
    pub sim_expanded_nodes: u64,
    pub sim_generated_nodes: u64,
    pub reachable_subgoals: usize,
    pub initial_reward: f64,
    pub best_reward: f64,
}

impl BfwsStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn generation(&mut self) {
        self.generated_nodes += 1;
    }

    pub fn generation_g_decrease(&mut self) {
        self.generated_nodes_g_decrease += 1;
    }

    pub fn expansion(&mut self) {
        self.expanded_nodes += 1;
    }

    pub fn expansion_g_decrease(&mut self) {
        self.expanded_nodes_g_decrease += 1;
    }

    pub fn wg1_node(&mut self) {
        self.wg1_nodes += 1;
    }

    pub fn wgr1_node(&mut self) {
        self.wgr1_nodes += 1;
    }

    pub fn wgr2_node(&mut self) {
        self.wgr2_nodes += 1;
    }

    pub fn wgr_gt2_node(&mut self) {
        self.wgr_gt2_nodes += 1;
    }

    pub fn search_table_created(&mut self) {
        self.search_tables_created += 1;
    }

    pub fn sim_table_created(&mut self) {
        self.sim_tables_created += 1;
    }

    pub fn set_initial_reward(&mut self, reward: f64) {
        self.initial_reward = reward;
        self.best_reward = reward;
    }

    pub fn reward(&mut self, reward: f64) {
        if reward > self.best_reward {
            self.best_reward = reward;
        }
    }

    pub fn generated(&self) -> u64 {
        self.generated_nodes
    }

    /// Folds in the counters produced by one [`crate::iw::IwRunStats`]
    /// simulation, as `IW::report_simulation_stats` does in the original.
    pub fn merge_simulation(&mut self, sim: crate::iw::IwRunStats) {
        self.simulations_run += 1;
        self.sim_expanded_nodes += u64::from(sim.w1_nodes_expanded + sim.w2_nodes_expanded);
        self.sim_generated_nodes += u64::from(
            sim.w1_nodes_generated + sim.w2_nodes_generated + sim.w_gt2_nodes_generated,
        );
        self.reachable_subgoals = sim.reachable_subgoals;
    }

    pub fn log_summary(&self) {
        info!(
            generated_nodes = self.generated_nodes,
            expanded_nodes = self.expanded_nodes,
            wg1_nodes = self.wg1_nodes,
            wgr1_nodes = self.wgr1_nodes,
            wgr2_nodes = self.wgr2_nodes,
            wgr_gt2_nodes = self.wgr_gt2_nodes,
            simulations_run = self.simulations_run,
            initial_reward = self.initial_reward,
            best_reward = self.best_reward,
            "search finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_tracks_running_maximum() {
        let mut stats = BfwsStats::new();
        stats.set_initial_reward(1.0);
        stats.reward(0.5);
        assert_eq!(stats.best_reward, 1.0);
        stats.reward(2.0);
        assert_eq!(stats.best_reward, 2.0);
    }

    #[test]
    fn reset_clears_every_counter() {
        let mut stats = BfwsStats::new();
        stats.generation();
        stats.expansion();
        stats.reset();
        assert_eq!(stats.generated_nodes, 0);
        assert_eq!(stats.expanded_nodes, 0);
    }
}
