//! Fixed-depth exhaustive search
//!
//! [`FixedDepthTree`] enumerates every safe joint action level by level down
//! to a small fixed depth, then averages values bottom-up. There is no turn
//! budget and no UCB; it is only worth running when few agents are visible.

use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom};

use crate::{
    config::SearchConfig,
    forward_model::ForwardModel,
    mcts::{pick_best, seeded_rng, ActionStat},
    observation::{Action, Observation},
    policy::backpropagation::BackupMode,
    reward::RewardModel,
    stats::SearchStatistics,
    tree::{NodeContext, NodePath, SearchNode},
    Result,
};

/// Breadth-first tree enumerated to `config.depth`
pub struct FixedDepthTree {
    root: SearchNode,
    config: SearchConfig,
    model: Arc<dyn ForwardModel>,
    reward_model: RewardModel,
    action_stats: Vec<ActionStat>,
    best_action: Action,
    rng: StdRng,
    statistics: SearchStatistics,
}

impl FixedDepthTree {
    pub fn new(
        observation: Observation,
        config: SearchConfig,
        model: Arc<dyn ForwardModel>,
    ) -> Result<Self> {
        Self::with_reward_model(observation, config, model, RewardModel::default())
    }

    pub fn with_reward_model(
        observation: Observation,
        config: SearchConfig,
        model: Arc<dyn ForwardModel>,
        reward_model: RewardModel,
    ) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let root = {
            let ctx = NodeContext {
                model: &*model,
                reward_model: &reward_model,
                opponents: &config.opponent_model,
            };
            SearchNode::root(observation, &ctx)?
        };
        let best_action = root.actions().choose(&mut rng).copied().unwrap_or(Action::Stop);

        Ok(FixedDepthTree {
            root,
            config,
            model,
            reward_model,
            action_stats: Vec::new(),
            best_action,
            rng,
            statistics: SearchStatistics::new(),
        })
    }

    pub fn root(&self) -> &SearchNode {
        &self.root
    }

    /// Best action of the last [`run`](Self::run); an arbitrary safe action
    /// before that
    pub fn best_action(&self) -> Action {
        self.best_action
    }

    /// Per-action averages of the last run, best first
    pub fn action_stats(&self) -> &[ActionStat] {
        &self.action_stats
    }

    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Enumerates the tree, averages it bottom-up and returns the best action
    pub fn run(&mut self) -> Result<Action> {
        let start = Instant::now();
        self.build()?;
        average_up(&mut self.root);

        self.action_stats = self
            .root
            .branches
            .iter()
            .filter_map(|branch| {
                let values = branch.child_values();
                BackupMode::Average
                    .action_value(&values)
                    .map(|reward| ActionStat {
                        action: branch.action,
                        reward,
                        samples: values.len(),
                    })
            })
            .collect();
        self.action_stats.sort_by(|a, b| b.reward.total_cmp(&a.reward));
        if let Some(best) = pick_best(&self.action_stats, &mut self.rng) {
            self.best_action = best;
        }

        self.statistics.total_time += start.elapsed();
        self.statistics.iterations = 1;
        debug!(
            "Exhaustive search built {} nodes, best {:?}",
            self.statistics.tree_size, self.best_action
        );
        Ok(self.best_action)
    }

    /// Expands every node level by level, breadth first
    fn build(&mut self) -> Result<()> {
        let ctx = NodeContext {
            model: &*self.model,
            reward_model: &self.reward_model,
            opponents: &self.config.opponent_model,
        };

        let mut frontier = vec![NodePath::new()];
        for level in 0..self.config.depth {
            let mut next = Vec::new();
            for path in frontier {
                let Some(node) = self.root.get_mut(&path) else {
                    continue;
                };
                let created = node.expand_all(&ctx, &mut self.rng)?;
                self.statistics.forward_steps += created;
                self.statistics.tree_size += created;
                for (b, branch) in node.branches.iter().enumerate() {
                    for c in 0..branch.children.len() {
                        let mut child_path = path.clone();
                        child_path.push(b, c);
                        next.push(child_path);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            self.statistics.max_depth = level + 1;
            frontier = next;
        }
        Ok(())
    }
}

/// Post-order average over the whole tree
fn average_up(node: &mut SearchNode) {
    for branch in node.branches.iter_mut() {
        for child in branch.children.iter_mut() {
            average_up(child);
        }
    }
    if node.children_count() == 0 {
        node.mark_leaf();
    } else {
        node.visits += 1;
        node.update_statistics(BackupMode::Average);
    }
}
