//! Bounded-turn best-first search
//!
//! [`MCTree`] grows one decision's tree a playout at a time. Each playout
//! descends `depth` levels from the root, drawing fresh children or
//! revisiting existing ones by UCB, always ends on a fresh leaf, and backs the
//! leaf's reward up to the root. A per-action estimate is kept ordered after
//! every playout, so [`MCTree::best_action`] is valid at any point.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    config::SearchConfig,
    forward_model::ForwardModel,
    observation::{Action, Observation},
    policy::{
        backpropagation::BackupMode,
        selection::{SelectionPolicy, UcbPolicy},
    },
    reward::RewardModel,
    stats::SearchStatistics,
    tree::{NodeContext, NodePath, PathStep, SearchNode},
    Result,
};

/// Where the search loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Between playouts; safe to stop and read the best action
    Idle,
    Expanding,
    Backpropagating,
    /// Budget spent or nothing left to learn
    Terminated,
}

/// Current estimate for one top-level action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionStat {
    pub action: Action,
    pub reward: f64,
    /// Children of the root backing the estimate
    pub samples: usize,
}

/// Creates the tree's random source from the configured seed
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Uniformly picks one of the top-rated stats; `stats` must be sorted by
/// descending reward
pub(crate) fn pick_best<R: Rng + ?Sized>(stats: &[ActionStat], rng: &mut R) -> Option<Action> {
    let top = stats.first()?.reward;
    let tied: Vec<Action> = stats
        .iter()
        .take_while(|stat| stat.reward == top)
        .map(|stat| stat.action)
        .collect();
    tied.choose(rng).copied()
}

/// The best-first search tree for one decision
pub struct MCTree {
    root: SearchNode,

    config: SearchConfig,

    model: Arc<dyn ForwardModel>,

    reward_model: RewardModel,

    /// Policy for choosing which existing child a playout revisits
    selection_policy: Box<dyn SelectionPolicy>,

    /// Kept sorted by descending reward
    action_stats: Vec<ActionStat>,

    best_action: Action,

    phase: SearchPhase,

    rng: StdRng,

    statistics: SearchStatistics,
}

impl MCTree {
    /// Creates a tree rooted at `observation` with the default reward model
    pub fn new(
        observation: Observation,
        config: SearchConfig,
        model: Arc<dyn ForwardModel>,
    ) -> Result<Self> {
        Self::with_reward_model(observation, config, model, RewardModel::default())
    }

    /// Creates a tree rooted at `observation`
    ///
    /// Fails if the configuration is invalid or the searching agent cannot be
    /// identified in `observation`.
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

        let action_stats: Vec<ActionStat> = root
            .actions()
            .into_iter()
            .map(|action| ActionStat {
                action,
                reward: 0.0,
                samples: 0,
            })
            .collect();
        let best_action = pick_best(&action_stats, &mut rng).unwrap_or(Action::Stop);
        let phase = if root.can_expand() {
            SearchPhase::Idle
        } else {
            SearchPhase::Terminated
        };

        debug!(
            "New tree for {}: mode {:?}, actions {:?}",
            root.adapter().me(),
            root.mode,
            root.actions()
        );

        Ok(MCTree {
            selection_policy: Box::new(UcbPolicy::new(config.exploration_scalar)),
            root,
            config,
            model,
            reward_model,
            action_stats,
            best_action,
            phase,
            rng,
            statistics: SearchStatistics::new(),
        })
    }

    /// Sets the selection policy to use
    pub fn with_selection_policy<P: SelectionPolicy + 'static>(mut self, policy: P) -> Self {
        self.selection_policy = Box::new(policy);
        self
    }

    pub fn root(&self) -> &SearchNode {
        &self.root
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// The current best top-level action
    ///
    /// Valid at every point of the search; repeated calls without an
    /// intervening playout return the same action.
    pub fn best_action(&self) -> Action {
        self.best_action
    }

    /// Per-action estimates, best first
    pub fn action_stats(&self) -> &[ActionStat] {
        &self.action_stats
    }

    /// Returns the search statistics
    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    fn budget_spent(&self) -> bool {
        self.statistics.iterations >= self.config.max_turns
            || self.root.exhausted
            || !self.root.can_expand()
    }

    fn terminate(&mut self) -> SearchPhase {
        self.statistics.exhausted = self.root.exhausted;
        self.phase = SearchPhase::Terminated;
        self.phase
    }

    /// Runs a single playout
    ///
    /// Returns the phase afterwards: `Idle` if more playouts can follow,
    /// `Terminated` otherwise.
    pub fn step(&mut self) -> Result<SearchPhase> {
        if self.phase == SearchPhase::Terminated || self.budget_spent() {
            return Ok(self.terminate());
        }

        self.phase = SearchPhase::Expanding;
        let path = match self.select_and_expand() {
            Ok(path) => path,
            Err(err) => {
                self.terminate();
                return Err(err);
            }
        };
        if path.is_empty() {
            return Ok(self.terminate());
        }

        self.phase = SearchPhase::Backpropagating;
        self.backpropagate(&path);
        self.statistics.iterations += 1;
        trace!("Playout {} along {}", self.statistics.iterations, path);

        if self.budget_spent() {
            return Ok(self.terminate());
        }
        self.phase = SearchPhase::Idle;
        Ok(self.phase)
    }

    /// Runs playouts until the turn budget, the configured time limit, or
    /// exhaustion ends the search, and returns the best action
    pub fn run(&mut self) -> Result<Action> {
        let deadline = self.config.max_time.map(|limit| Instant::now() + limit);
        self.run_until(deadline)
    }

    /// Like [`run`](Self::run), additionally stopping at `deadline`
    pub fn run_until(&mut self, deadline: Option<Instant>) -> Result<Action> {
        let start = Instant::now();
        while self.phase != SearchPhase::Terminated {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                self.statistics.stopped_early = true;
                debug!("Search stopped early due to time limit");
                break;
            }
            self.step()?;
        }
        self.statistics.total_time += start.elapsed();
        debug!(
            "Search finished after {} playouts: {:?}",
            self.statistics.iterations, self.best_action
        );
        Ok(self.best_action)
    }

    /// Descends from the root, drawing or revisiting one child per level
    fn select_and_expand(&mut self) -> Result<NodePath> {
        let MCTree {
            root,
            config,
            model,
            reward_model,
            selection_policy,
            rng,
            statistics,
            ..
        } = self;
        let ctx = NodeContext {
            model: &**model,
            reward_model,
            opponents: &config.opponent_model,
        };
        let leaf_depth = config.depth;

        let mut path = NodePath::new();
        let mut node: &mut SearchNode = root;

        while path.len() < leaf_depth && node.can_expand() {
            // The last level always takes a never-visited leaf.
            let is_last = path.len() + 1 == leaf_depth;
            // A drained branch stays open while a child below it is.
            let open: Vec<usize> = (0..node.branches.len())
                .filter(|&b| node.remaining(b) > 0 || (!is_last && node.has_open_children(b)))
                .collect();
            let Some(&branch) = open.choose(rng) else {
                break;
            };

            let can_draw = node.remaining(branch) > 0;
            let can_revisit = !is_last && node.has_open_children(branch);
            let revisit = can_revisit && (!can_draw || rng.gen_bool(config.revisit_probability));

            let child = if revisit {
                selection_policy.select_child(node, branch)
            } else {
                let created = node.expand(branch, &ctx, rng)?;
                if created.is_some() {
                    statistics.forward_steps += 1;
                    statistics.tree_size += 1;
                }
                created
            };
            let Some(child) = child else {
                break;
            };

            path.push(branch, child);
            statistics.max_depth = statistics.max_depth.max(path.len());
            node = &mut node.branches[branch].children[child];
        }

        Ok(path)
    }

    /// Backs the leaf at the end of `path` up to the root
    fn backpropagate(&mut self, path: &NodePath) {
        backup(
            &mut self.root,
            &path.steps,
            self.config.backup_mode,
            self.config.depth,
        );
        if let Some(branch) = path.first_branch() {
            self.update_action_stat(branch);
        }
    }

    fn update_action_stat(&mut self, branch: usize) {
        let Some(b) = self.root.branches.get(branch) else {
            return;
        };
        let values = b.child_values();
        if let Some(value) = self.config.backup_mode.action_value(&values) {
            if let Some(stat) = self.action_stats.iter_mut().find(|s| s.action == b.action) {
                stat.reward = value;
                stat.samples = values.len();
            }
        }
        self.action_stats.sort_by(|a, b| b.reward.total_cmp(&a.reward));
        if let Some(best) = pick_best(&self.action_stats, &mut self.rng) {
            self.best_action = best;
        }
    }

    /// Returns a visualization of the search tree
    pub fn visualize_tree(&self) -> String {
        let mut result = String::new();
        Self::visualize_node(&self.root, None, 0, &mut result);
        result
    }

    fn visualize_node(node: &SearchNode, action: Option<Action>, depth: usize, output: &mut String) {
        let indent = "  ".repeat(depth);
        let label = match action {
            Some(action) => format!("{:?}", action),
            None => "Root".to_string(),
        };

        output.push_str(&format!(
            "{}{} [{:?}] (visits: {}, reward: {:.2}, value: {:.2})\n",
            indent, label, node.mode, node.visits, node.reward, node.aggregate
        ));

        for branch in &node.branches {
            for child in &branch.children {
                Self::visualize_node(child, Some(branch.action), depth + 1, output);
            }
        }
    }
}

/// Recursively backs values up along `steps`, deepest node first
fn backup(node: &mut SearchNode, steps: &[PathStep], mode: BackupMode, leaf_depth: usize) {
    match steps.split_first() {
        None if node.children_count() == 0 => node.mark_leaf(),
        None => {
            node.visits += 1;
            node.update_statistics(mode);
        }
        Some((step, rest)) => {
            let child = &mut node.branches[step.branch].children[step.child];
            backup(child, rest, mode, leaf_depth);
            node.visits += 1;
            node.update_statistics(mode);
        }
    }
    node.refresh_exhausted(leaf_depth);
}
