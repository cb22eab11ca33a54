//! Tree data structures for the search
//!
//! A [`SearchNode`] owns its children outright, grouped by the searching
//! agent's action. Nodes hold no parent pointer; a playout remembers the
//! [`NodePath`] it took from the root and walks it again to back values up.

use std::fmt;

use rand::Rng;

use crate::{
    config::OpponentModel,
    forward_model::ForwardModel,
    observation::{Action, Observation},
    policy::backpropagation::BackupMode,
    reward::{Mode, RewardModel},
    simulator::{JointActionCursor, SimulationAdapter},
    Result,
};

/// Collaborators a node needs to create children
#[derive(Clone, Copy)]
pub struct NodeContext<'a> {
    pub model: &'a dyn ForwardModel,
    pub reward_model: &'a RewardModel,
    pub opponents: &'a OpponentModel,
}

/// Children reached by one action of the searching agent
#[derive(Debug)]
pub struct ActionBranch {
    pub action: Action,

    /// Materialised on the first draw
    cursor: Option<JointActionCursor>,

    pub children: Vec<SearchNode>,
}

impl ActionBranch {
    fn new(action: Action) -> Self {
        ActionBranch {
            action,
            cursor: None,
            children: Vec::new(),
        }
    }

    /// Aggregates of the children that have been backed up at least once
    pub fn child_values(&self) -> Vec<f64> {
        self.children
            .iter()
            .filter(|child| child.visited)
            .map(|child| child.aggregate)
            .collect()
    }
}

/// A node in the search tree
///
/// Each node wraps one simulated observation, the reward earned on the way
/// in, and a lazily-drawn branch per safe action of the searching agent.
#[derive(Debug)]
pub struct SearchNode {
    pub observation: Observation,

    /// Classification of this node's observation; selects how its children
    /// are scored
    pub mode: Mode,

    /// Reward of the transition that produced this node
    pub reward: f64,

    pub branches: Vec<ActionBranch>,

    adapter: SimulationAdapter,

    /// Set once a playout has backed a value up through this node
    pub visited: bool,

    pub visits: u64,

    pub aggregate: f64,

    pub max_reward: f64,

    /// Depth of this node in the tree (root = 0)
    pub depth: usize,

    /// No playout through this node can add new information
    pub exhausted: bool,
}

impl SearchNode {
    /// Creates a node for `observation`, reached with `reward`
    pub fn new(
        observation: Observation,
        reward: f64,
        depth: usize,
        ctx: &NodeContext<'_>,
    ) -> Result<Self> {
        let adapter = SimulationAdapter::construct(&observation, ctx.opponents)?;
        let mode = ctx.reward_model.classify(&observation);
        let branches = adapter
            .legal_actions_for(adapter.me())
            .iter()
            .copied()
            .map(ActionBranch::new)
            .collect();

        Ok(SearchNode {
            observation,
            mode,
            reward,
            branches,
            adapter,
            visited: false,
            visits: 0,
            aggregate: 0.0,
            max_reward: f64::NEG_INFINITY,
            depth,
            exhausted: mode == Mode::Explore,
        })
    }

    /// Creates the root node of a decision
    pub fn root(observation: Observation, ctx: &NodeContext<'_>) -> Result<Self> {
        Self::new(observation, 0.0, 0, ctx)
    }

    pub fn adapter(&self) -> &SimulationAdapter {
        &self.adapter
    }

    /// Safe actions of the searching agent, in branch order
    pub fn actions(&self) -> Vec<Action> {
        self.branches.iter().map(|b| b.action).collect()
    }

    pub fn branch_index(&self, action: Action) -> Option<usize> {
        self.branches.iter().position(|b| b.action == action)
    }

    /// Explore nodes carry no reward signal and are never branched on
    pub fn can_expand(&self) -> bool {
        self.mode != Mode::Explore
    }

    /// Number of joint actions still undrawn for `branch`
    pub fn remaining(&self, branch: usize) -> usize {
        let Some(b) = self.branches.get(branch) else {
            return 0;
        };
        match &b.cursor {
            Some(cursor) => cursor.remaining(),
            None => self.adapter.joint_action_count(b.action),
        }
    }

    /// True when no branch can produce another child
    pub fn is_fully_expanded(&self) -> bool {
        !self.can_expand() || (0..self.branches.len()).all(|b| self.remaining(b) == 0)
    }

    /// True when `branch` has a child whose subtree is not exhausted
    pub fn has_open_children(&self, branch: usize) -> bool {
        self.branches
            .get(branch)
            .map_or(false, |b| b.children.iter().any(|child| !child.exhausted))
    }

    /// Draws one joint action for `branch`, simulates it and appends the
    /// resulting child. Returns the child's index within the branch, or
    /// `None` when the branch is drained or the node refuses to expand.
    pub fn expand<R: Rng + ?Sized>(
        &mut self,
        branch: usize,
        ctx: &NodeContext<'_>,
        rng: &mut R,
    ) -> Result<Option<usize>> {
        if !self.can_expand() {
            return Ok(None);
        }
        let Some(b) = self.branches.get_mut(branch) else {
            return Ok(None);
        };
        let adapter = &self.adapter;
        let action = b.action;
        let cursor = b
            .cursor
            .get_or_insert_with(|| adapter.enumerate_joint_actions(action, rng));
        let Some(joint) = cursor.next() else {
            return Ok(None);
        };

        let next_obs = adapter.step(ctx.model, &joint)?;
        let reward = ctx.reward_model.score(&next_obs, self.mode);
        let child = SearchNode::new(next_obs, reward, self.depth + 1, ctx)?;
        b.children.push(child);
        Ok(Some(b.children.len() - 1))
    }

    /// Expands one child under `action`
    pub fn expand_action<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        ctx: &NodeContext<'_>,
        rng: &mut R,
    ) -> Result<Option<usize>> {
        match self.branch_index(action) {
            Some(branch) => self.expand(branch, ctx, rng),
            None => Ok(None),
        }
    }

    /// Drains every branch, returning the number of children created
    pub fn expand_all<R: Rng + ?Sized>(
        &mut self,
        ctx: &NodeContext<'_>,
        rng: &mut R,
    ) -> Result<usize> {
        let mut created = 0;
        for branch in 0..self.branches.len() {
            while self.expand(branch, ctx, rng)?.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Records a playout ending at this node: its value is its own reward
    pub fn mark_leaf(&mut self) {
        self.visited = true;
        self.visits += 1;
        self.aggregate = self.reward;
        self.max_reward = self.reward;
    }

    /// Recomputes `(aggregate, max)` from the direct children only
    ///
    /// A node with no backed-up children keeps its own reward.
    pub fn update_statistics(&mut self, mode: BackupMode) -> (f64, f64) {
        let groups: Vec<Vec<f64>> = self.branches.iter().map(ActionBranch::child_values).collect();
        let (aggregate, max) = mode
            .aggregate(&groups, self.reward)
            .unwrap_or((self.reward, self.reward));
        self.visited = true;
        self.aggregate = aggregate;
        self.max_reward = max;
        (aggregate, max)
    }

    /// Re-derives the exhausted flag for a tree whose leaves sit at
    /// `leaf_depth`
    pub fn refresh_exhausted(&mut self, leaf_depth: usize) {
        self.exhausted = (self.depth >= leaf_depth && self.visited)
            || !self.can_expand()
            || (self.is_fully_expanded()
                && self
                    .branches
                    .iter()
                    .all(|b| b.children.iter().all(|child| child.exhausted)));
    }

    /// Follows `path` from this node
    pub fn get(&self, path: &NodePath) -> Option<&SearchNode> {
        path.steps.iter().try_fold(self, |node, step| {
            node.branches.get(step.branch)?.children.get(step.child)
        })
    }

    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut SearchNode> {
        path.steps.iter().try_fold(self, |node, step| {
            node.branches.get_mut(step.branch)?.children.get_mut(step.child)
        })
    }

    pub fn children_count(&self) -> usize {
        self.branches.iter().map(|b| b.children.len()).sum()
    }

    /// Number of nodes in this subtree, itself included
    pub fn subtree_size(&self) -> usize {
        1 + self
            .branches
            .iter()
            .flat_map(|b| &b.children)
            .map(SearchNode::subtree_size)
            .sum::<usize>()
    }
}

/// One hop in a [`NodePath`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    /// Index into the parent's branches
    pub branch: usize,
    /// Index into that branch's children
    pub child: usize,
}

/// Represents a path through the tree
///
/// A path is a sequence of steps that can be used to navigate from
/// the root node to a specific node in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    pub steps: Vec<PathStep>,
}

impl NodePath {
    /// Creates a new empty path (pointing to the root)
    pub fn new() -> Self {
        NodePath { steps: Vec::new() }
    }

    /// Extends the path with a new step
    pub fn push(&mut self, branch: usize, child: usize) {
        self.steps.push(PathStep { branch, child });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The root branch this path starts with
    pub fn first_branch(&self) -> Option<usize> {
        self.steps.first().map(|step| step.branch)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path[")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}.{}", step.branch, step.child)?;
        }
        write!(f, "]")
    }
}
