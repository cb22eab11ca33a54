//! Selection policies for revisiting existing children
//!
//! When a playout decides to revisit rather than draw a new child, the
//! selection policy picks which of an action's children to descend into.

use crate::{tree::SearchNode, utils};

/// Trait for policies that pick an existing child to revisit
pub trait SelectionPolicy: Send + Sync {
    /// Picks a child of `node` under action branch `branch`, skipping
    /// children whose subtree is exhausted. `None` if there is none.
    fn select_child(&self, node: &SearchNode, branch: usize) -> Option<usize>;

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn SelectionPolicy>;
}

/// Upper confidence bound selection
///
/// ```text
/// UCB = incoming_reward + scalar * sqrt(2 * ln(parent_visits) / child_visits)
/// ```
///
/// The exploitation term is the child's own incoming reward rather than its
/// aggregate, so a revisit prefers states that look good right away.
/// The default scalar is 1/sqrt(2).
#[derive(Debug, Clone)]
pub struct UcbPolicy {
    pub exploration_scalar: f64,
}

impl UcbPolicy {
    pub fn new(exploration_scalar: f64) -> Self {
        UcbPolicy { exploration_scalar }
    }

    /// Calculates the UCB value of a child
    pub fn ucb_value(&self, reward: f64, child_visits: u64, parent_visits: u64) -> f64 {
        utils::ucb_value(reward, child_visits, parent_visits, self.exploration_scalar)
    }
}

impl Default for UcbPolicy {
    fn default() -> Self {
        Self::new(std::f64::consts::FRAC_1_SQRT_2)
    }
}

impl SelectionPolicy for UcbPolicy {
    fn select_child(&self, node: &SearchNode, branch: usize) -> Option<usize> {
        let children = &node.branches.get(branch)?.children;
        let mut best: Option<(usize, f64)> = None;

        for (i, child) in children.iter().enumerate() {
            if child.exhausted {
                continue;
            }
            let value = self.ucb_value(child.reward, child.visits, node.visits);
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((i, value));
            }
        }

        best.map(|(i, _)| i)
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        Box::new(self.clone())
    }
}

impl SelectionPolicy for Box<dyn SelectionPolicy> {
    fn select_child(&self, node: &SearchNode, branch: usize) -> Option<usize> {
        (**self).select_child(node, branch)
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        (**self).clone_box()
    }
}
