//! Backup modes for rolling child values into their parent
//!
//! A node's children are grouped by the searching agent's action; within a
//! group they differ only by what the opponents did. The two modes differ in
//! how they treat that opponent branch:
//!
//! - [`BackupMode::Average`] models opponents as stochastic and averages
//!   over every sampled child.
//! - [`BackupMode::Adversarial`] models opponents as hostile: each action is
//!   worth its worst sampled child, and the node is worth its best action.

/// Selects the aggregation applied during backpropagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupMode {
    #[default]
    Average,
    Adversarial,
}

impl BackupMode {
    /// Aggregate and max value of a node from its children's values grouped
    /// by action, each shifted by the node's own incoming reward.
    /// Returns `None` when no group holds a value.
    pub fn aggregate(self, groups: &[Vec<f64>], own_reward: f64) -> Option<(f64, f64)> {
        match self {
            BackupMode::Average => average(groups, own_reward),
            BackupMode::Adversarial => adversarial(groups, own_reward),
        }
    }

    /// Value of one action from the values of its children
    pub fn action_value(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            BackupMode::Average => values.iter().sum::<f64>() / values.len() as f64,
            BackupMode::Adversarial => values.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

fn max_of<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.copied().fold(f64::NEG_INFINITY, f64::max)
}

fn average(groups: &[Vec<f64>], own_reward: f64) -> Option<(f64, f64)> {
    let count: usize = groups.iter().map(Vec::len).sum();
    if count == 0 {
        return None;
    }
    let sum: f64 = groups.iter().flatten().sum();
    let max = max_of(groups.iter().flatten());
    Some((sum / count as f64 + own_reward, max + own_reward))
}

fn adversarial(groups: &[Vec<f64>], own_reward: f64) -> Option<(f64, f64)> {
    let worst_per_action: Vec<f64> = groups
        .iter()
        .filter_map(|values| BackupMode::Adversarial.action_value(values))
        .collect();
    if worst_per_action.is_empty() {
        return None;
    }
    let best = max_of(worst_per_action.iter());
    let max = max_of(groups.iter().flatten());
    Some((best + own_reward, max + own_reward))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_groups_have_no_value() {
        assert_eq!(BackupMode::Average.aggregate(&[vec![], vec![]], 1.0), None);
        assert_eq!(BackupMode::Adversarial.aggregate(&[], 1.0), None);
    }
}
