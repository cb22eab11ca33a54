//! Utility functions for the search
//!
//! This module contains the UCB terms used by selection.

/// Exploration term of the UCB bound
///
/// `scalar * sqrt(2 * ln(parent_visits) / child_visits)`, infinite for an
/// unvisited child.
pub fn exploration_term(parent_visits: u64, child_visits: u64, scalar: f64) -> f64 {
    if child_visits == 0 {
        return f64::INFINITY;
    }
    let parent = parent_visits.max(1) as f64;
    scalar * (2.0 * parent.ln() / child_visits as f64).sqrt()
}

/// UCB value of a child whose exploitation term is `reward`
pub fn ucb_value(reward: f64, child_visits: u64, parent_visits: u64, scalar: f64) -> f64 {
    if child_visits == 0 {
        return f64::INFINITY;
    }
    reward + exploration_term(parent_visits, child_visits, scalar)
}
