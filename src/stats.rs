//! Counters for one decision
//!
//! Both tree variants fill a [`SearchStatistics`] as they work, and
//! [`SearchStatistics::summary`] renders it for logs.

use std::time::Duration;

/// What a single search did before it returned an action
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    /// Playouts that reached a leaf and were backed up. The fixed-depth
    /// variant counts its one full sweep as a single playout.
    pub iterations: usize,

    /// Time spent inside playouts
    pub total_time: Duration,

    /// Nodes materialised from joint-action cursors, plus the root
    pub tree_size: usize,

    /// Deepest node reached, counted in simulated ticks below the root
    pub max_depth: usize,

    /// Ticks simulated through the forward model
    pub forward_steps: usize,

    /// Set when the time limit cut the search short
    pub stopped_early: bool,

    /// Set when every path ended at a visited leaf or an Explore node
    pub exhausted: bool,
}

impl SearchStatistics {
    /// Counters for a tree holding only its root
    pub fn new() -> Self {
        SearchStatistics {
            iterations: 0,
            total_time: Duration::from_secs(0),
            tree_size: 1,
            max_depth: 0,
            forward_steps: 0,
            stopped_early: false,
            exhausted: false,
        }
    }

    /// Mean playout cost in microseconds, 0 before the first playout
    pub fn avg_time_per_iteration_us(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total_time.as_micros() as f64 / self.iterations as f64
    }

    /// Playout throughput
    pub fn iterations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.iterations as f64 / self.total_time.as_secs_f64()
    }

    /// Multi-line report for logs
    pub fn summary(&self) -> String {
        format!(
            "Search Statistics:\n\
             - Playouts: {}\n\
             - Total time: {:.3} seconds\n\
             - Tree size: {} nodes\n\
             - Max depth: {}\n\
             - Forward steps: {}\n\
             - Avg time per playout: {:.3} µs\n\
             - Playouts per second: {:.1}\n\
             - Stopped early: {}\n\
             - Exhausted: {}",
            self.iterations,
            self.total_time.as_secs_f64(),
            self.tree_size,
            self.max_depth,
            self.forward_steps,
            self.avg_time_per_iteration_us(),
            self.iterations_per_second(),
            self.stopped_early,
            self.exhausted
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_counters_hold_only_the_root() {
        let stats = SearchStatistics::new();
        assert_eq!(stats.tree_size, 1);
        assert_eq!(stats.avg_time_per_iteration_us(), 0.0);
        assert_eq!(stats.iterations_per_second(), 0.0);
    }

    #[test]
    fn summary_reports_playouts() {
        let stats = SearchStatistics {
            iterations: 4,
            total_time: Duration::from_millis(2),
            tree_size: 9,
            forward_steps: 8,
            ..SearchStatistics::new()
        };
        let summary = stats.summary();
        assert!(summary.contains("Playouts: 4"));
        assert!(summary.contains("Avg time per playout: 500.000 µs"));
        assert!(summary.contains("Forward steps: 8"));
    }
}
