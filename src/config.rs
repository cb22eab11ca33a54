//! Configuration options for the search
//!
//! This module defines the parameters that control how the search tree is
//! grown and how opponents are modelled.

use std::time::Duration;

use crate::{policy::backpropagation::BackupMode, SearchError};

/// Which tree variant a [`SearchAgent`](crate::agent::SearchAgent) builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchVariant {
    /// Bounded-turn best-first search with UCB revisits
    ///
    /// Anytime: a best action is available after every playout.
    BestFirst,

    /// Exhaustive breadth-first enumeration to a fixed depth
    ///
    /// Only tractable when few agents are visible.
    FixedDepth,
}

/// Worst-case attributes assumed for every agent other than the searching one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentModel {
    /// Bombs an opponent may still lay
    pub ammo: u32,
    pub blast_strength: u32,
    pub can_kick: bool,
}

impl Default for OpponentModel {
    fn default() -> Self {
        OpponentModel {
            ammo: 10,
            blast_strength: 7,
            can_kick: true,
        }
    }
}

/// Configuration for the search
///
/// Use the builder methods to create a customized configuration.
///
/// # Example
///
/// ```
/// use bomber_mcts::SearchConfig;
/// use bomber_mcts::policy::backpropagation::BackupMode;
///
/// let config = SearchConfig::default()
///     .with_depth(3)
///     .with_max_turns(500)
///     .with_backup_mode(BackupMode::Adversarial)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of levels below the root each playout descends
    pub depth: usize,

    /// Maximum number of playouts for best-first search
    pub max_turns: usize,

    /// Optional wall-clock limit checked between playouts
    pub max_time: Option<Duration>,

    /// Scalar on the UCB exploration term, 1/sqrt(2) by default
    pub exploration_scalar: f64,

    /// Chance of revisiting an existing child instead of drawing a new one
    pub revisit_probability: f64,

    pub backup_mode: BackupMode,

    pub variant: SearchVariant,

    pub opponent_model: OpponentModel,

    /// Seed for shuffles and tie-breaks; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: 2,
            max_turns: 200,
            max_time: None,
            exploration_scalar: std::f64::consts::FRAC_1_SQRT_2,
            revisit_probability: 0.5,
            backup_mode: BackupMode::Average,
            variant: SearchVariant::BestFirst,
            opponent_model: OpponentModel::default(),
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Sets the playout depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the playout budget
    pub fn with_max_turns(mut self, turns: usize) -> Self {
        self.max_turns = turns;
        self
    }

    pub fn with_max_time(mut self, duration: Duration) -> Self {
        self.max_time = Some(duration);
        self
    }

    pub fn with_exploration_scalar(mut self, scalar: f64) -> Self {
        self.exploration_scalar = scalar;
        self
    }

    pub fn with_revisit_probability(mut self, probability: f64) -> Self {
        self.revisit_probability = probability;
        self
    }

    /// Sets how child values are rolled up into their parent
    pub fn with_backup_mode(mut self, mode: BackupMode) -> Self {
        self.backup_mode = mode;
        self
    }

    pub fn with_variant(mut self, variant: SearchVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_opponent_model(mut self, model: OpponentModel) -> Self {
        self.opponent_model = model;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects configurations the search cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.depth == 0 {
            return Err(SearchError::InvalidConfiguration(
                "depth must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.revisit_probability) {
            return Err(SearchError::InvalidConfiguration(format!(
                "revisit probability {} is outside [0, 1]",
                self.revisit_probability
            )));
        }
        if !self.exploration_scalar.is_finite() || self.exploration_scalar < 0.0 {
            return Err(SearchError::InvalidConfiguration(format!(
                "exploration scalar {} must be finite and non-negative",
                self.exploration_scalar
            )));
        }
        Ok(())
    }
}
