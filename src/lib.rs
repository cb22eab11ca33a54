//! # bomber-mcts
//!
//! A real-time decision engine for an agent in a four-player grid bombing
//! game. Given the agent's current observation, it grows a lazily-expanded
//! search tree over simulated future observations and returns the action
//! that looks best against unknown opponent behaviour.
//!
//! ## Features
//!
//! - Bounded-turn best-first search with an anytime best action
//! - Exhaustive fixed-depth breadth-first variant for small branching factors
//! - Safety-filtered joint-action cursors over visible opponents
//! - Evade / Attack / Explore reward classification without ground truth
//! - Average or adversarial backup of child values
//!
//! ## Basic Usage
//!
//! ```
//! use std::sync::Arc;
//! use bomber_mcts::{
//!     AgentId, Grid, Item, LocalForwardModel, MCTree, Observation, Position, SearchConfig,
//! };
//!
//! fn main() -> Result<(), bomber_mcts::SearchError> {
//!     // A 5x5 open board with us at the centre and an enemy two cells away
//!     let mut board = Grid::filled(5, 5, Item::Passage);
//!     board.set(Position::new(2, 2), Item::Agent(AgentId(0)));
//!     board.set(Position::new(2, 4), Item::Agent(AgentId(1)));
//!
//!     let mut obs = Observation::new(board, Position::new(2, 2));
//!     obs.enemies = vec![AgentId(1), AgentId(2), AgentId(3)];
//!     obs.alive = vec![AgentId(0), AgentId(1)];
//!
//!     let config = SearchConfig::default().with_max_turns(20).with_seed(1);
//!     let mut tree = MCTree::new(obs, config, Arc::new(LocalForwardModel::new()))?;
//!
//!     let action = tree.run()?;
//!     println!("Best action: {:?}", action);
//!     println!("{}", tree.get_statistics().summary());
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! Every decision builds a fresh tree rooted at the live observation:
//!
//! 1. **Classification**: the [`RewardModel`] labels each node Evade, Attack
//!    or Explore. Explore nodes are never branched on.
//!
//! 2. **Expansion**: a node's [`SimulationAdapter`] reconstructs the full
//!    game state, filters every agent's actions for safety, and hands out
//!    one simulated next observation per draw from a shuffled cursor.
//!
//! 3. **Selection**: each playout descends `depth` levels, either drawing a
//!    fresh child or revisiting one chosen by UCB, and always ends on a
//!    fresh leaf.
//!
//! 4. **Backpropagation**: the leaf's reward is rolled up to the root with
//!    the configured [`BackupMode`](policy::backpropagation::BackupMode),
//!    and the per-action estimates answering [`MCTree::best_action`] are
//!    re-ordered.
//!
//! The game engine itself stays outside the crate behind the
//! [`ForwardModel`] trait; [`LocalForwardModel`] is a compact stand-in.

pub mod agent;
pub mod config;
pub mod exhaustive;
pub mod forward_model;
pub mod mcts;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod simulator;
pub mod snapshot;
pub mod stats;
pub mod tree;
pub mod utils;

pub use agent::{BestActionSlot, SearchAgent};
pub use config::{OpponentModel, SearchConfig, SearchVariant};
pub use exhaustive::FixedDepthTree;
pub use forward_model::{ForwardModel, LocalForwardModel};
pub use mcts::{ActionStat, MCTree, SearchPhase};
pub use observation::{Action, AgentId, GameType, Grid, Item, JointAction, Observation, Position};
pub use policy::{BackupMode, SelectionPolicy, UcbPolicy};
pub use reward::{Mode, RewardModel};
pub use simulator::{JointActionCursor, SimulationAdapter};
pub use snapshot::GameStateSnapshot;
pub use stats::SearchStatistics;
pub use tree::{NodePath, SearchNode};

/// Error types for the search
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The searching agent cannot be told apart from its teammate and enemies
    #[error("Cannot identify the searching agent, candidates: {candidates:?}")]
    UnknownSelf {
        candidates: Vec<AgentId>,
    },

    /// The forward model returned no observation for the searching agent
    #[error("Forward model produced no observation for {0}")]
    MissingObservation(AgentId),

    /// Invalid configuration or arguments
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
