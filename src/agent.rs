//! Per-decision entry point
//!
//! A [`SearchAgent`] builds a fresh tree for every observation it is asked
//! about and publishes its current best action to a [`BestActionSlot`] after
//! every playout, so a caller on another thread can read a usable answer
//! whenever its own deadline fires.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::{
    config::{SearchConfig, SearchVariant},
    exhaustive::FixedDepthTree,
    forward_model::ForwardModel,
    mcts::{MCTree, SearchPhase},
    observation::{Action, Observation},
    reward::RewardModel,
    Result, SearchError,
};

/// Shared cell holding the latest best action
///
/// Cloning shares the cell. Reads never block the search.
#[derive(Debug, Clone)]
pub struct BestActionSlot(Arc<AtomicU8>);

impl BestActionSlot {
    pub fn new(action: Action) -> Self {
        BestActionSlot(Arc::new(AtomicU8::new(action.index() as u8)))
    }

    pub fn store(&self, action: Action) {
        self.0.store(action.index() as u8, Ordering::Release);
    }

    pub fn load(&self) -> Action {
        Action::from_index(self.0.load(Ordering::Acquire) as usize).unwrap_or(Action::Stop)
    }
}

impl Default for BestActionSlot {
    fn default() -> Self {
        Self::new(Action::Stop)
    }
}

/// Chooses one action per observation under a time budget
pub struct SearchAgent {
    config: SearchConfig,
    model: Arc<dyn ForwardModel>,
    reward_model: RewardModel,
    slot: BestActionSlot,
}

impl SearchAgent {
    pub fn new(config: SearchConfig, model: Arc<dyn ForwardModel>) -> Self {
        SearchAgent {
            config,
            model,
            reward_model: RewardModel::default(),
            slot: BestActionSlot::default(),
        }
    }

    pub fn with_reward_model(mut self, reward_model: RewardModel) -> Self {
        self.reward_model = reward_model;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Handle to the cell updated after every playout
    pub fn best_action_slot(&self) -> BestActionSlot {
        self.slot.clone()
    }

    /// Searches from `observation` for at most `time_budget` and returns the
    /// best action found
    ///
    /// The first entry of `action_space` is the fallback: it is returned when
    /// the search settles on an action outside `action_space`.
    pub fn decide(
        &mut self,
        observation: &Observation,
        action_space: &[Action],
        time_budget: Duration,
    ) -> Result<Action> {
        let Some(&fallback) = action_space.first() else {
            return Err(SearchError::InvalidConfiguration(
                "action space is empty".to_string(),
            ));
        };
        self.slot.store(fallback);
        let deadline = Instant::now() + time_budget;

        let result = match self.config.variant {
            SearchVariant::BestFirst => self.search_best_first(observation, deadline),
            SearchVariant::FixedDepth => self.search_fixed_depth(observation),
        };
        let chosen = result.map_err(|err| {
            warn!("Search failed: {}", err);
            err
        })?;

        if !action_space.contains(&chosen) {
            warn!(
                "Search chose {:?} outside the action space, falling back to {:?}",
                chosen, fallback
            );
            self.slot.store(fallback);
            return Ok(fallback);
        }
        self.slot.store(chosen);
        Ok(chosen)
    }

    fn search_fixed_depth(&self, observation: &Observation) -> Result<Action> {
        let mut tree = FixedDepthTree::with_reward_model(
            observation.clone(),
            self.config.clone(),
            self.model.clone(),
            self.reward_model.clone(),
        )?;
        tree.run()
    }

    fn search_best_first(&self, observation: &Observation, deadline: Instant) -> Result<Action> {
        let mut tree = MCTree::with_reward_model(
            observation.clone(),
            self.config.clone(),
            self.model.clone(),
            self.reward_model.clone(),
        )?;
        self.slot.store(tree.best_action());

        let mut phase = tree.phase();
        while phase != SearchPhase::Terminated && Instant::now() < deadline {
            phase = tree.step()?;
            self.slot.store(tree.best_action());
        }

        let stats = tree.get_statistics();
        if stats.iterations == 0 && tree.root().can_expand() {
            warn!("No playout completed before the deadline");
        }
        debug!(
            "Decided {:?} after {} playouts ({} nodes)",
            tree.best_action(),
            stats.iterations,
            stats.tree_size
        );
        Ok(tree.best_action())
    }
}
