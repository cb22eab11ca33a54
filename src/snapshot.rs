//! Full game-state snapshots exchanged with the forward model
//!
//! A [`GameStateSnapshot`] is the adapter's reconstruction of every agent,
//! bomb, flame and item from a single [`Observation`](crate::Observation).

use std::collections::BTreeMap;

use crate::observation::{AgentId, GameType, Grid, Item, Position};

/// Initial fuse of a freshly laid bomb
pub const BOMB_LIFE: u8 = 9;

/// Ticks a flame stays on the board
pub const FLAME_LIFE: u8 = 3;

/// Reconstructed state of one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    pub id: AgentId,
    pub position: Position,
    pub ammo: u32,
    pub blast_strength: u32,
    pub can_kick: bool,
    pub is_alive: bool,
    /// Whether the agent was found on the observed board
    pub visible: bool,
}

/// A bomb on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BombState {
    pub owner: Option<AgentId>,
    pub position: Position,
    pub life: u8,
    pub blast_strength: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlameState {
    pub position: Position,
    pub life: u8,
}

/// Everything the forward model needs to advance the game one tick
#[derive(Debug, Clone, PartialEq)]
pub struct GameStateSnapshot {
    pub board: Grid<Item>,
    pub agents: Vec<AgentState>,
    pub bombs: Vec<BombState>,
    pub items: BTreeMap<Position, Item>,
    pub flames: Vec<FlameState>,
    pub game_type: GameType,
}

impl GameStateSnapshot {
    pub fn agent(&self, id: AgentId) -> Option<&AgentState> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn bomb_at(&self, pos: Position) -> Option<&BombState> {
        self.bombs.iter().find(|bomb| bomb.position == pos)
    }

    /// Ids of agents that are alive and were seen on the board
    pub fn observed_alive(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|agent| agent.is_alive && agent.visible)
            .map(|agent| agent.id)
            .collect()
    }

    pub fn alive(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|agent| agent.is_alive)
            .map(|agent| agent.id)
            .collect()
    }

    /// Redraws the board from terrain plus items, flames, bombs and agents
    pub fn render_board(&mut self) {
        let mut board = self.board.clone();
        for (pos, item) in self.board.iter() {
            if !item.is_wall() && *item != Item::Fog {
                board.set(pos, Item::Passage);
            }
        }
        for (pos, item) in &self.items {
            if board.item(*pos) == Some(Item::Passage) {
                board.set(*pos, *item);
            }
        }
        for flame in &self.flames {
            board.set(flame.position, Item::Flames);
        }
        for bomb in &self.bombs {
            board.set(bomb.position, Item::Bomb);
        }
        for agent in self.agents.iter().filter(|a| a.is_alive && a.visible) {
            board.set(agent.position, Item::Agent(agent.id));
        }
        self.board = board;
    }
}
