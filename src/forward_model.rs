//! The forward-model seam
//!
//! The search consumes two operations from the game engine: advancing a full
//! snapshot by one tick under a joint action, and rendering per-agent
//! observations of a snapshot. [`ForwardModel`] is that contract.
//! [`LocalForwardModel`] is a compact implementation of the usual rules,
//! suitable for tests, benchmarks and offline play. It is not meant to be
//! rule-perfect.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    observation::{Action, AgentId, Grid, Item, JointAction, Observation, Position},
    snapshot::{AgentState, BombState, FlameState, GameStateSnapshot, BOMB_LIFE, FLAME_LIFE},
};

/// Trait for single-step game simulators
pub trait ForwardModel: Send + Sync {
    /// Advances `state` by one tick with every agent taking its slot of `actions`
    fn step(&self, state: &GameStateSnapshot, actions: &JointAction) -> GameStateSnapshot;

    /// Renders the observation each agent slot would receive, in slot order
    fn observations_for(&self, state: &GameStateSnapshot) -> Vec<Observation>;
}

impl<M: ForwardModel + ?Sized> ForwardModel for Box<M> {
    fn step(&self, state: &GameStateSnapshot, actions: &JointAction) -> GameStateSnapshot {
        (**self).step(state, actions)
    }

    fn observations_for(&self, state: &GameStateSnapshot) -> Vec<Observation> {
        (**self).observations_for(state)
    }
}

/// Fully observable, deterministic single-step simulator
///
/// Resolution order per tick: flames burn down, bombs are laid, moves are
/// resolved (swaps and contested cells revert), power-ups are picked up,
/// fuses count down, explosions chain, wood burns, agents in flames die.
/// Kicking is not modelled.
#[derive(Debug, Clone, Default)]
pub struct LocalForwardModel;

impl LocalForwardModel {
    pub fn new() -> Self {
        LocalForwardModel
    }

    fn lay_bombs(next: &mut GameStateSnapshot, actions: &JointAction) {
        for agent in next.agents.iter_mut().filter(|a| a.is_alive && a.visible) {
            if actions[agent.id.index()] != Action::Bomb || agent.ammo == 0 {
                continue;
            }
            if next.bombs.iter().any(|b| b.position == agent.position) {
                continue;
            }
            agent.ammo -= 1;
            next.bombs.push(BombState {
                owner: Some(agent.id),
                position: agent.position,
                life: BOMB_LIFE,
                blast_strength: agent.blast_strength.min(u8::MAX as u32) as u8,
            });
        }
    }

    fn resolve_moves(next: &mut GameStateSnapshot, actions: &JointAction) {
        let (rows, cols) = (next.board.rows(), next.board.cols());
        let active: Vec<usize> = next
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_alive && a.visible)
            .map(|(i, _)| i)
            .collect();
        let current: Vec<Position> = next.agents.iter().map(|a| a.position).collect();
        let mut desired = current.clone();

        for &i in &active {
            let action = actions[next.agents[i].id.index()];
            if !action.is_move() {
                continue;
            }
            if let Some(target) = current[i].step(action, rows, cols) {
                let blocked = next.board.item(target).map_or(true, Item::is_wall)
                    || next.bomb_at(target).is_some();
                if !blocked {
                    desired[i] = target;
                }
            }
        }

        // Agents trading places bounce back.
        for &i in &active {
            for &j in &active {
                if i < j && desired[i] == current[j] && desired[j] == current[i] && desired[i] != current[i] {
                    desired[i] = current[i];
                    desired[j] = current[j];
                }
            }
        }

        // Contested cells: every mover into an occupied or shared cell reverts.
        // Reverts within a pass are applied together so slot order is irrelevant.
        loop {
            let mut claims: BTreeMap<Position, usize> = BTreeMap::new();
            for &i in &active {
                *claims.entry(desired[i]).or_insert(0) += 1;
            }
            let reverting: Vec<usize> = active
                .iter()
                .copied()
                .filter(|&i| desired[i] != current[i] && claims[&desired[i]] > 1)
                .collect();
            if reverting.is_empty() {
                break;
            }
            for i in reverting {
                desired[i] = current[i];
            }
        }

        for &i in &active {
            let agent = &mut next.agents[i];
            agent.position = desired[i];
            match next.items.remove(&agent.position) {
                Some(Item::ExtraBomb) => agent.ammo += 1,
                Some(Item::IncrRange) => agent.blast_strength += 1,
                Some(Item::Kick) => agent.can_kick = true,
                _ => {}
            }
        }
    }

    /// Cells covered by a bomb's explosion: its own cell plus `strength - 1`
    /// cells along each axis, stopping at rigid walls and after wood.
    pub fn blast_cells(board: &Grid<Item>, bomb: &BombState) -> Vec<Position> {
        let (rows, cols) = (board.rows(), board.cols());
        let mut cells = vec![bomb.position];
        for direction in [Action::Up, Action::Down, Action::Left, Action::Right] {
            let mut cursor = bomb.position;
            for _ in 1..bomb.blast_strength {
                let Some(next) = cursor.step(direction, rows, cols) else {
                    break;
                };
                match board.item(next) {
                    Some(Item::Rigid) | None => break,
                    Some(Item::Wood) => {
                        cells.push(next);
                        break;
                    }
                    Some(_) => cells.push(next),
                }
                cursor = next;
            }
        }
        cells
    }

    fn explode(next: &mut GameStateSnapshot) {
        for bomb in next.bombs.iter_mut() {
            bomb.life = bomb.life.saturating_sub(1);
        }

        let mut exploding: Vec<bool> = next.bombs.iter().map(|b| b.life == 0).collect();
        let mut frontier: Vec<usize> = (0..exploding.len()).filter(|&i| exploding[i]).collect();
        let mut fire = BTreeSet::new();

        while let Some(i) = frontier.pop() {
            for cell in Self::blast_cells(&next.board, &next.bombs[i]) {
                fire.insert(cell);
                for (j, other) in next.bombs.iter().enumerate() {
                    if !exploding[j] && other.position == cell {
                        exploding[j] = true;
                        frontier.push(j);
                    }
                }
            }
        }

        for (bomb, _) in next.bombs.iter().zip(&exploding).filter(|(_, e)| **e) {
            if let Some(owner) = bomb.owner {
                if let Some(agent) = next.agents.iter_mut().find(|a| a.id == owner) {
                    agent.ammo += 1;
                }
            }
        }
        let mut index = 0;
        next.bombs.retain(|_| {
            let keep = !exploding[index];
            index += 1;
            keep
        });

        for cell in &fire {
            if next.board.item(*cell) == Some(Item::Wood) {
                next.board.set(*cell, Item::Passage);
            }
            next.items.remove(cell);
            match next.flames.iter_mut().find(|f| f.position == *cell) {
                Some(flame) => flame.life = FLAME_LIFE,
                None => next.flames.push(FlameState {
                    position: *cell,
                    life: FLAME_LIFE,
                }),
            }
        }
    }

    fn kill_burning(next: &mut GameStateSnapshot) {
        let burning: BTreeSet<Position> = next.flames.iter().map(|f| f.position).collect();
        for agent in next.agents.iter_mut() {
            if agent.is_alive && agent.visible && burning.contains(&agent.position) {
                agent.is_alive = false;
            }
        }
    }

    fn observe(state: &GameStateSnapshot, agent: &AgentState) -> Observation {
        let (rows, cols) = (state.board.rows(), state.board.cols());
        let mut bomb_life = Grid::filled(rows, cols, 0u8);
        let mut bomb_blast_strength = Grid::filled(rows, cols, 0u8);
        for bomb in &state.bombs {
            bomb_life.set(bomb.position, bomb.life);
            bomb_blast_strength.set(bomb.position, bomb.blast_strength);
        }
        Observation {
            board: state.board.clone(),
            bomb_life,
            bomb_blast_strength,
            position: agent.position,
            ammo: agent.ammo,
            blast_strength: agent.blast_strength,
            can_kick: agent.can_kick,
            enemies: state.game_type.enemies_of(agent.id),
            teammate: state.game_type.teammate_of(agent.id),
            alive: state.alive(),
            game_type: state.game_type,
        }
    }
}

impl ForwardModel for LocalForwardModel {
    fn step(&self, state: &GameStateSnapshot, actions: &JointAction) -> GameStateSnapshot {
        let mut next = state.clone();
        next.flames.retain_mut(|flame| {
            flame.life = flame.life.saturating_sub(1);
            flame.life > 0
        });
        Self::lay_bombs(&mut next, actions);
        Self::resolve_moves(&mut next, actions);
        Self::explode(&mut next);
        Self::kill_burning(&mut next);
        next.render_board();
        next
    }

    fn observations_for(&self, state: &GameStateSnapshot) -> Vec<Observation> {
        AgentId::ALL
            .iter()
            .filter_map(|id| state.agent(*id))
            .map(|agent| Self::observe(state, agent))
            .collect()
    }
}
