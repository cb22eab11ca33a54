//! Mode classification and state scoring
//!
//! The search has no access to the true outcome of a simulated state, so
//! every node is scored by a heuristic chosen by the [`Mode`] of its parent:
//!
//! - **Evade**: bombs threatening the agent are close to detonation. The
//!   score is a continuous danger potential, 100 minus a penalty for every
//!   bomb whose blast reaches the agent, weighted by how short its fuse is.
//! - **Attack**: the agent has ammunition and an enemy is nearby. The score
//!   measures how little safe room an enemy has left around it.
//! - **Explore**: nothing urgent. There is no scalar for "explore better",
//!   so such nodes are never branched on.

use crate::observation::{Action, Grid, Item, Observation, Position};

/// Coarse intent driving which reward function applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Evade,
    Attack,
    Explore,
}

/// Heuristic classifier and scorer for observations
#[derive(Debug, Clone)]
pub struct RewardModel {
    /// Manhattan radius within which an enemy triggers Attack
    pub attack_radius: usize,

    /// Manhattan radius of the escape area counted around an enemy
    pub escape_radius: usize,
}

impl Default for RewardModel {
    fn default() -> Self {
        RewardModel {
            attack_radius: 4,
            escape_radius: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Blocked,
    InBlast,
}

impl RewardModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies an observation; Evade takes precedence over Attack
    pub fn classify(&self, obs: &Observation) -> Mode {
        if self.evade_condition(obs) {
            Mode::Evade
        } else if self.attack_condition(obs) {
            Mode::Attack
        } else {
            Mode::Explore
        }
    }

    /// Scores an observation under `mode`. Explore has no score and yields 0.
    pub fn score(&self, obs: &Observation, mode: Mode) -> f64 {
        match mode {
            Mode::Evade => self.evade_score(obs),
            Mode::Attack => self.attack_score(obs),
            Mode::Explore => 0.0,
        }
    }

    /// True when the summed fuses of the bombs whose blast strength reaches
    /// the agent are below `5 + 2 * count`. No threatening bombs means no
    /// evasion.
    pub fn evade_condition(&self, obs: &Observation) -> bool {
        let (count, ticks) = obs
            .bombs()
            .filter(|(pos, strength, _)| pos.distance(obs.position) <= *strength as usize)
            .fold((0u32, 0u32), |(count, ticks), (_, _, life)| {
                (count + 1, ticks + life as u32)
            });
        count > 0 && ticks < 5 + 2 * count
    }

    pub fn evade_score(&self, obs: &Observation) -> f64 {
        obs.bombs()
            .filter(|(pos, strength, _)| *strength as usize >= pos.distance(obs.position))
            .fold(100.0, |score, (_, _, life)| {
                score - 25.0 * (11.0 - life as f64) / 10.0
            })
    }

    /// True when the agent can lay a bomb and an enemy is within
    /// `attack_radius`
    pub fn attack_condition(&self, obs: &Observation) -> bool {
        obs.ammo > 0
            && obs
                .enemy_positions()
                .iter()
                .any(|enemy| enemy.distance(obs.position) <= self.attack_radius)
    }

    /// Best cornering score over every enemy within `attack_radius` of the
    /// agent, 0 when there is none
    pub fn attack_score(&self, obs: &Observation) -> f64 {
        obs.enemy_positions()
            .into_iter()
            .filter(|enemy| enemy.distance(obs.position) <= self.attack_radius)
            .map(|enemy| self.attack_score_at(enemy, obs))
            .fold(0.0, f64::max)
    }

    /// `100 * (1 - emptySafeArea / fillArea)` at `pos`
    pub fn attack_score_at(&self, pos: Position, obs: &Observation) -> f64 {
        let fill = self.fill_area(pos, obs.rows(), obs.cols());
        let empty = self.empty_safe_area(pos, obs);
        100.0 * (1.0 - empty as f64 / fill as f64)
    }

    /// Size of the radius-2 diamond around `pos` if nothing were blocked,
    /// clipped by the board edges
    pub fn fill_area(&self, pos: Position, rows: usize, cols: usize) -> u32 {
        let row_to_bound = pos.row.min(rows.saturating_sub(1).saturating_sub(pos.row)).min(2);
        let col_to_bound = pos.col.min(cols.saturating_sub(1).saturating_sub(pos.col)).min(2);
        match (row_to_bound, col_to_bound) {
            (2, 2) => 13,
            (0, 0) => 6,
            (1, 1) => 11,
            (0, 1) | (1, 0) => 8,
            (0, _) | (_, 0) => 9,
            _ => 12,
        }
    }

    /// Number of cells within `escape_radius` of `pos` that are neither walls
    /// nor agents nor reachable by an existing bomb's blast
    pub fn empty_safe_area(&self, pos: Position, obs: &Observation) -> u32 {
        let map = Self::escape_map(obs);
        let radius = self.escape_radius;
        let rows = pos.row.saturating_sub(radius)..=(pos.row + radius);
        rows.flat_map(|row| {
            (pos.col.saturating_sub(radius)..=(pos.col + radius)).map(move |col| Position::new(row, col))
        })
        .filter(|cell| cell.distance(pos) <= radius)
        .filter(|cell| map.get(*cell) == Some(&Cell::Empty))
        .count() as u32
    }

    fn escape_map(obs: &Observation) -> Grid<Cell> {
        let (rows, cols) = (obs.rows(), obs.cols());
        let mut map = Grid::filled(rows, cols, Cell::Empty);
        for (pos, item) in obs.board.iter() {
            if item.is_wall() || item.agent().is_some() {
                map.set(pos, Cell::Blocked);
            }
        }

        for (origin, strength, _) in obs.bombs() {
            for direction in [Action::Down, Action::Up, Action::Right, Action::Left] {
                let mut cell = Some(origin);
                for _ in 0..strength {
                    let Some(pos) = cell else { break };
                    if obs.board.item(pos).map_or(true, Item::is_wall) {
                        break;
                    }
                    if map.get(pos) == Some(&Cell::Empty) {
                        map.set(pos, Cell::InBlast);
                    }
                    cell = pos.step(direction, rows, cols);
                }
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_area_table() {
        let model = RewardModel::new();
        let area = |row, col| model.fill_area(Position::new(row, col), 11, 11);
        assert_eq!(area(5, 5), 13);
        assert_eq!(area(0, 5), 9);
        assert_eq!(area(1, 5), 12);
        assert_eq!(area(5, 10), 9);
        assert_eq!(area(0, 0), 6);
        assert_eq!(area(1, 1), 11);
        assert_eq!(area(0, 1), 8);
        assert_eq!(area(10, 9), 8);
    }
}
