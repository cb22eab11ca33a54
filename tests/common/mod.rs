#![allow(dead_code)]

use std::sync::Arc;

use bomber_mcts::{
    AgentId, ForwardModel, Grid, Item, LocalForwardModel, Observation, Position,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn model() -> Arc<dyn ForwardModel> {
    Arc::new(LocalForwardModel::new())
}

/// Free-for-all observation for agent `me` on an open board. Every agent
/// listed in `others` is drawn on the board and counted alive.
pub fn ffa_observation(
    rows: usize,
    cols: usize,
    me: (u8, Position),
    others: &[(u8, Position)],
) -> Observation {
    let mut board = Grid::filled(rows, cols, Item::Passage);
    board.set(me.1, Item::Agent(AgentId(me.0)));
    for (id, pos) in others {
        board.set(*pos, Item::Agent(AgentId(*id)));
    }

    let mut obs = Observation::new(board, me.1);
    obs.enemies = AgentId::ALL
        .into_iter()
        .filter(|id| id.0 != me.0)
        .collect();
    obs.alive = std::iter::once(AgentId(me.0))
        .chain(others.iter().map(|(id, _)| AgentId(*id)))
        .collect();
    obs
}

/// Places a bomb at `pos`. The board keeps an agent standing on it.
pub fn add_bomb(obs: &mut Observation, pos: Position, life: u8, strength: u8) {
    obs.bomb_life.set(pos, life);
    obs.bomb_blast_strength.set(pos, strength);
    if obs.board.item(pos).and_then(Item::agent).is_none() {
        obs.board.set(pos, Item::Bomb);
    }
}

pub fn set_walls(obs: &mut Observation, cells: &[(usize, usize)], item: Item) {
    for (row, col) in cells {
        obs.board.set(Position::new(*row, *col), item);
    }
}

/// Agent 0 at the centre of a 5x5 board, enemy agent 1 two cells right
pub fn duel() -> Observation {
    ffa_observation(5, 5, (0, Position::new(2, 2)), &[(1, Position::new(2, 4))])
}

/// Agent 0 beside a bomb that goes off next tick. Only `Up` and `Down`
/// leave the blast.
pub fn about_to_blow() -> Observation {
    let mut obs = ffa_observation(5, 5, (0, Position::new(2, 2)), &[]);
    add_bomb(&mut obs, Position::new(2, 3), 1, 2);
    obs
}

/// Agent 0 alone on an open board with nothing to react to
pub fn quiet() -> Observation {
    ffa_observation(5, 5, (0, Position::new(2, 2)), &[])
}
