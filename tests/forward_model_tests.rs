use std::collections::BTreeMap;

use bomber_mcts::{
    forward_model::LocalForwardModel,
    snapshot::{AgentState, BombState, BOMB_LIFE},
    Action, AgentId, ForwardModel, GameStateSnapshot, GameType, Grid, Item, JointAction,
    Position,
};

fn agent(id: u8, row: usize, col: usize) -> AgentState {
    AgentState {
        id: AgentId(id),
        position: Position::new(row, col),
        ammo: 1,
        blast_strength: 2,
        can_kick: false,
        is_alive: true,
        visible: true,
    }
}

fn snapshot(agents: Vec<AgentState>) -> GameStateSnapshot {
    let mut state = GameStateSnapshot {
        board: Grid::filled(5, 5, Item::Passage),
        agents,
        bombs: Vec::new(),
        items: BTreeMap::new(),
        flames: Vec::new(),
        game_type: GameType::FreeForAll,
    };
    state.render_board();
    state
}

fn bomb(row: usize, col: usize, life: u8, blast_strength: u8) -> BombState {
    BombState {
        owner: None,
        position: Position::new(row, col),
        life,
        blast_strength,
    }
}

fn all(action: Action) -> JointAction {
    [action; 4]
}

#[test]
fn test_laying_a_bomb() {
    let state = snapshot(vec![agent(0, 2, 2)]);
    let next = LocalForwardModel::new().step(&state, &all(Action::Bomb));

    assert_eq!(next.bombs.len(), 1);
    assert_eq!(next.bombs[0].owner, Some(AgentId(0)));
    assert_eq!(next.bombs[0].life, BOMB_LIFE - 1);
    assert_eq!(next.agent(AgentId(0)).unwrap().ammo, 0);
    // The agent is drawn over its own bomb
    assert_eq!(next.board.item(Position::new(2, 2)), Some(Item::Agent(AgentId(0))));
}

#[test]
fn test_explosion_kills_and_burns() {
    let mut state = snapshot(vec![agent(0, 0, 0), agent(1, 2, 3)]);
    state.bombs.push(bomb(2, 2, 1, 2));
    let next = LocalForwardModel::new().step(&state, &all(Action::Stop));

    assert!(next.bombs.is_empty());
    assert!(!next.agent(AgentId(1)).unwrap().is_alive);
    assert!(next.agent(AgentId(0)).unwrap().is_alive);
    for cell in [(2, 2), (2, 1), (2, 3), (1, 2), (3, 2)] {
        assert_eq!(
            next.board.item(Position::new(cell.0, cell.1)),
            Some(Item::Flames),
            "{:?}",
            cell
        );
    }
    assert_eq!(next.board.item(Position::new(2, 4)), Some(Item::Passage));
    assert_eq!(next.alive(), vec![AgentId(0)]);
}

#[test]
fn test_explosions_chain() {
    let mut state = snapshot(vec![agent(0, 0, 0)]);
    state.bombs.push(bomb(4, 0, 1, 3));
    state.bombs.push(bomb(4, 2, 8, 2));
    let next = LocalForwardModel::new().step(&state, &all(Action::Stop));

    assert!(next.bombs.is_empty());
    assert_eq!(next.board.item(Position::new(4, 3)), Some(Item::Flames));
}

#[test]
fn test_walls_stop_blasts() {
    let mut state = snapshot(vec![agent(0, 0, 0)]);
    state.board.set(Position::new(2, 3), Item::Rigid);
    state.board.set(Position::new(1, 2), Item::Wood);
    state.bombs.push(bomb(2, 2, 1, 3));
    let next = LocalForwardModel::new().step(&state, &all(Action::Stop));

    assert_eq!(next.board.item(Position::new(2, 3)), Some(Item::Rigid));
    assert_eq!(next.board.item(Position::new(2, 4)), Some(Item::Passage));
    // Wood burns, the blast goes no further
    assert_eq!(next.board.item(Position::new(1, 2)), Some(Item::Flames));
    assert_eq!(next.board.item(Position::new(0, 2)), Some(Item::Passage));
}

#[test]
fn test_picking_up_power_ups() {
    let mut state = snapshot(vec![agent(0, 2, 2)]);
    state.items.insert(Position::new(2, 3), Item::ExtraBomb);
    state.items.insert(Position::new(3, 3), Item::IncrRange);
    state.render_board();
    let model = LocalForwardModel::new();

    let next = model.step(&state, &all(Action::Right));
    let me = next.agent(AgentId(0)).unwrap();
    assert_eq!(me.ammo, 2);
    assert!(!next.items.contains_key(&Position::new(2, 3)));

    let next = model.step(&next, &all(Action::Down));
    assert_eq!(next.agent(AgentId(0)).unwrap().blast_strength, 3);
    assert!(next.items.is_empty());
}

#[test]
fn test_contested_cell_reverts_both_movers() {
    let state = snapshot(vec![agent(0, 2, 1), agent(1, 2, 3)]);
    let actions = [Action::Right, Action::Left, Action::Stop, Action::Stop];
    let next = LocalForwardModel::new().step(&state, &actions);

    assert_eq!(next.agent(AgentId(0)).unwrap().position, Position::new(2, 1));
    assert_eq!(next.agent(AgentId(1)).unwrap().position, Position::new(2, 3));
}

#[test]
fn test_contested_cell_reverts_regardless_of_slot_order() {
    // Same clash with the higher slot coming from the left
    let state = snapshot(vec![agent(0, 1, 2), agent(3, 3, 2)]);
    let actions = [Action::Down, Action::Stop, Action::Stop, Action::Up];
    let next = LocalForwardModel::new().step(&state, &actions);

    assert_eq!(next.agent(AgentId(0)).unwrap().position, Position::new(1, 2));
    assert_eq!(next.agent(AgentId(3)).unwrap().position, Position::new(3, 2));
    assert_eq!(next.board.item(Position::new(2, 2)), Some(Item::Passage));
}

#[test]
fn test_reverts_cascade_to_followers() {
    // Agent 2 follows agent 0, which bounces off the clash with agent 1
    let state = snapshot(vec![agent(0, 2, 1), agent(1, 2, 3), agent(2, 2, 0)]);
    let actions = [Action::Right, Action::Left, Action::Right, Action::Stop];
    let next = LocalForwardModel::new().step(&state, &actions);

    assert_eq!(next.agent(AgentId(0)).unwrap().position, Position::new(2, 1));
    assert_eq!(next.agent(AgentId(1)).unwrap().position, Position::new(2, 3));
    assert_eq!(next.agent(AgentId(2)).unwrap().position, Position::new(2, 0));
}

#[test]
fn test_swapping_agents_bounce_back() {
    let state = snapshot(vec![agent(0, 2, 1), agent(1, 2, 2)]);
    let actions = [Action::Right, Action::Left, Action::Stop, Action::Stop];
    let next = LocalForwardModel::new().step(&state, &actions);

    assert_eq!(next.agent(AgentId(0)).unwrap().position, Position::new(2, 1));
    assert_eq!(next.agent(AgentId(1)).unwrap().position, Position::new(2, 2));
}

#[test]
fn test_observations_in_slot_order() {
    let mut state = snapshot(vec![agent(0, 0, 0), agent(1, 4, 4)]);
    state.game_type = GameType::Team;
    state.bombs.push(bomb(2, 2, 5, 3));
    let observations = LocalForwardModel::new().observations_for(&state);

    assert_eq!(observations.len(), 2);
    assert_eq!(observations[1].position, Position::new(4, 4));
    assert_eq!(observations[0].teammate, Some(AgentId(2)));
    assert_eq!(observations[0].enemies, vec![AgentId(1), AgentId(3)]);
    assert_eq!(observations[0].bomb_life.at(Position::new(2, 2)), 5);
    assert_eq!(observations[0].bomb_blast_strength.at(Position::new(2, 2)), 3);
}
