//! Skirmish example
//!
//! Agent 0 searches every tick against three opponents that pick safe
//! actions at random. The whole game runs on the bundled local forward
//! model. Run with `RUST_LOG=debug` to watch the search.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bomber_mcts::{
    snapshot::AgentState, Action, AgentId, ForwardModel, GameStateSnapshot, GameType, Grid, Item,
    LocalForwardModel, OpponentModel, Position, SearchAgent, SearchConfig, SimulationAdapter,
};
use rand::seq::SliceRandom;

const SIZE: usize = 9;
const MAX_TICKS: usize = 60;

fn initial_state() -> GameStateSnapshot {
    let mut board = Grid::filled(SIZE, SIZE, Item::Passage);
    for row in 0..SIZE {
        for col in 0..SIZE {
            if row % 2 == 0 && col % 2 == 0 && row > 0 && col > 0 && row < SIZE - 1 && col < SIZE - 1 {
                board.set(Position::new(row, col), Item::Rigid);
            } else if (row + col) % 5 == 0 && row > 2 && col > 2 && row < SIZE - 3 {
                board.set(Position::new(row, col), Item::Wood);
            }
        }
    }

    let mut items = BTreeMap::new();
    items.insert(Position::new(1, 4), Item::ExtraBomb);
    items.insert(Position::new(7, 4), Item::IncrRange);

    let corners = [(1, 1), (SIZE - 2, 1), (SIZE - 2, SIZE - 2), (1, SIZE - 2)];
    let agents = AgentId::ALL
        .into_iter()
        .zip(corners)
        .map(|(id, (row, col))| AgentState {
            id,
            position: Position::new(row, col),
            ammo: 1,
            blast_strength: 2,
            can_kick: false,
            is_alive: true,
            visible: true,
        })
        .collect();

    let mut state = GameStateSnapshot {
        board,
        agents,
        bombs: Vec::new(),
        items,
        flames: Vec::new(),
        game_type: GameType::FreeForAll,
    };
    state.render_board();
    state
}

fn render(board: &Grid<Item>) -> String {
    let mut out = String::new();
    for row in 0..board.rows() {
        for col in 0..board.cols() {
            let c = match board.item(Position::new(row, col)) {
                Some(Item::Passage) => '.',
                Some(Item::Rigid) => '#',
                Some(Item::Wood) => '+',
                Some(Item::Bomb) => 'o',
                Some(Item::Flames) => '*',
                Some(Item::Fog) => '?',
                Some(Item::ExtraBomb) | Some(Item::IncrRange) | Some(Item::Kick) => '$',
                Some(Item::Agent(id)) => (b'0' + id.0) as char,
                None => ' ',
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

fn main() {
    // Initialize logging
    env_logger::init();

    println!("Bomber Search Skirmish");
    println!("======================");

    let model: Arc<dyn ForwardModel> = Arc::new(LocalForwardModel::new());
    let config = SearchConfig::default().with_depth(2).with_max_turns(400);
    let mut agent = SearchAgent::new(config, model.clone());
    let mut rng = rand::thread_rng();
    let mut state = initial_state();

    for tick in 0..MAX_TICKS {
        let alive = state.alive();
        if !alive.contains(&AgentId(0)) || alive.len() <= 1 {
            break;
        }

        let observations = model.observations_for(&state);
        let mut actions = [Action::Stop; 4];
        for obs in &observations {
            let Some(id) = obs.board.item(obs.position).and_then(Item::agent) else {
                continue;
            };
            if !obs.alive.contains(&id) {
                continue;
            }
            actions[id.index()] = if id == AgentId(0) {
                match agent.decide(obs, &Action::ALL, Duration::from_millis(100)) {
                    Ok(action) => action,
                    Err(err) => {
                        eprintln!("Search failed: {}", err);
                        Action::Stop
                    }
                }
            } else {
                // Opponents only avoid walking into fire
                SimulationAdapter::construct(obs, &OpponentModel::default())
                    .ok()
                    .and_then(|adapter| adapter.legal_actions_for(id).choose(&mut rng).copied())
                    .unwrap_or(Action::Stop)
            };
        }

        println!("Tick {}: {:?}", tick, actions);
        state = model.step(&state, &actions);
        println!("{}", render(&state.board));
    }

    let survivors: Vec<String> = state.alive().iter().map(ToString::to_string).collect();
    println!("Survivors: {}", survivors.join(", "));
}
