//! Adapter between agent-local observations and the forward model
//!
//! A [`SimulationAdapter`] is built once per search node. It reconstructs a
//! full [`GameStateSnapshot`] from the node's observation, computes a
//! safety-filtered action set for every agent slot, and turns a fixed
//! action of the searching agent into a [`JointActionCursor`] over the
//! visible opponents' combinations.

use log::trace;
use rand::{seq::SliceRandom, Rng};

use crate::{
    config::OpponentModel,
    forward_model::ForwardModel,
    observation::{Action, AgentId, Grid, Item, JointAction, Observation, Position, NUM_AGENTS},
    snapshot::{AgentState, BombState, FlameState, GameStateSnapshot, FLAME_LIFE},
    Result, SearchError,
};

/// Single-pass cursor over a shuffled list of joint actions
///
/// The list is materialised once; every element is handed out at most once
/// and the cursor cannot be rewound.
#[derive(Debug, Clone, Default)]
pub struct JointActionCursor {
    combinations: Vec<JointAction>,
    next: usize,
}

impl JointActionCursor {
    pub fn new(combinations: Vec<JointAction>) -> Self {
        JointActionCursor {
            combinations,
            next: 0,
        }
    }

    /// Number of combinations not yet drawn
    pub fn remaining(&self) -> usize {
        self.combinations.len() - self.next
    }

    /// Total number of combinations, drawn or not
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}

impl Iterator for JointActionCursor {
    type Item = JointAction;

    fn next(&mut self) -> Option<JointAction> {
        let combination = self.combinations.get(self.next).copied()?;
        self.next += 1;
        Some(combination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

/// Default spawn cell of each agent slot on a `rows` x `cols` board
pub fn default_spawn(id: AgentId, rows: usize, cols: usize) -> Position {
    let (last_row, last_col) = (rows.saturating_sub(2), cols.saturating_sub(2));
    match id.0 {
        0 => Position::new(1, 1),
        1 => Position::new(last_row, 1),
        2 => Position::new(last_row, last_col),
        _ => Position::new(1, last_col),
    }
}

/// Works out which agent slot the observation belongs to
///
/// The searching agent is the one slot that is neither the teammate nor an
/// enemy. If several slots qualify, the one drawn at the observation's own
/// position wins.
pub fn identify_self(obs: &Observation) -> Result<AgentId> {
    let candidates: Vec<AgentId> = AgentId::ALL
        .into_iter()
        .filter(|id| Some(*id) != obs.teammate && !obs.enemies.contains(id))
        .collect();
    if let [me] = candidates.as_slice() {
        return Ok(*me);
    }
    let at_position: Vec<AgentId> = candidates
        .iter()
        .copied()
        .filter(|id| obs.board.item(obs.position) == Some(Item::Agent(*id)))
        .collect();
    match at_position.as_slice() {
        [me] => Ok(*me),
        _ => Err(SearchError::UnknownSelf { candidates }),
    }
}

/// Converts one observation into simulated next observations
#[derive(Debug, Clone)]
pub struct SimulationAdapter {
    snapshot: GameStateSnapshot,
    me: AgentId,
    /// Alive set of the source observation, including invisible agents
    alive_before: Vec<AgentId>,
    /// Agents both alive and visible on the source board
    observed_alive: Vec<AgentId>,
    legal: [Vec<Action>; NUM_AGENTS],
    enemies: Vec<AgentId>,
    teammate: Option<AgentId>,
}

impl SimulationAdapter {
    /// Reconstructs the full game state behind `obs`
    ///
    /// Fails only when the searching agent cannot be identified.
    pub fn construct(obs: &Observation, opponents: &OpponentModel) -> Result<Self> {
        let me = identify_self(obs)?;
        let (rows, cols) = (obs.rows(), obs.cols());

        let agents: Vec<AgentState> = AgentId::ALL
            .into_iter()
            .map(|id| {
                let found = obs.board.find_agent(id);
                if id == me {
                    let is_alive = obs.is_alive(me);
                    AgentState {
                        id,
                        position: found.unwrap_or(obs.position),
                        ammo: obs.ammo,
                        blast_strength: obs.blast_strength,
                        can_kick: obs.can_kick,
                        is_alive,
                        visible: is_alive,
                    }
                } else {
                    AgentState {
                        id,
                        position: found.unwrap_or_else(|| default_spawn(id, rows, cols)),
                        ammo: opponents.ammo,
                        blast_strength: opponents.blast_strength,
                        can_kick: opponents.can_kick,
                        is_alive: found.is_some() || obs.is_alive(id),
                        visible: found.is_some(),
                    }
                }
            })
            .collect();

        let bombs = obs
            .bomb_life
            .iter()
            .filter(|(_, life)| **life > 0)
            .map(|(position, life)| BombState {
                owner: None,
                position,
                life: *life,
                blast_strength: obs.bomb_blast_strength.at(position),
            })
            .collect();

        let items = obs
            .board
            .iter()
            .filter(|(_, item)| item.is_powerup())
            .map(|(pos, item)| (pos, *item))
            .collect();

        let flames = obs
            .board
            .iter()
            .filter(|(_, item)| **item == Item::Flames)
            .map(|(position, _)| FlameState {
                position,
                life: FLAME_LIFE,
            })
            .collect();

        let snapshot = GameStateSnapshot {
            board: obs.board.clone(),
            agents,
            bombs,
            items,
            flames,
            game_type: obs.game_type,
        };
        let observed_alive = snapshot.observed_alive();

        let danger = Self::doomed_cells(&snapshot);
        let legal = AgentId::ALL.map(|id| match snapshot.agent(id) {
            Some(agent) => Self::safe_actions(&snapshot, &danger, agent),
            None => vec![Action::Stop],
        });

        Ok(SimulationAdapter {
            snapshot,
            me,
            alive_before: obs.alive.clone(),
            observed_alive,
            legal,
            enemies: obs.enemies.clone(),
            teammate: obs.teammate,
        })
    }

    /// Cells hit by any bomb about to detonate, chained through every other
    /// bomb caught in the blast. Reach is over-approximated to the full
    /// blast strength along each axis.
    fn doomed_cells(snapshot: &GameStateSnapshot) -> Grid<bool> {
        let board = &snapshot.board;
        let (rows, cols) = (board.rows(), board.cols());
        let mut doomed = Grid::filled(rows, cols, false);
        let mut detonating: Vec<bool> = snapshot.bombs.iter().map(|b| b.life <= 1).collect();
        let mut frontier: Vec<usize> = (0..detonating.len()).filter(|&i| detonating[i]).collect();

        while let Some(i) = frontier.pop() {
            let bomb = &snapshot.bombs[i];
            let mut reached = vec![bomb.position];
            for direction in [Action::Up, Action::Down, Action::Left, Action::Right] {
                let mut cursor = bomb.position;
                for _ in 0..bomb.blast_strength {
                    let Some(next) = cursor.step(direction, rows, cols) else {
                        break;
                    };
                    match board.item(next) {
                        Some(Item::Rigid) | None => break,
                        Some(Item::Wood) => {
                            reached.push(next);
                            break;
                        }
                        Some(_) => reached.push(next),
                    }
                    cursor = next;
                }
            }
            for cell in reached {
                doomed.set(cell, true);
                for (j, other) in snapshot.bombs.iter().enumerate() {
                    if !detonating[j] && other.position == cell {
                        detonating[j] = true;
                        frontier.push(j);
                    }
                }
            }
        }
        doomed
    }

    /// Actions of `agent` that land on a passable cell that is not about to
    /// burn. An agent with no such action keeps `Stop`.
    fn safe_actions(
        snapshot: &GameStateSnapshot,
        doomed: &Grid<bool>,
        agent: &AgentState,
    ) -> Vec<Action> {
        if !agent.is_alive || !agent.visible {
            return vec![Action::Stop];
        }
        let (rows, cols) = (snapshot.board.rows(), snapshot.board.cols());
        let actions: Vec<Action> = Action::ALL
            .into_iter()
            .filter(|action| {
                let target = match action {
                    Action::Bomb => {
                        if agent.ammo == 0 || snapshot.bomb_at(agent.position).is_some() {
                            return false;
                        }
                        agent.position
                    }
                    Action::Stop => agent.position,
                    _ => match agent.position.step(*action, rows, cols) {
                        Some(target) => target,
                        None => return false,
                    },
                };
                if action.is_move() {
                    let passable = matches!(
                        snapshot.board.item(target),
                        Some(item) if !item.is_wall() && item != Item::Bomb && item != Item::Flames
                    );
                    if !passable || snapshot.bomb_at(target).is_some() {
                        return false;
                    }
                }
                !doomed.at(target)
            })
            .collect();
        if actions.is_empty() {
            vec![Action::Stop]
        } else {
            actions
        }
    }

    /// The searching agent's slot
    pub fn me(&self) -> AgentId {
        self.me
    }

    pub fn snapshot(&self) -> &GameStateSnapshot {
        &self.snapshot
    }

    /// Agents alive and visible in the source observation
    pub fn observed_alive(&self) -> &[AgentId] {
        &self.observed_alive
    }

    /// Safety-filtered actions of `agent`; never empty
    pub fn legal_actions_for(&self, agent: AgentId) -> &[Action] {
        &self.legal[agent.index()]
    }

    /// Agents whose actions vary across joint actions
    fn others(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.observed_alive.iter().copied().filter(move |id| *id != self.me)
    }

    /// Raw size of the joint-action space before safety filtering:
    /// six actions for every other visible live agent
    pub fn num_next_observations(&self) -> usize {
        6usize.pow(self.others().count() as u32)
    }

    /// Number of joint actions the cursor for `my_action` will yield
    pub fn joint_action_count(&self, my_action: Action) -> usize {
        if !self.legal_actions_for(self.me).contains(&my_action) {
            return 0;
        }
        self.others()
            .map(|id| self.legal_actions_for(id).len())
            .product()
    }

    /// All safe joint actions with the searching agent fixed to `my_action`,
    /// shuffled. Agents not alive and visible always `Stop`.
    pub fn enumerate_joint_actions<R: Rng + ?Sized>(
        &self,
        my_action: Action,
        rng: &mut R,
    ) -> JointActionCursor {
        if !self.legal_actions_for(self.me).contains(&my_action) {
            return JointActionCursor::default();
        }
        let mut template = [Action::Stop; NUM_AGENTS];
        template[self.me.index()] = my_action;

        let mut combinations = vec![template];
        for id in self.others() {
            combinations = combinations
                .into_iter()
                .flat_map(|partial| {
                    self.legal_actions_for(id).iter().map(move |action| {
                        let mut joint = partial;
                        joint[id.index()] = *action;
                        joint
                    })
                })
                .collect();
        }
        combinations.shuffle(rng);
        trace!(
            "{} joint actions for {:?} (raw {})",
            combinations.len(),
            my_action,
            self.num_next_observations()
        );
        JointActionCursor::new(combinations)
    }

    /// Simulates one tick and returns the searching agent's next observation
    ///
    /// Deaths are reconciled against the source observation: an agent is
    /// dropped from the alive set only if it was observed alive before the
    /// step and is missing after it.
    pub fn step(&self, model: &dyn ForwardModel, actions: &JointAction) -> Result<Observation> {
        let next_state = model.step(&self.snapshot, actions);
        let mut observations = model.observations_for(&next_state);
        if observations.len() <= self.me.index() {
            return Err(SearchError::MissingObservation(self.me));
        }
        let mut own = observations.swap_remove(self.me.index());

        let died: Vec<AgentId> = self
            .observed_alive
            .iter()
            .copied()
            .filter(|id| !own.alive.contains(id))
            .collect();
        own.alive = self
            .alive_before
            .iter()
            .copied()
            .filter(|id| !died.contains(id))
            .collect();
        own.enemies = self.enemies.clone();
        own.teammate = self.teammate;
        Ok(own)
    }
}
