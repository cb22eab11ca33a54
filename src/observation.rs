//! Observation types produced by the game engine
//!
//! An [`Observation`] is the agent-local view of the board at one tick. The
//! search never mutates an observation in place: every simulated step yields
//! a fresh one.

use std::fmt;

/// Number of agent slots on a board
pub const NUM_AGENTS: usize = 4;

/// Identity of one of the four agents (slot `0..4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u8);

impl AgentId {
    /// All agent identities in slot order
    pub const ALL: [AgentId; NUM_AGENTS] = [AgentId(0), AgentId(1), AgentId(2), AgentId(3)];

    /// Slot index of this agent
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent{}", self.0)
    }
}

/// Contents of one board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Passage,
    Rigid,
    Wood,
    Bomb,
    Flames,
    Fog,
    ExtraBomb,
    IncrRange,
    Kick,
    Agent(AgentId),
}

impl Item {
    /// Rigid or wooden wall
    pub fn is_wall(self) -> bool {
        matches!(self, Item::Rigid | Item::Wood)
    }

    pub fn is_powerup(self) -> bool {
        matches!(self, Item::ExtraBomb | Item::IncrRange | Item::Kick)
    }

    pub fn agent(self) -> Option<AgentId> {
        match self {
            Item::Agent(id) => Some(id),
            _ => None,
        }
    }
}

/// A cell coordinate, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Manhattan distance between two cells
    pub fn distance(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The neighbouring cell reached by `action`, if it stays on a
    /// `rows` x `cols` board. `Stop` and `Bomb` return the cell itself.
    pub fn step(self, action: Action, rows: usize, cols: usize) -> Option<Position> {
        let (row, col) = match action {
            Action::Stop | Action::Bomb => return Some(self),
            Action::Up => (self.row.checked_sub(1)?, self.col),
            Action::Down => (self.row + 1, self.col),
            Action::Left => (self.row, self.col.checked_sub(1)?),
            Action::Right => (self.row, self.col + 1),
        };
        if row < rows && col < cols {
            Some(Position { row, col })
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A dense row-major 2-D grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Grid {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }
}

impl<T> Grid<T> {
    /// Builds a grid from nested rows. Ragged input is truncated to the
    /// shortest row.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let cols = rows.iter().map(Vec::len).min().unwrap_or(0);
        let height = rows.len();
        let cells = rows
            .into_iter()
            .flat_map(|mut row| {
                row.truncate(cols);
                row
            })
            .collect();
        Grid {
            rows: height,
            cols,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn get(&self, pos: Position) -> Option<&T> {
        if self.contains(pos) {
            self.cells.get(pos.row * self.cols + pos.col)
        } else {
            None
        }
    }

    /// Mutable access to a cell; `None` off the board
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        if self.contains(pos) {
            self.cells.get_mut(pos.row * self.cols + pos.col)
        } else {
            None
        }
    }

    pub fn set(&mut self, pos: Position, value: T) {
        if let Some(cell) = self.get_mut(pos) {
            *cell = value;
        }
    }

    /// Iterates over every `(position, value)` pair in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| (Position::new(i / cols, i % cols), v))
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Value at `pos`, or the default off the board
    pub fn at(&self, pos: Position) -> T {
        self.get(pos).copied().unwrap_or_default()
    }
}

impl Grid<Item> {
    /// Position of an agent on the board, if visible
    pub fn find_agent(&self, id: AgentId) -> Option<Position> {
        self.iter()
            .find(|(_, item)| **item == Item::Agent(id))
            .map(|(pos, _)| pos)
    }

    pub fn item(&self, pos: Position) -> Option<Item> {
        self.get(pos).copied()
    }
}

/// One of the six actions available to every agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Stop,
    Up,
    Down,
    Left,
    Right,
    Bomb,
}

impl Action {
    /// All actions in their canonical order
    pub const ALL: [Action; 6] = [
        Action::Stop,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Bomb,
    ];

    /// Canonical index of this action (`0..6`)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    /// True for the four directional moves
    pub fn is_move(self) -> bool {
        matches!(self, Action::Up | Action::Down | Action::Left | Action::Right)
    }
}

/// A simultaneous action assignment, indexed by agent slot
pub type JointAction = [Action; NUM_AGENTS];

/// Free-for-all or two-versus-two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameType {
    #[default]
    FreeForAll,
    Team,
}

impl GameType {
    /// Teammate of `id` under this game type
    pub fn teammate_of(self, id: AgentId) -> Option<AgentId> {
        match self {
            GameType::FreeForAll => None,
            GameType::Team => Some(AgentId((id.0 + 2) % NUM_AGENTS as u8)),
        }
    }

    /// Enemies of `id` under this game type
    pub fn enemies_of(self, id: AgentId) -> Vec<AgentId> {
        let teammate = self.teammate_of(id);
        AgentId::ALL
            .into_iter()
            .filter(|other| *other != id && Some(*other) != teammate)
            .collect()
    }
}

/// An agent-local snapshot of the game
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub board: Grid<Item>,
    /// Remaining fuse of the bomb in each cell, 0 where there is none
    pub bomb_life: Grid<u8>,
    /// Blast strength of the bomb in each cell, 0 where there is none
    pub bomb_blast_strength: Grid<u8>,
    pub position: Position,
    pub ammo: u32,
    pub blast_strength: u32,
    pub can_kick: bool,
    pub enemies: Vec<AgentId>,
    pub teammate: Option<AgentId>,
    pub alive: Vec<AgentId>,
    pub game_type: GameType,
}

impl Observation {
    /// Creates an observation with empty bomb grids matching `board`
    pub fn new(board: Grid<Item>, position: Position) -> Self {
        let (rows, cols) = (board.rows(), board.cols());
        Observation {
            board,
            bomb_life: Grid::filled(rows, cols, 0),
            bomb_blast_strength: Grid::filled(rows, cols, 0),
            position,
            ammo: 1,
            blast_strength: 2,
            can_kick: false,
            enemies: Vec::new(),
            teammate: None,
            alive: AgentId::ALL.to_vec(),
            game_type: GameType::FreeForAll,
        }
    }

    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn cols(&self) -> usize {
        self.board.cols()
    }

    /// Positions of every bomb with a nonzero blast strength
    pub fn bombs(&self) -> impl Iterator<Item = (Position, u8, u8)> + '_ {
        self.bomb_blast_strength
            .iter()
            .filter(|(_, strength)| **strength > 0)
            .map(|(pos, strength)| (pos, *strength, self.bomb_life.at(pos)))
    }

    /// Positions of enemy agents visible on the board
    pub fn enemy_positions(&self) -> Vec<Position> {
        self.board
            .iter()
            .filter(|(_, item)| matches!(item.agent(), Some(id) if self.enemies.contains(&id)))
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.alive.contains(&id)
    }
}
