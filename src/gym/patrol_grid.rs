use std::fmt;

use rand::Rng;
use strum::{EnumIter, FromRepr, VariantArray};

use crate::env::{DiscreteActionSpace, Environment};

use super::pits::PitLayout;

/// Width and height of the square grid
pub const GRID_SIZE: usize = 10;

/// Step budget of a single episode or rollout
pub const MAX_STEPS: usize = 200;

/// Number of patrolling enemies, fixed because both are part of the learned state
pub const ENEMY_COUNT: usize = 2;

/// Number of actions available in every state
pub const ACTION_COUNT: usize = 4;

pub const AGENT_START: Position = Position::new(0, 0);
pub const GOAL: Position = Position::new(GRID_SIZE - 1, GRID_SIZE - 1);
pub const INITIAL_ENEMIES: [Enemy; ENEMY_COUNT] = [
    Enemy::new(Position::new(0, 7), Heading::Right),
    Enemy::new(Position::new(5, 2), Heading::Right),
];

pub const REWARD_GOAL: f32 = 100.0;
pub const REWARD_HAZARD: f32 = -100.0;
pub const REWARD_STEP: f32 = -1.0;

/// A cell of the grid, `x` is the column and `y` the row
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub const fn in_bounds(&self) -> bool {
        self.x < GRID_SIZE && self.y < GRID_SIZE
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Horizontal patrol direction of an enemy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    Left = -1,
    Right = 1,
}

impl Heading {
    pub const fn flip(self) -> Self {
        match self {
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    /// Whether a step in this heading from column `x` stays on the grid
    const fn can_advance(self, x: usize) -> bool {
        match self {
            Heading::Left => x > 0,
            Heading::Right => x < GRID_SIZE - 1,
        }
    }
}

/// A patrolling hazard that bounces between the left and right edges of its row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Enemy {
    pub pos: Position,
    pub heading: Heading,
}

impl Enemy {
    pub const fn new(pos: Position, heading: Heading) -> Self {
        Self { pos, heading }
    }
}

#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Action {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The learned state: agent row and column plus both enemies' columns
///
/// Enemy rows never change and headings follow from the column history, so
/// neither is tracked here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridState {
    pub agent_y: usize,
    pub agent_x: usize,
    pub enemy_x: [usize; ENEMY_COUNT],
}

impl GridState {
    pub fn observe(agent: Position, enemies: &[Enemy; ENEMY_COUNT]) -> Self {
        Self {
            agent_y: agent.y,
            agent_x: agent.x,
            enemy_x: enemies.map(|e| e.pos.x),
        }
    }
}

/// What the agent ran into, in order of precedence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collision {
    Goal,
    Pit,
    Enemy,
}

impl Collision {
    pub const fn reward(self) -> f32 {
        match self {
            Collision::Goal => REWARD_GOAL,
            Collision::Pit | Collision::Enemy => REWARD_HAZARD,
        }
    }
}

/// Move the agent one cell, staying put when the move would leave the grid
pub fn move_agent(pos: Position, action: Action) -> Position {
    let Position { x, y } = pos;
    match action {
        Action::Up => Position::new(x, y.saturating_sub(1)),
        Action::Down => Position::new(x, (y + 1).min(GRID_SIZE - 1)),
        Action::Left => Position::new(x.saturating_sub(1), y),
        Action::Right => Position::new((x + 1).min(GRID_SIZE - 1), y),
    }
}

/// Advance an enemy one column along its heading
///
/// Touching either edge reverses the heading for the following tick.
pub fn move_enemy(enemy: Enemy) -> Enemy {
    let Enemy { pos, mut heading } = enemy;
    if !heading.can_advance(pos.x) {
        heading = heading.flip();
    }

    let x = match heading {
        Heading::Left => pos.x - 1,
        Heading::Right => pos.x + 1,
    };
    if x == 0 || x == GRID_SIZE - 1 {
        heading = heading.flip();
    }

    Enemy::new(Position::new(x, pos.y), heading)
}

/// Determine what, if anything, the agent collides with at `agent`
pub fn collision(agent: Position, enemies: &[Position], pits: &PitLayout) -> Option<Collision> {
    if agent == GOAL {
        Some(Collision::Goal)
    } else if pits.contains(agent) {
        Some(Collision::Pit)
    } else if enemies.contains(&agent) {
        Some(Collision::Enemy)
    } else {
        None
    }
}

pub fn reward(agent: Position, enemies: &[Position], pits: &PitLayout) -> f32 {
    collision(agent, enemies, pits).map_or(REWARD_STEP, Collision::reward)
}

pub fn is_terminal(agent: Position, enemies: &[Position], pits: &PitLayout) -> bool {
    reward(agent, enemies, pits) != REWARD_STEP
}

/// A 10x10 grid with a start in one corner, the goal in the opposite corner,
/// static pits and two patrolling enemies
///
/// Intended for use with a [QTableAgent](crate::algo::tabular::q_table::QTableAgent)
#[derive(Debug, Clone)]
pub struct PatrolGrid {
    agent: Position,
    enemies: [Enemy; ENEMY_COUNT],
    pits: PitLayout,
    steps: usize,
}

impl PatrolGrid {
    /// Create the environment with a pit layout that stays fixed for its lifetime
    pub fn new(pits: PitLayout) -> Self {
        Self {
            agent: AGENT_START,
            enemies: INITIAL_ENEMIES,
            pits,
            steps: 0,
        }
    }

    pub fn agent(&self) -> Position {
        self.agent
    }

    pub fn enemies(&self) -> &[Enemy; ENEMY_COUNT] {
        &self.enemies
    }

    pub fn enemy_positions(&self) -> [Position; ENEMY_COUNT] {
        self.enemies.map(|e| e.pos)
    }

    pub fn pits(&self) -> &PitLayout {
        &self.pits
    }

    /// Ticks taken since the last reset
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn state(&self) -> GridState {
        GridState::observe(self.agent, &self.enemies)
    }

    /// What the agent currently collides with, if anything
    pub fn collision(&self) -> Option<Collision> {
        collision(self.agent, &self.enemy_positions(), &self.pits)
    }
}

impl Environment for PatrolGrid {
    type State = GridState;
    type Action = Action;

    fn is_active(&self) -> bool {
        self.steps < MAX_STEPS && self.collision().is_none()
    }

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        self.agent = move_agent(self.agent, action);
        self.enemies = self.enemies.map(move_enemy);
        self.steps += 1;

        match self.collision() {
            Some(hit) => (None, hit.reward()),
            None => (Some(self.state()), REWARD_STEP),
        }
    }

    fn reset(&mut self) -> Self::State {
        self.agent = AGENT_START;
        self.enemies = INITIAL_ENEMIES;
        self.steps = 0;
        self.state()
    }

    fn random_action<R: Rng>(&self, rng: &mut R) -> Self::Action {
        Action::VARIANTS[rng.gen_range(0..ACTION_COUNT)]
    }
}

impl DiscreteActionSpace for PatrolGrid {
    fn actions(&self) -> Vec<Self::Action> {
        Action::VARIANTS.to_vec()
    }
}
