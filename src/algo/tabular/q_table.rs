use log::debug;
use rand::Rng;
use strum::VariantArray;

use crate::{
    assert_interval,
    env::Environment,
    exploration::{Choice, EpsilonGreedy},
    gym::{
        patrol_grid::{ACTION_COUNT, ENEMY_COUNT},
        Action, GridState, PatrolGrid, GRID_SIZE,
    },
    memory::Exp,
    stats::Episode,
};

/// Number of distinct [`GridState`]s
const STATE_COUNT: usize = GRID_SIZE.pow(2 + ENEMY_COUNT as u32);

/// Dense table of action values for every [`GridState`]
///
/// Stored as one flat buffer indexed by `(agent_y, agent_x, enemy_x[0], enemy_x[1], action)`
/// in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Vec<f32>,
}

impl Default for QTable {
    fn default() -> Self {
        Self::new()
    }
}

impl QTable {
    /// Allocate a zeroed table
    pub fn new() -> Self {
        Self {
            values: vec![0.0; STATE_COUNT * ACTION_COUNT],
        }
    }

    /// Zero every entry
    pub fn reset(&mut self) {
        debug!("zeroing {} q-values", self.values.len());
        self.values.fill(0.0);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn offset(state: GridState) -> usize {
        let GridState {
            agent_y,
            agent_x,
            enemy_x,
        } = state;
        let cell = agent_y * GRID_SIZE + agent_x;
        let row = enemy_x.iter().fold(cell, |acc, &x| acc * GRID_SIZE + x);
        row * ACTION_COUNT
    }

    /// The values of all four actions at `state`
    pub fn read(&self, state: GridState) -> [f32; ACTION_COUNT] {
        let offset = Self::offset(state);
        std::array::from_fn(|a| self.values[offset + a])
    }

    pub fn get(&self, state: GridState, action: Action) -> f32 {
        self.values[Self::offset(state) + action.index()]
    }

    pub fn write(&mut self, state: GridState, action: Action, value: f32) {
        self.values[Self::offset(state) + action.index()] = value;
    }

    pub fn max_value(&self, state: GridState) -> f32 {
        self.read(state)
            .into_iter()
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// The highest valued action at `state`, ties go to the lowest action index
    pub fn greedy(&self, state: GridState) -> Action {
        let values = self.read(state);
        let best = (1..ACTION_COUNT).fold(0, |best, a| {
            if values[a] > values[best] {
                a
            } else {
                best
            }
        });
        Action::VARIANTS[best]
    }
}

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone, Copy)]
pub struct QTableAgentConfig {
    pub exploration: EpsilonGreedy,
    pub alpha: f32,
    pub gamma: f32,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(0.1),
            alpha: 0.1,
            gamma: 0.95,
        }
    }
}

/// A Q-learning agent that learns the [`PatrolGrid`] with a dense [`QTable`]
pub struct QTableAgent {
    q_table: QTable,
    exploration: EpsilonGreedy,
    alpha: f32,   // learning rate
    gamma: f32,   // discount factor
    episode: u32, // current episode
}

impl QTableAgent {
    /// Initialize a new `QTableAgent` with a zeroed table
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QTableAgentConfig) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            q_table: QTable::new(),
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            episode: 0,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Give up the agent, keeping what it learned
    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    /// Number of episodes played so far
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Choose an action based on the current state and exploration policy
    pub fn act<R: Rng>(&self, env: &PatrolGrid, state: GridState, rng: &mut R) -> Action {
        match self.exploration.choose(rng) {
            Choice::Explore => env.random_action(rng),
            Choice::Exploit => self.q_table.greedy(state),
        }
    }

    /// Move the value of the experienced state-action pair towards its temporal-difference target
    fn learn(&mut self, experience: Exp<PatrolGrid>) {
        let Exp {
            state,
            action,
            next_state,
            reward,
        } = experience;

        let q_value = self.q_table.get(state, action);
        let max_next_q = next_state.map_or(0.0, |s| self.q_table.max_value(s));
        let target = reward + self.gamma * max_next_q;

        self.q_table
            .write(state, action, q_value + self.alpha * (target - q_value));
    }

    /// Play and learn from one episode
    pub fn go<R: Rng>(&mut self, env: &mut PatrolGrid, rng: &mut R) -> Episode {
        let mut state = env.reset();
        let mut total_reward = 0.0;

        loop {
            let action = self.act(env, state, rng);
            let (next_state, reward) = env.step(action);
            total_reward += f64::from(reward);

            self.learn(Exp {
                state,
                action,
                next_state,
                reward,
            });

            match next_state {
                Some(next) if env.is_active() => state = next,
                _ => break,
            }
        }

        self.episode += 1;
        Episode {
            outcome: env.collision().into(),
            steps: env.steps(),
            reward: total_reward,
        }
    }
}
