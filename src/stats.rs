use std::fmt;

use crate::{gym::Collision, util::ratio};

/// How an episode or rollout ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Goal,
    Pit,
    Enemy,
    Timeout,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Goal
    }
}

impl From<Option<Collision>> for Outcome {
    fn from(collision: Option<Collision>) -> Self {
        match collision {
            Some(Collision::Goal) => Outcome::Goal,
            Some(Collision::Pit) => Outcome::Pit,
            Some(Collision::Enemy) => Outcome::Enemy,
            None => Outcome::Timeout,
        }
    }
}

/// Summary of one finished training episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Episode {
    pub outcome: Outcome,
    pub steps: usize,
    pub reward: f64,
}

/// Running counters over the episodes of a training run
///
/// Rates are always derived from the counters on demand so a snapshot can never
/// disagree with itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub episodes: u64,
    pub successes: u64,
    pub total_steps_on_success: u64,
    pub total_reward: f64,
    pub goals_reached: u64,
    pub pit_hits: u64,
    pub enemy_hits: u64,
    pub timeouts: u64,
}

impl Stats {
    pub fn record(&mut self, episode: &Episode) {
        self.episodes += 1;
        self.total_reward += episode.reward;
        match episode.outcome {
            Outcome::Goal => {
                self.successes += 1;
                self.goals_reached += 1;
                self.total_steps_on_success += episode.steps as u64;
            }
            Outcome::Pit => self.pit_hits += 1,
            Outcome::Enemy => self.enemy_hits += 1,
            Outcome::Timeout => self.timeouts += 1,
        }
    }

    /// Percentage of episodes that reached the goal
    pub fn success_rate(&self) -> f64 {
        ratio(self.successes as f64, self.episodes as f64) * 100.0
    }

    /// Mean episode length over successful episodes, 0 before the first success
    pub fn avg_steps(&self) -> f64 {
        ratio(
            self.total_steps_on_success as f64,
            self.successes as f64,
        )
    }

    /// Sum of all per-outcome counters
    pub fn outcomes(&self) -> u64 {
        self.goals_reached + self.pit_hits + self.enemy_hits + self.timeouts
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "episodes: {}, success rate: {:.2}%, avg steps: {:.2}, total reward: {:.0}, \
             pits: {}, enemies: {}, timeouts: {}",
            self.episodes,
            self.success_rate(),
            self.avg_steps(),
            self.total_reward,
            self.pit_hits,
            self.enemy_hits,
            self.timeouts,
        )
    }
}
