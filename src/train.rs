use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    algo::tabular::{QTable, QTableAgent},
    config::Hyperparameters,
    gym::{PatrolGrid, PitLayout},
    stats::Stats,
};

/// Episodes between two published checkpoints
pub const CHECKPOINT_INTERVAL: u32 = 1000;

/// Configuration for a [`Trainer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub hyperparameters: Hyperparameters,
    pub checkpoint_interval: u32,
    /// Seed for exploration, `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            checkpoint_interval: CHECKPOINT_INTERVAL,
            seed: None,
        }
    }
}

/// Progress snapshot published by a [`Trainer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    /// Episodes completed so far
    pub episode: u32,
    pub total_episodes: u32,
    pub stats: Stats,
}

impl Checkpoint {
    pub fn is_final(&self) -> bool {
        self.episode == self.total_episodes
    }

    /// Completed fraction of the run in `[0, 1]`
    pub fn progress(&self) -> f64 {
        crate::util::ratio(self.episode.into(), self.total_episodes.into())
    }
}

/// Drives a training run one checkpoint at a time
///
/// Each call to [`next`](Iterator::next) plays episodes up to the next checkpoint, which
/// lands every `checkpoint_interval` episodes and after the final one. Between calls the
/// caller is free to report progress or stop early by dropping the trainer.
///
/// The pit layout is moved into the trainer's environment and cannot change for the
/// rest of the run.
pub struct Trainer {
    agent: QTableAgent,
    env: PatrolGrid,
    rng: StdRng,
    stats: Stats,
    total_episodes: u32,
    checkpoint_interval: u32,
}

impl Trainer {
    /// Start a run with a zeroed table and empty stats
    ///
    /// **Panics** if a hyperparameter is outside `[0,1]`
    pub fn new(config: TrainConfig, pits: PitLayout) -> Self {
        let TrainConfig {
            hyperparameters,
            checkpoint_interval,
            seed,
        } = config;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "training for {} episodes (alpha {}, gamma {}, epsilon {}) with {} pits",
            hyperparameters.episodes,
            hyperparameters.alpha,
            hyperparameters.gamma,
            hyperparameters.epsilon,
            pits.len(),
        );

        Self {
            agent: QTableAgent::new(hyperparameters.into()),
            env: PatrolGrid::new(pits),
            rng,
            stats: Stats::default(),
            total_episodes: hyperparameters.episodes,
            checkpoint_interval: checkpoint_interval.max(1),
        }
    }

    /// Episodes completed so far
    pub fn episode(&self) -> u32 {
        self.agent.episode()
    }

    pub fn total_episodes(&self) -> u32 {
        self.total_episodes
    }

    pub fn is_finished(&self) -> bool {
        self.episode() >= self.total_episodes
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn q_table(&self) -> &QTable {
        self.agent.q_table()
    }

    /// Train to completion, invoking `on_checkpoint` at every checkpoint
    ///
    /// **Returns** the learned table and the final stats
    pub fn run(mut self, mut on_checkpoint: impl FnMut(&Checkpoint)) -> (QTable, Stats) {
        for checkpoint in self.by_ref() {
            on_checkpoint(&checkpoint);
        }
        self.into_parts()
    }

    pub fn into_parts(self) -> (QTable, Stats) {
        (self.agent.into_q_table(), self.stats)
    }
}

impl Iterator for Trainer {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }

        loop {
            let episode = self.agent.go(&mut self.env, &mut self.rng);
            self.stats.record(&episode);

            let n = self.episode();
            if n % self.checkpoint_interval == 0 || n == self.total_episodes {
                break;
            }
        }

        let checkpoint = Checkpoint {
            episode: self.episode(),
            total_episodes: self.total_episodes,
            stats: self.stats,
        };

        if checkpoint.is_final() {
            info!("training finished: {}", checkpoint.stats);
        } else {
            debug!(
                "episode {}/{}: {}",
                checkpoint.episode, checkpoint.total_episodes, checkpoint.stats
            );
        }

        Some(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(episodes: u32, seed: u64) -> TrainConfig {
        TrainConfig {
            hyperparameters: Hyperparameters {
                episodes,
                ..Default::default()
            },
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn checkpoints_land_on_interval_and_final_episode() {
        let trainer = Trainer::new(config(2500, 1), PitLayout::default());
        let checkpoints: Vec<_> = trainer.collect();

        let episodes: Vec<_> = checkpoints.iter().map(|c| c.episode).collect();
        assert_eq!(episodes, [1000, 2000, 2500], "checkpoint cadence");
        assert!(checkpoints[2].is_final(), "last checkpoint is final");
        assert!(!checkpoints[0].is_final(), "first checkpoint is not final");

        for c in &checkpoints {
            assert_eq!(c.stats.episodes, u64::from(c.episode), "stats count executed episodes");
            assert_eq!(c.stats.outcomes(), c.stats.episodes, "outcome counters partition the episodes");
            assert_eq!(c.stats.successes, c.stats.goals_reached, "every success is a goal");
            assert!(c.stats.success_rate() >= 0.0, "success rate is non-negative");
        }
    }

    #[test]
    fn zero_episodes_is_a_no_op() {
        let mut trainer = Trainer::new(config(0, 1), PitLayout::default());
        assert!(trainer.is_finished(), "nothing to do");
        assert_eq!(trainer.next(), None, "no checkpoints");

        let (table, stats) = trainer.into_parts();
        assert_eq!(stats, Stats::default(), "stats stay at zero");
        assert_eq!(table, QTable::new(), "table stays zeroed");
    }

    #[test]
    fn run_reports_every_checkpoint() {
        let mut seen = Vec::new();
        let (_, stats) = Trainer::new(config(1200, 5), PitLayout::empty()).run(|c| seen.push(c.episode));

        assert_eq!(seen, [1000, 1200], "callback sees each checkpoint");
        assert_eq!(stats.episodes, 1200, "final stats cover the whole run");
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let (table_a, stats_a) = Trainer::new(config(300, 9), PitLayout::default()).run(|_| {});
        let (table_b, stats_b) = Trainer::new(config(300, 9), PitLayout::default()).run(|_| {});

        assert_eq!(stats_a, stats_b, "same seed, same stats");
        assert_eq!(table_a, table_b, "same seed, same table");
    }

    #[test]
    fn checkpoint_progress() {
        let checkpoint = Checkpoint {
            episode: 250,
            total_episodes: 1000,
            stats: Stats::default(),
        };
        assert_eq!(checkpoint.progress(), 0.25, "quarter done");
    }
}
