use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    vec,
};

use log::{debug, info, warn};

use crate::{
    algo::tabular::QTable,
    config::{ConfigError, Hyperparameters},
    gym::{PitLayout, PlacementError, Position, Toggle},
    rollout::{self, PathStep, RolloutOutcome, RolloutReport},
    stats::Stats,
    train::{Checkpoint, TrainConfig, Trainer, CHECKPOINT_INTERVAL},
};

/// What the engine is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Untrained,
    Training,
    Trained,
    /// Trained, with a [`Playback`] in progress
    Running,
}

const ACTIVE: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

/// Playback state shared between the engine and a [`Playback`]
#[derive(Debug, Clone)]
struct PlaybackFlag(Arc<AtomicU8>);

impl PlaybackFlag {
    fn new(state: u8) -> Self {
        Self(Arc::new(AtomicU8::new(state)))
    }

    fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    /// Move out of the active state, leaving a cancelled or finished playback alone
    fn settle(&self, state: u8) {
        let _ = self
            .0
            .compare_exchange(ACTIVE, state, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// Frame-by-frame replay of a rollout
///
/// Meant to be advanced by a presentation layer at its own pace. [`Engine::reset`] and
/// [`Engine::train`] cancel it, after which it yields nothing further.
#[derive(Debug)]
pub struct Playback {
    frames: vec::IntoIter<PathStep>,
    outcome: RolloutOutcome,
    flag: PlaybackFlag,
}

impl Playback {
    pub fn outcome(&self) -> RolloutOutcome {
        self.outcome
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.get() == CANCELLED
    }

    /// Frames not yet yielded
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Iterator for Playback {
    type Item = PathStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_cancelled() {
            return None;
        }
        let frame = self.frames.next();
        if frame.is_none() {
            self.flag.settle(FINISHED);
        }
        frame
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.flag.settle(FINISHED);
    }
}

/// The learning engine behind a presentation layer
///
/// Owns the hyperparameters, the pit layout, the learned table and the stats of the last
/// training run, and exposes the `train`, `run` and `reset` controls.
#[derive(Debug)]
pub struct Engine {
    hyperparameters: Hyperparameters,
    pits: PitLayout,
    table: QTable,
    stats: Stats,
    status: Status,
    seed: Option<u64>,
    playback: Option<PlaybackFlag>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            pits: PitLayout::default(),
            table: QTable::new(),
            stats: Stats::default(),
            status: Status::Untrained,
            seed: None,
            playback: None,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hyperparameters(hyperparameters: Hyperparameters) -> Result<Self, ConfigError> {
        hyperparameters.validate()?;
        Ok(Self {
            hyperparameters,
            ..Default::default()
        })
    }

    /// Make every following training run reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Replace the hyperparameters used by the next training run
    pub fn set_hyperparameters(&mut self, hyperparameters: Hyperparameters) -> Result<(), ConfigError> {
        hyperparameters.validate()?;
        self.hyperparameters = hyperparameters;
        Ok(())
    }

    pub fn pits(&self) -> &PitLayout {
        &self.pits
    }

    /// Place or remove a pit, refused while a playback is running
    pub fn toggle_pit(&mut self, pos: Position) -> Result<Toggle, PlacementError> {
        if self.is_running() {
            return Err(PlacementError::Busy);
        }
        let toggle = self.pits.toggle(pos)?;
        debug!("pit at {pos}: {toggle:?}");
        Ok(toggle)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn q_table(&self) -> &QTable {
        &self.table
    }

    pub fn status(&self) -> Status {
        match self.status {
            Status::Trained if self.is_running() => Status::Running,
            status => status,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.status, Status::Trained)
    }

    fn is_running(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| p.get() == ACTIVE)
    }

    fn cancel_playback(&mut self) {
        if let Some(flag) = self.playback.take() {
            flag.settle(CANCELLED);
        }
    }

    /// Start a training run from a zeroed table
    ///
    /// The run borrows the engine mutably, so pits and hyperparameters stay frozen and no
    /// rollout can start until it ends. Consuming the returned iterator to the end marks
    /// the engine trained; dropping it early discards the run.
    pub fn train(&mut self) -> TrainingRun<'_> {
        self.cancel_playback();
        self.table.reset();
        self.stats = Stats::default();
        self.status = Status::Training;

        let config = TrainConfig {
            hyperparameters: self.hyperparameters,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            seed: self.seed,
        };
        let trainer = Trainer::new(config, self.pits.clone());

        TrainingRun {
            engine: self,
            trainer: Some(trainer),
        }
    }

    /// Train to completion, invoking `on_checkpoint` at every checkpoint
    ///
    /// **Returns** the final stats
    pub fn train_with(&mut self, mut on_checkpoint: impl FnMut(&Checkpoint)) -> Stats {
        let mut run = self.train();
        for checkpoint in run.by_ref() {
            on_checkpoint(&checkpoint);
        }
        run.finish()
    }

    /// Roll out the learned policy once
    ///
    /// Uses the current pit layout. Without a completed training run this reports
    /// [`RolloutOutcome::NotTrained`] with an empty path and changes nothing.
    pub fn run(&self) -> RolloutReport {
        if !self.is_trained() {
            warn!("rollout requested before training completed");
            return RolloutReport::not_trained();
        }
        rollout::run(&self.table, &self.pits)
    }

    /// Roll out the learned policy and hand it back for frame-by-frame replay
    ///
    /// Any earlier playback is cancelled. The engine reports [`Status::Running`] until the
    /// playback is exhausted or dropped.
    pub fn play(&mut self) -> Playback {
        self.cancel_playback();
        let RolloutReport { path, outcome } = self.run();

        let flag = if outcome == RolloutOutcome::NotTrained {
            PlaybackFlag::new(FINISHED)
        } else {
            let flag = PlaybackFlag::new(ACTIVE);
            self.playback = Some(flag.clone());
            flag
        };

        Playback {
            frames: path.into_iter(),
            outcome,
            flag,
        }
    }

    /// Forget the learned table and stats, restore the default pits and cancel any playback
    pub fn reset(&mut self) {
        self.cancel_playback();
        self.table.reset();
        self.stats = Stats::default();
        self.pits = PitLayout::default();
        self.status = Status::Untrained;
        debug!("engine reset");
    }
}

/// An in-progress training run of an [`Engine`]
///
/// Iterating yields a [`Checkpoint`] every 1000 episodes and after the last one; the
/// engine's stats follow each checkpoint.
pub struct TrainingRun<'a> {
    engine: &'a mut Engine,
    trainer: Option<Trainer>,
}

impl TrainingRun<'_> {
    pub fn status(&self) -> Status {
        self.engine.status()
    }

    /// Episodes completed so far
    pub fn episode(&self) -> u32 {
        self.trainer
            .as_ref()
            .map_or(self.engine.hyperparameters.episodes, Trainer::episode)
    }

    /// Train to completion
    ///
    /// **Returns** the final stats
    pub fn finish(mut self) -> Stats {
        for _ in self.by_ref() {}
        self.engine.stats
    }

    fn complete(&mut self) {
        if let Some(trainer) = self.trainer.take() {
            let (table, stats) = trainer.into_parts();
            self.engine.table = table;
            self.engine.stats = stats;
            self.engine.status = Status::Trained;
            info!("agent trained over {} episodes", stats.episodes);
        }
    }
}

impl Iterator for TrainingRun<'_> {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Self::Item> {
        let trainer = self.trainer.as_mut()?;
        let checkpoint = trainer.next();
        let finished = trainer.is_finished();

        if let Some(checkpoint) = &checkpoint {
            self.engine.stats = checkpoint.stats;
        }
        if finished {
            self.complete();
        }
        checkpoint
    }
}

impl Drop for TrainingRun<'_> {
    fn drop(&mut self) {
        let Some(trainer) = &self.trainer else {
            return;
        };
        if trainer.is_finished() {
            self.complete();
            return;
        }

        warn!(
            "training aborted after {}/{} episodes",
            trainer.episode(),
            trainer.total_episodes()
        );
        self.trainer = None;
        self.engine.status = Status::Untrained;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        gym::{AGENT_START, GOAL, MAX_STEPS},
        stats::Outcome,
    };

    use super::*;

    fn engine(episodes: u32) -> Engine {
        Engine::with_hyperparameters(Hyperparameters {
            episodes,
            ..Default::default()
        })
        .unwrap()
        .with_seed(11)
    }

    #[test]
    fn untrained_rollout_changes_nothing() {
        let engine = engine(10);
        let report = engine.run();

        assert!(report.path.is_empty(), "empty path");
        assert_eq!(report.outcome, RolloutOutcome::NotTrained, "not trained");
        assert_eq!(*engine.stats(), Stats::default(), "stats untouched");
        assert_eq!(*engine.q_table(), QTable::new(), "table untouched");
        assert_eq!(engine.status(), Status::Untrained, "still untrained");
    }

    #[test]
    fn end_to_end_training_and_rollout() {
        let mut engine = Engine::with_hyperparameters(Hyperparameters {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.1,
            episodes: 50_000,
        })
        .unwrap()
        .with_seed(2024);
        for pos in engine.pits().iter().collect::<Vec<_>>() {
            engine.toggle_pit(pos).unwrap();
        }
        assert!(engine.pits().is_empty(), "no pits for this scenario");

        let mut checkpoints = 0;
        let stats = engine.train_with(|_| checkpoints += 1);

        assert_eq!(checkpoints, 50, "a checkpoint every 1000 episodes");
        assert_eq!(stats.episodes, 50_000, "every episode ran");
        assert_eq!(stats.outcomes(), stats.episodes, "outcome counters partition the episodes");
        assert!(stats.success_rate() >= 0.0, "non-negative success rate");
        assert_eq!(stats.pit_hits, 0, "no pits, no pit hits");
        assert_eq!(engine.status(), Status::Trained, "engine is trained");

        let report = engine.run();
        let RolloutOutcome::Finished { steps, .. } = report.outcome else {
            panic!("trained engine must finish a rollout");
        };
        assert!(steps <= MAX_STEPS, "rollout stays within the step cap");
        assert_eq!(report.path.len(), steps + 1, "one frame per tick plus the initial one");
        assert_eq!(report.path[0].agent, AGENT_START, "rollout starts at the start");
        let message = report.outcome.to_string();
        assert!(
            message.starts_with("Success") || message.starts_with("Failed"),
            "unexpected outcome message {message}"
        );

        assert_eq!(engine.run(), report, "greedy rollouts are repeatable");
    }

    #[test]
    fn zero_episodes_completes_immediately() {
        let mut engine = engine(0);
        let stats = engine.train().finish();

        assert_eq!(stats, Stats::default(), "stats stay at zero");
        assert_eq!(engine.status(), Status::Trained, "an empty run still completes");
    }

    #[test]
    fn stats_follow_checkpoints() {
        let mut engine = engine(3000);
        let mut run = engine.train();
        assert_eq!(run.status(), Status::Training, "training in progress");

        let first = run.next().unwrap();
        assert_eq!(first.episode, 1000, "first checkpoint");
        assert_eq!(run.episode(), 1000, "run reports progress");
        let stats = run.finish();
        assert_eq!(stats.episodes, 3000, "run finished");
        assert_eq!(engine.stats().episodes, 3000, "engine holds the final stats");
    }

    #[test]
    fn dropping_a_run_aborts_training() {
        let mut engine = engine(5000);
        {
            let mut run = engine.train();
            run.next();
        }
        assert_eq!(engine.status(), Status::Untrained, "aborted run leaves the engine untrained");
        assert_eq!(engine.run().outcome, RolloutOutcome::NotTrained, "no rollout after an aborted run");
    }

    #[test]
    fn pit_edits() {
        let mut engine = engine(10);
        assert_eq!(engine.toggle_pit(GOAL), Err(PlacementError::Goal(GOAL)), "goal is reserved");
        assert_eq!(engine.toggle_pit(Position::new(2, 2)), Ok(Toggle::Placed), "free cell accepts a pit");
        assert!(engine.pits().contains(Position::new(2, 2)), "pit stored");
    }

    #[test]
    fn playback_runs_and_finishes() {
        let mut engine = engine(10);
        engine.train().finish();

        let mut playback = engine.play();
        assert_eq!(engine.status(), Status::Running, "playback in progress");
        assert_eq!(
            engine.toggle_pit(Position::new(2, 2)),
            Err(PlacementError::Busy),
            "pits are locked during playback"
        );

        let frames = playback.by_ref().count();
        assert_eq!(frames, engine.run().path.len(), "playback replays the rollout");
        assert_eq!(playback.remaining(), 0, "nothing left");
        assert_eq!(engine.status(), Status::Trained, "exhausted playback releases the engine");
    }

    #[test]
    fn reset_cancels_playback() {
        let mut engine = engine(10);
        engine.toggle_pit(Position::new(2, 2)).unwrap();
        engine.train().finish();

        let mut playback = engine.play();
        assert!(playback.next().is_some(), "first frame is available");

        engine.reset();
        assert!(playback.is_cancelled(), "reset cancels the pending playback");
        assert_eq!(playback.next(), None, "cancelled playback yields nothing");
        assert_eq!(engine.status(), Status::Untrained, "reset clears trained state");
        assert_eq!(*engine.stats(), Stats::default(), "reset clears stats");
        assert_eq!(*engine.pits(), PitLayout::default(), "reset restores the default pits");
    }

    #[test]
    fn untrained_playback_is_empty() {
        let mut engine = engine(10);
        let mut playback = engine.play();
        assert_eq!(playback.outcome(), RolloutOutcome::NotTrained, "not trained");
        assert_eq!(playback.next(), None, "no frames");
        assert_eq!(engine.status(), Status::Untrained, "engine never runs");
    }

    #[test]
    fn rejects_invalid_hyperparameters() {
        let mut engine = engine(10);
        let before = *engine.hyperparameters();
        let bad = Hyperparameters {
            alpha: 2.0,
            ..before
        };
        assert!(engine.set_hyperparameters(bad).is_err(), "alpha above 1 is rejected");
        assert_eq!(*engine.hyperparameters(), before, "hyperparameters unchanged");
    }

    #[test]
    fn goal_precedence_over_forced_pit() {
        let pits = PitLayout::from_cells_unchecked([GOAL]);
        assert_eq!(
            Outcome::from(crate::gym::patrol_grid::collision(GOAL, &[], &pits)),
            Outcome::Goal,
            "a pit forced onto the goal never wins"
        );
    }
}
