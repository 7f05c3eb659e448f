use std::{fmt, iter::FusedIterator};

use log::debug;

use crate::{
    algo::tabular::QTable,
    env::Environment,
    gym::{patrol_grid::ENEMY_COUNT, PatrolGrid, PitLayout, Position},
    stats::Outcome,
};

/// One frame of a recorded trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub agent: Position,
    pub enemies: [Position; ENEMY_COUNT],
}

/// Human-facing result of a rollout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutOutcome {
    /// No completed training run exists
    NotTrained,
    Finished { outcome: Outcome, steps: usize },
}

impl RolloutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RolloutOutcome::Finished {
                outcome: Outcome::Goal,
                ..
            }
        )
    }
}

impl fmt::Display for RolloutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RolloutOutcome::NotTrained => write!(f, "Agent is not trained yet."),
            RolloutOutcome::Finished { outcome, steps } => match outcome {
                Outcome::Goal => write!(f, "Success! Reached goal in {steps} steps."),
                Outcome::Pit | Outcome::Enemy => {
                    write!(f, "Failed: Hit an obstacle after {steps} steps.")
                }
                Outcome::Timeout => write!(f, "Failed: Timeout after {steps} steps."),
            },
        }
    }
}

/// A recorded trajectory and how it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutReport {
    pub path: Vec<PathStep>,
    pub outcome: RolloutOutcome,
}

impl RolloutReport {
    pub fn not_trained() -> Self {
        Self {
            path: Vec::new(),
            outcome: RolloutOutcome::NotTrained,
        }
    }
}

/// A greedy walk through the grid following a learned table
///
/// Yields the initial configuration first and then one [`PathStep`] per tick until the
/// agent hits something or runs out of steps. The table is only read.
pub struct Rollout<'a> {
    table: &'a QTable,
    env: PatrolGrid,
    started: bool,
}

impl<'a> Rollout<'a> {
    pub fn new(table: &'a QTable, pits: PitLayout) -> Self {
        let mut env = PatrolGrid::new(pits);
        env.reset();
        Self {
            table,
            env,
            started: false,
        }
    }

    fn frame(&self) -> PathStep {
        PathStep {
            agent: self.env.agent(),
            enemies: self.env.enemy_positions(),
        }
    }

    /// Ticks taken so far
    pub fn steps(&self) -> usize {
        self.env.steps()
    }

    /// The outcome once the walk has ended
    pub fn outcome(&self) -> Option<Outcome> {
        (!self.env.is_active()).then(|| self.env.collision().into())
    }

    /// Walk to the end and collect the trajectory
    pub fn finish(mut self) -> RolloutReport {
        let path: Vec<_> = self.by_ref().collect();
        let outcome = RolloutOutcome::Finished {
            outcome: self.env.collision().into(),
            steps: self.env.steps(),
        };
        debug!("rollout over {} frames: {outcome}", path.len());
        RolloutReport { path, outcome }
    }
}

impl Iterator for Rollout<'_> {
    type Item = PathStep;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(self.frame());
        }
        if !self.env.is_active() {
            return None;
        }

        let action = self.table.greedy(self.env.state());
        self.env.step(action);
        Some(self.frame())
    }
}

impl FusedIterator for Rollout<'_> {}

/// Run a complete greedy rollout
pub fn run(table: &QTable, pits: &PitLayout) -> RolloutReport {
    Rollout::new(table, pits.clone()).finish()
}

#[cfg(test)]
mod tests {
    use crate::gym::{Action, GridState, AGENT_START, GOAL, GRID_SIZE, INITIAL_ENEMIES, MAX_STEPS};

    use super::*;

    /// A table whose greedy action depends only on the agent's cell
    fn policy(choose: impl Fn(Position) -> Action) -> QTable {
        let mut table = QTable::new();
        for agent_y in 0..GRID_SIZE {
            for agent_x in 0..GRID_SIZE {
                let action = choose(Position::new(agent_x, agent_y));
                for e1 in 0..GRID_SIZE {
                    for e2 in 0..GRID_SIZE {
                        let state = GridState {
                            agent_y,
                            agent_x,
                            enemy_x: [e1, e2],
                        };
                        table.write(state, action, 1.0);
                    }
                }
            }
        }
        table
    }

    #[test]
    fn zero_table_times_out() {
        let table = QTable::new();
        let report = run(&table, &PitLayout::default());

        assert_eq!(report.path.len(), MAX_STEPS + 1, "initial frame plus one per tick");
        assert_eq!(
            report.path[0],
            PathStep {
                agent: AGENT_START,
                enemies: INITIAL_ENEMIES.map(|e| e.pos)
            },
            "first frame is the initial configuration"
        );
        assert!(report.path.iter().all(|s| s.agent == AGENT_START), "all-zero table always bumps the top wall");
        assert_eq!(
            report.outcome,
            RolloutOutcome::Finished {
                outcome: Outcome::Timeout,
                steps: MAX_STEPS
            },
            "timeout at the step cap"
        );
        assert_eq!(report.outcome.to_string(), "Failed: Timeout after 200 steps.");
    }

    #[test]
    fn reaches_goal_along_the_edges() {
        let table = policy(|p| if p.x < GRID_SIZE - 1 { Action::Right } else { Action::Down });
        let report = run(&table, &PitLayout::default());

        assert_eq!(report.path.last().map(|s| s.agent), Some(GOAL), "path ends on the goal");
        assert_eq!(report.path.len(), 19, "18 moves plus the initial frame");
        assert!(report.outcome.is_success(), "goal reached");
        assert_eq!(report.outcome.to_string(), "Success! Reached goal in 18 steps.");
    }

    #[test]
    fn stops_at_pit() {
        let table = policy(|_| Action::Right);
        let pits = PitLayout::from_cells_unchecked([Position::new(3, 0)]);
        let mut rollout = Rollout::new(&table, pits);

        assert_eq!(rollout.outcome(), None, "walk has not ended yet");
        let frames = rollout.by_ref().count();
        assert_eq!(frames, 4, "three moves plus the initial frame");
        assert_eq!(rollout.outcome(), Some(Outcome::Pit), "pit ends the walk");
        assert_eq!(rollout.next(), None, "rollout is not restartable");

        let report = run(&table, &PitLayout::from_cells_unchecked([Position::new(3, 0)]));
        assert_eq!(report.outcome.to_string(), "Failed: Hit an obstacle after 3 steps.");
    }

    #[test]
    fn stops_at_enemy() {
        // wait in the second enemy's row until it patrols back to column 0
        let table = policy(|p| if p.y < 2 { Action::Down } else { Action::Left });
        let report = run(&table, &PitLayout::empty());

        assert_eq!(
            report.outcome,
            RolloutOutcome::Finished {
                outcome: Outcome::Enemy,
                steps: 13
            },
            "enemy reaches the agent after 13 ticks"
        );
        let last = report.path.last().copied();
        assert_eq!(last.map(|s| s.agent), Some(Position::new(0, 2)), "agent waited at the row start");
        assert_eq!(last.map(|s| s.enemies[1]), Some(Position::new(0, 2)), "enemy shares the agent's cell");
    }

    #[test]
    fn greedy_rollouts_are_deterministic() {
        let table = policy(|p| if (p.x + p.y) % 2 == 0 { Action::Right } else { Action::Down });
        let pits = PitLayout::default();

        assert_eq!(run(&table, &pits), run(&table, &pits), "same table, same trajectory");
    }

    #[test]
    fn rollout_does_not_touch_the_table() {
        let table = policy(|_| Action::Down);
        let before = table.clone();
        run(&table, &PitLayout::default());
        assert_eq!(table, before, "table is read-only");
    }

    #[test]
    fn not_trained_report() {
        let report = RolloutReport::not_trained();
        assert!(report.path.is_empty(), "no path");
        assert_eq!(report.outcome.to_string(), "Agent is not trained yet.");
        assert!(!report.outcome.is_success(), "not a success");
    }
}
