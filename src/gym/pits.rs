use std::collections::BTreeSet;

use thiserror::Error;

use super::patrol_grid::{Position, AGENT_START, GOAL, INITIAL_ENEMIES};

/// Pits placed when the engine starts or is reset
pub const INITIAL_PITS: [Position; 2] = [Position::new(5, 5), Position::new(7, 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("cannot place a pit on the agent start {0}")]
    Start(Position),
    #[error("cannot place a pit on the goal {0}")]
    Goal(Position),
    #[error("cannot place a pit on the enemy start {0}")]
    EnemyStart(Position),
    #[error("{0} is outside the grid")]
    OutOfBounds(Position),
    #[error("pits cannot be edited while the agent is running")]
    Busy,
}

/// Result of a successful [`PitLayout::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Placed,
    Removed,
}

/// The set of static hazards on the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitLayout {
    cells: BTreeSet<Position>,
}

impl Default for PitLayout {
    fn default() -> Self {
        Self::from_cells_unchecked(INITIAL_PITS)
    }
}

impl PitLayout {
    /// A grid without pits
    pub fn empty() -> Self {
        Self {
            cells: BTreeSet::new(),
        }
    }

    /// Build a layout without checking placement rules
    ///
    /// Movement and rewards stay well defined for any layout, including one
    /// with a pit on the goal, so this is safe to use for experiments.
    pub fn from_cells_unchecked(cells: impl IntoIterator<Item = Position>) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// Check that a pit may be placed at `pos`
    pub fn validate(pos: Position) -> Result<(), PlacementError> {
        if !pos.in_bounds() {
            Err(PlacementError::OutOfBounds(pos))
        } else if pos == AGENT_START {
            Err(PlacementError::Start(pos))
        } else if pos == GOAL {
            Err(PlacementError::Goal(pos))
        } else if INITIAL_ENEMIES.iter().any(|e| e.pos == pos) {
            Err(PlacementError::EnemyStart(pos))
        } else {
            Ok(())
        }
    }

    /// Place a pit at `pos`, or remove the pit already there
    pub fn toggle(&mut self, pos: Position) -> Result<Toggle, PlacementError> {
        Self::validate(pos)?;
        if self.cells.remove(&pos) {
            Ok(Toggle::Removed)
        } else {
            self.cells.insert(pos);
            Ok(Toggle::Placed)
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_places_and_removes() {
        let mut pits = PitLayout::empty();
        let pos = Position::new(3, 4);

        assert_eq!(pits.toggle(pos), Ok(Toggle::Placed), "empty cell gets a pit");
        assert!(pits.contains(pos), "pit is stored");
        assert_eq!(pits.toggle(pos), Ok(Toggle::Removed), "second toggle removes it");
        assert!(pits.is_empty(), "layout is empty again");
    }

    #[test]
    fn toggle_rejects_reserved_cells() {
        let mut pits = PitLayout::default();
        let before = pits.clone();

        assert_eq!(pits.toggle(AGENT_START), Err(PlacementError::Start(AGENT_START)), "start is reserved");
        assert_eq!(pits.toggle(GOAL), Err(PlacementError::Goal(GOAL)), "goal is reserved");
        for enemy in INITIAL_ENEMIES {
            assert_eq!(pits.toggle(enemy.pos), Err(PlacementError::EnemyStart(enemy.pos)), "enemy start is reserved");
        }
        let outside = Position::new(10, 0);
        assert_eq!(pits.toggle(outside), Err(PlacementError::OutOfBounds(outside)), "outside the grid");

        assert_eq!(pits, before, "rejected edits leave the layout untouched");
    }

    #[test]
    fn default_layout() {
        let pits = PitLayout::default();
        assert_eq!(pits.len(), 2, "two default pits");
        assert!(INITIAL_PITS.iter().all(|&p| pits.contains(p)), "default pits are present");
        assert!(INITIAL_PITS.iter().all(|&p| PitLayout::validate(p).is_ok()), "default pits obey the placement rules");
    }
}
