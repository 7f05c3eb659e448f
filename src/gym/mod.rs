pub mod patrol_grid;
pub mod pits;

pub use patrol_grid::{
    Action, Collision, Enemy, GridState, Heading, PatrolGrid, Position, AGENT_START, GOAL,
    GRID_SIZE, INITIAL_ENEMIES, MAX_STEPS,
};
pub use pits::{PitLayout, PlacementError, Toggle, INITIAL_PITS};
