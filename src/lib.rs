//! Tabular Q-learning for a grid world with static pits and patrolling enemies.
//!
//! ```no_run
//! use patrol_rl::engine::Engine;
//!
//! let mut engine = Engine::new();
//! engine.train_with(|checkpoint| println!("{}", checkpoint.stats));
//! println!("{}", engine.run().outcome);
//! ```

/// Implemented RL algorithms
pub mod algo;

/// Hyperparameters and their validation
pub mod config;

/// Train, run and reset controls for a presentation layer
pub mod engine;

/// Environment
pub mod env;

/// Exploration policies
pub mod exploration;

/// The patrolled grid world
pub mod gym;

/// Transitions
pub mod memory;

/// Greedy rollouts of a learned policy
pub mod rollout;

/// Episode statistics
pub mod stats;

/// Training loop
pub mod train;

/// Terminal dashboard for training progress
#[cfg(feature = "viz")]
pub mod viz;

mod util;
