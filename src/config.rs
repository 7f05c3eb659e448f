use thiserror::Error;

use crate::{algo::tabular::QTableAgentConfig, exploration::EpsilonGreedy};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for `{name}`: {value} is outside {interval}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        interval: &'static str,
    },
}

/// Learning hyperparameters of one training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    /// Learning rate in `(0, 1]`
    pub alpha: f32,
    /// Discount factor in `(0, 1]`
    pub gamma: f32,
    /// Exploration rate in `[0, 1]`
    pub epsilon: f32,
    /// Number of training episodes, 0 makes training a no-op
    pub episodes: u32,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.1,
            episodes: 100_000,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |name, value: f32, ok: bool, interval| {
            ok.then_some(()).ok_or(ConfigError::OutOfRange {
                name,
                value,
                interval,
            })
        };
        check("alpha", self.alpha, self.alpha > 0.0 && self.alpha <= 1.0, "(0, 1]")?;
        check("gamma", self.gamma, self.gamma > 0.0 && self.gamma <= 1.0, "(0, 1]")?;
        check("epsilon", self.epsilon, (0.0..=1.0).contains(&self.epsilon), "[0, 1]")
    }
}

impl From<Hyperparameters> for QTableAgentConfig {
    fn from(h: Hyperparameters) -> Self {
        Self {
            exploration: EpsilonGreedy::new(h.epsilon),
            alpha: h.alpha,
            gamma: h.gamma,
        }
    }
}
