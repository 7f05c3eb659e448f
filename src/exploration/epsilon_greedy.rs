use rand::Rng;

use crate::assert_interval;

use super::Choice;

/// Epsilon greedy exploration policy with a fixed exploration rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f32,
}

impl EpsilonGreedy {
    /// Initialize epsilon greedy policy
    ///
    /// **Panics** if `epsilon` is not in the interval `[0,1]`
    pub fn new(epsilon: f32) -> Self {
        assert_interval!(epsilon, 0.0, 1.0);
        Self { epsilon }
    }

    /// Pure exploitation
    pub fn greedy() -> Self {
        Self { epsilon: 0.0 }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Invoke epsilon greedy policy
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f32>() < self.epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use statrs::distribution::{Binomial, DiscreteCDF};

    use super::*;

    #[test]
    fn exploration_rate_matches_epsilon() {
        const TRIALS: u64 = 10_000;
        let policy = EpsilonGreedy::new(0.3);
        let mut rng = StdRng::seed_from_u64(42);

        let explored = (0..TRIALS)
            .filter(|_| matches!(policy.choose(&mut rng), Choice::Explore))
            .count() as u64;

        let dist = Binomial::new(0.3, TRIALS).unwrap();
        let (lo, hi) = (dist.inverse_cdf(1e-6), dist.inverse_cdf(1.0 - 1e-6));
        assert!(
            (lo..=hi).contains(&explored),
            "{explored} explorations out of {TRIALS} is outside [{lo}, {hi}]"
        );
    }

    #[test]
    fn extremes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        let greedy = EpsilonGreedy::greedy();
        let random = EpsilonGreedy::new(1.0);
        for _ in 0..1000 {
            assert!(matches!(greedy.choose(&mut rng), Choice::Exploit), "epsilon 0 never explores");
            assert!(matches!(random.choose(&mut rng), Choice::Explore), "epsilon 1 always explores");
        }
    }

    #[test]
    #[should_panic]
    fn rejects_invalid_epsilon() {
        EpsilonGreedy::new(1.5);
    }
}
