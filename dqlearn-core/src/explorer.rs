//! Exploration strategy of the training loop.
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linearly annealed epsilon-greedy action selection.
///
/// Epsilon decreases from `1.0` to `eps_end` over the first
/// `exploration_fraction * max_steps` steps and stays at `eps_end` afterwards.
/// The schedule depends only on the step counter, so the explorer keeps no state.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Step budget of the training run.
    pub max_steps: usize,

    /// Fraction of the step budget over which epsilon is annealed.
    pub exploration_fraction: f32,

    /// Final value of epsilon.
    pub eps_end: f32,
}

impl EpsilonGreedy {
    /// Constructs the explorer.
    pub fn new(max_steps: usize, exploration_fraction: f32, eps_end: f32) -> Self {
        Self {
            max_steps,
            exploration_fraction,
            eps_end,
        }
    }

    /// Epsilon at step `t`.
    pub fn eps(&self, t: usize) -> f32 {
        let horizon = self.exploration_fraction * self.max_steps as f32;
        if horizon <= 0.0 {
            return self.eps_end;
        }
        (1.0 - (1.0 - self.eps_end) * t as f32 / horizon).max(self.eps_end)
    }

    /// Selects an action at step `t` and returns it with the epsilon used.
    ///
    /// `greedy` is called only when exploiting.
    pub fn action<R, F>(&self, t: usize, n_actions: usize, greedy: F, rng: &mut R) -> Result<(usize, f32)>
    where
        R: Rng,
        F: FnOnce() -> Result<usize>,
    {
        let eps = self.eps(t);
        let act = if rng.gen::<f32>() < eps {
            rng.gen_range(0..n_actions)
        } else {
            greedy()?
        };
        Ok((act, eps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_linear_schedule() {
        let explorer = EpsilonGreedy::new(1000, 0.1, 0.05);

        assert_eq!(explorer.eps(0), 1.0);
        assert!((explorer.eps(50) - 0.525).abs() < 1e-6);
        assert!((explorer.eps(100) - 0.05).abs() < 1e-6);
        assert_eq!(explorer.eps(500), 0.05);
    }

    #[test]
    fn test_zero_fraction_is_greedy_schedule() {
        let explorer = EpsilonGreedy::new(1000, 0.0, 0.1);
        assert_eq!(explorer.eps(0), 0.1);
    }

    #[test]
    fn test_greedy_is_lazy() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);

        // epsilon is one at t = 0, so the greedy closure must never run
        let explorer = EpsilonGreedy::new(100, 0.5, 0.0);
        for _ in 0..50 {
            let (a, eps) = explorer.action(0, 3, || panic!("greedy called"), &mut rng)?;
            assert!(a < 3);
            assert_eq!(eps, 1.0);
        }

        // epsilon is zero after the annealing horizon
        let (a, eps) = explorer.action(100, 3, || Ok(2), &mut rng)?;
        assert_eq!((a, eps), (2, 0.0));
        Ok(())
    }
}
