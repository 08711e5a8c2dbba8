//! Evaluation by mean undiscounted return.
use super::Evaluator;
use crate::{Env, Policy};
use anyhow::Result;

/// Runs a fixed number of episodes and scores a policy by its mean return.
///
/// Episodes end when the environment terminates or truncates them, or after
/// `max_episode_length` steps. The policy's state is reset at the start of
/// each episode.
///
/// ```rust
/// use dqlearn_core::{
///     toy_env::{TwoStateConfig, TwoStateEnv},
///     DefaultEvaluator, Evaluator, FirstActionPolicy,
/// };
///
/// let mut evaluator = DefaultEvaluator::<TwoStateEnv>::new(&TwoStateConfig::default(), 0, 2, 10).unwrap();
/// let mut policy = FirstActionPolicy::<TwoStateEnv>::default();
/// assert_eq!(evaluator.evaluate(&mut policy).unwrap(), 0.0);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    max_episode_length: usize,
    actions: Vec<E::Act>,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<f32> {
        let mut r_total = 0f32;

        for ix in 0..self.n_episodes {
            let mut obs = self.env.reset_with_index(ix)?;
            policy.reset_state();

            for _ in 0..self.max_episode_length {
                let a = policy.sample(&obs)?;
                let step = self.env.step(&self.actions[a])?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }
        }

        Ok(r_total / self.n_episodes.max(1) as f32)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs an evaluator with its own environment.
    pub fn new(
        config: &E::Config,
        seed: i64,
        n_episodes: usize,
        max_episode_length: usize,
    ) -> Result<Self> {
        let env = E::build(config, seed)?;
        Ok(Self {
            n_episodes,
            max_episode_length,
            actions: env.actions(),
            env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        toy_env::{TwoStateConfig, TwoStateEnv},
        Obs,
    };

    /// Always takes action `1` and counts episode starts.
    #[derive(Default)]
    struct AlwaysOne {
        n_resets: usize,
    }

    impl Policy<TwoStateEnv> for AlwaysOne {
        fn sample(&mut self, _obs: &Obs) -> Result<usize> {
            Ok(1)
        }

        fn reset_state(&mut self) {
            self.n_resets += 1;
        }
    }

    #[test]
    fn test_mean_return() -> Result<()> {
        let mut evaluator = DefaultEvaluator::<TwoStateEnv>::new(&TwoStateConfig::default(), 0, 3, 10)?;
        let mut policy = AlwaysOne::default();

        assert_eq!(evaluator.evaluate(&mut policy)?, 1.0);
        assert_eq!(policy.n_resets, 3);
        Ok(())
    }

    #[test]
    fn test_episode_length_cap() -> Result<()> {
        // the rewarding transition takes two steps
        let mut evaluator = DefaultEvaluator::<TwoStateEnv>::new(&TwoStateConfig::default(), 0, 1, 1)?;
        assert_eq!(evaluator.evaluate(&mut AlwaysOne::default())?, 0.0);
        Ok(())
    }
}
