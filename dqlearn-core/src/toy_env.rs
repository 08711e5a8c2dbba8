//! A deterministic two-state environment for tests and examples.
use crate::{Env, Obs, Step};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration of [`TwoStateEnv`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TwoStateConfig {
    /// Episodes are truncated after this number of steps.
    pub time_limit: usize,

    /// Discount factor.
    pub discount: f32,
}

impl Default for TwoStateConfig {
    fn default() -> Self {
        Self {
            time_limit: 50,
            discount: 0.9,
        }
    }
}

impl TwoStateConfig {
    /// Sets the time limit.
    pub fn time_limit(mut self, v: usize) -> Self {
        self.time_limit = v;
        self
    }
}

/// Two states, two actions.
///
/// Observations are one-hot encodings of the state. Action `a` moves the agent to
/// state `a`, except that action `1` in state `1` yields reward `1.0` and terminates
/// the episode. Every other step yields reward `0.0`. Episodes start in state `0`.
pub struct TwoStateEnv {
    state: usize,
    n_steps: usize,
    config: TwoStateConfig,
}

impl TwoStateEnv {
    fn obs(&self) -> Obs {
        let mut obs = vec![0.0; 2];
        obs[self.state] = 1.0;
        obs
    }

    /// The current state.
    pub fn state(&self) -> usize {
        self.state
    }
}

impl Env for TwoStateEnv {
    type Config = TwoStateConfig;
    type Act = usize;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            state: 0,
            n_steps: 0,
            config: config.clone(),
        })
    }

    fn reset(&mut self) -> Result<Obs> {
        self.state = 0;
        self.n_steps = 0;
        Ok(self.obs())
    }

    fn step(&mut self, a: &usize) -> Result<Step<Self>> {
        self.n_steps += 1;
        let (reward, is_terminated) = if self.state == 1 && *a == 1 {
            self.state = 0;
            (1.0, true)
        } else {
            self.state = (*a).min(1);
            (0.0, false)
        };
        let is_truncated = !is_terminated && self.n_steps >= self.config.time_limit;
        Ok(Step::new(self.obs(), *a, reward, is_terminated, is_truncated, ()))
    }

    fn discount(&self) -> f32 {
        self.config.discount
    }

    fn actions(&self) -> Vec<usize> {
        vec![0, 1]
    }

    fn obs_dim(&self) -> usize {
        2
    }
}
