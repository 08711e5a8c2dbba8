//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// Frequencies count environment steps. `eval_freq` and `log_freq` disable their
/// sub-phases when set to zero.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of environment steps of the training run.
    pub max_steps: usize,

    /// Interval of optimization steps.
    pub train_freq: usize,

    /// Optimization starts at this step.
    pub train_start: usize,

    /// Interval of target network synchronization.
    pub target_update_freq: usize,

    /// Interval of evaluation, `0` to disable it.
    ///
    /// The number of episodes and their length cap belong to the
    /// [`Evaluator`](crate::Evaluator) given to [`Trainer::train`](crate::Trainer::train).
    pub eval_freq: usize,

    /// Interval of logging.
    pub log_freq: usize,

    /// Episodes in training are cut after this number of steps.
    pub max_episode_length: usize,

    /// Fraction of `max_steps` over which epsilon is annealed.
    pub exploration_fraction: f32,

    /// Final value of epsilon.
    pub eps_end: f32,

    /// Declares that the agent carries a recurrent hidden state.
    pub recurrent: bool,

    /// Random seed of the training loop.
    pub seed: u64,

    /// Where to save the best-scoring parameters.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            train_freq: 4,
            train_start: 1000,
            target_update_freq: 1000,
            eval_freq: 0,
            log_freq: 1000,
            max_episode_length: 1000,
            exploration_fraction: 0.1,
            eps_end: 0.02,
            recurrent: false,
            seed: 42,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of environment steps.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the interval of optimization steps.
    pub fn train_freq(mut self, v: usize) -> Self {
        self.train_freq = v;
        self
    }

    /// Sets the step at which optimization starts.
    pub fn train_start(mut self, v: usize) -> Self {
        self.train_start = v;
        self
    }

    /// Sets the interval of target network synchronization.
    pub fn target_update_freq(mut self, v: usize) -> Self {
        self.target_update_freq = v;
        self
    }

    /// Sets the interval of evaluation.
    pub fn eval_freq(mut self, v: usize) -> Self {
        self.eval_freq = v;
        self
    }

    /// Sets the interval of logging.
    pub fn log_freq(mut self, v: usize) -> Self {
        self.log_freq = v;
        self
    }

    /// Sets the episode-length cap in training.
    pub fn max_episode_length(mut self, v: usize) -> Self {
        self.max_episode_length = v;
        self
    }

    /// Sets the fraction of steps over which epsilon is annealed.
    pub fn exploration_fraction(mut self, v: f32) -> Self {
        self.exploration_fraction = v;
        self
    }

    /// Sets the final value of epsilon.
    pub fn eps_end(mut self, v: f32) -> Self {
        self.eps_end = v;
        self
    }

    /// Declares recurrence of the agent.
    pub fn recurrent(mut self, v: bool) -> Self {
        self.recurrent = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory where the best parameters are saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
