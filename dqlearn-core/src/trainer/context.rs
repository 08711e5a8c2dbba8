//! Run-wide mutable state of the training loop.
use crate::OptInfo;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::VecDeque;

/// Episodes averaged by [`TrainContext::mean_return`].
pub const RETURN_WINDOW: usize = 100;

/// Mutable state of a training run, passed through the sub-phases of each step.
pub struct TrainContext {
    /// Random number generator used for exploration.
    pub rng: StdRng,

    /// The current environment step, starting from 1.
    pub t: usize,

    /// Epsilon of the last action selection.
    pub eps: f32,

    /// Return of the running episode so far.
    pub episode_return: f32,

    /// Steps taken in the running episode.
    pub episode_length: usize,

    /// The number of finished episodes.
    pub n_episodes: usize,

    /// The number of optimization steps.
    pub n_opts: usize,

    /// Loss of the latest optimization step, `None` before the first one.
    pub loss: Option<f32>,

    /// Gradient norm of the latest optimization step.
    pub grad_norm: Option<f32>,

    /// Best evaluation score so far.
    pub best_eval: Option<f32>,

    returns: VecDeque<f32>,
}

impl TrainContext {
    /// Creates a context with a seeded random number generator.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            t: 0,
            eps: 1.0,
            episode_return: 0.0,
            episode_length: 0,
            n_episodes: 0,
            n_opts: 0,
            loss: None,
            grad_norm: None,
            best_eval: None,
            returns: VecDeque::with_capacity(RETURN_WINDOW),
        }
    }

    /// Closes the running episode and returns its return and length.
    pub fn end_episode(&mut self) -> (f32, usize) {
        let ended = (self.episode_return, self.episode_length);
        if self.returns.len() == RETURN_WINDOW {
            self.returns.pop_front();
        }
        self.returns.push_back(self.episode_return);
        self.n_episodes += 1;
        self.episode_return = 0.0;
        self.episode_length = 0;
        ended
    }

    /// Mean return over the last [`RETURN_WINDOW`] episodes.
    pub fn mean_return(&self) -> Option<f32> {
        if self.returns.is_empty() {
            None
        } else {
            Some(self.returns.iter().sum::<f32>() / self.returns.len() as f32)
        }
    }

    /// Keeps the result of an optimization step.
    pub fn record_opt(&mut self, info: &OptInfo) {
        self.n_opts += 1;
        self.loss = Some(info.loss);
        self.grad_norm = Some(info.grad_norm);
    }

    /// Updates the best evaluation score and returns `true` if `score` improves it.
    pub fn improve_eval(&mut self, score: f32) -> bool {
        match self.best_eval {
            Some(best) if best >= score => false,
            _ => {
                self.best_eval = Some(score);
                true
            }
        }
    }
}
