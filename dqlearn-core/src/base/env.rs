//! Environment.
use super::{Info, Obs, Step};
use anyhow::Result;
use std::fmt::Debug;

/// Represents an environment, typically an MDP.
///
/// The environment exposes a fixed, ordered set of actions through [`Env::actions`].
/// Agents and replay stores refer to actions by their index in that ordering.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Action of the environment.
    type Act: Clone + Debug;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which is useful when evaluating a trained agent. This method is called by
    /// [`DefaultEvaluator`](crate::DefaultEvaluator).
    fn reset_with_index(&mut self, ix: usize) -> Result<Obs> {
        let _ = ix;
        self.reset()
    }

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Discount factor of the task.
    fn discount(&self) -> f32;

    /// The ordered set of actions.
    fn actions(&self) -> Vec<Self::Act>;

    /// Dimension of observations.
    fn obs_dim(&self) -> usize;
}
