//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use anyhow::Result;
use std::path::Path;

/// Information returned by an optimization step.
#[derive(Clone, Debug, PartialEq)]
pub struct OptInfo {
    /// Value of the loss function.
    pub loss: f32,

    /// Global norm of the gradient before clipping.
    pub grad_norm: f32,

    /// Indices of the sampled transitions, given by replay stores that track them.
    pub ix_sample: Option<Vec<usize>>,

    /// TD errors of the sampled transitions.
    pub td_err: Vec<f32>,
}

/// Represents a trainable policy on an environment.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Snapshot of the hidden state of the inference network.
    type Hidden;

    /// The policy returned after training.
    type Policy: Policy<E>;

    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Return if the value function carries a recurrent hidden state.
    fn is_recurrent(&self) -> bool;

    /// Returns the current hidden state of the inference network.
    fn hidden_state(&self) -> Self::Hidden;

    /// Restores a hidden state obtained with [`Agent::hidden_state`].
    fn set_hidden_state(&mut self, hidden: Self::Hidden);

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. Priorities are not updated here; the caller
    /// passes [`OptInfo::td_err`] to [`ReplayBufferBase::update_priority`].
    fn opt(&mut self, buffer: &mut R) -> Result<OptInfo>;

    /// Replaces the parameters of the target network with a copy of the active ones.
    fn sync_target(&mut self) -> Result<()>;

    /// Consumes the agent and returns the policy bound to its active network.
    fn into_policy(self) -> Self::Policy;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
