//! DQN agent.
//!
//! [`Dqn`] learns an action-value function with double Q-learning, a Huber loss on
//! importance-weighted TD errors and a [`TargetNetwork`] synchronized by hard copies.
//! Batches of sub-traces from an episodic store are unrolled through recurrent
//! networks by [`BatchUpdater::update_trace`].
mod base;
mod config;
mod model;
mod policy;
mod target;
mod update;
pub use base::Dqn;
pub use config::DqnConfig;
pub use model::{QModel, QModelConfig};
pub use policy::QPolicy;
pub use target::TargetNetwork;
pub use update::{BatchTensors, BatchUpdater, UpdateInfo};
