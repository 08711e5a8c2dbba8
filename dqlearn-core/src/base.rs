//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::{Agent, OptInfo};
pub use env::Env;
pub use policy::{FirstActionPolicy, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use step::{Experience, Info, Step};

/// Observation of an environment.
///
/// Observations are flat vectors whose length is given by [`Env::obs_dim`].
pub type Obs = Vec<f32>;
