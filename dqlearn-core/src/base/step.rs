//! Environment step.
use super::{Env, Obs};

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits [`Step`] object at every interaction steps.
/// The training loop turns it into an [`Experience`] with the observation `o_t`
/// it keeps from the previous step.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation.
    pub obs: Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated by the environment.
    pub is_truncated: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// A transition `(o_t, a_t, r_t, o_t+1, done_t)` stored in replay stores.
///
/// `act` is the index of the action in the ordering given by [`Env::actions`].
/// Experiences are never modified after being pushed.
#[derive(Clone, Debug, PartialEq)]
pub struct Experience {
    /// Observation `o_t`.
    pub obs: Obs,

    /// Index of the action `a_t`.
    pub act: usize,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: Obs,

    /// The episode terminated at this step. Used as the done flag of the TD target.
    pub is_terminated: bool,

    /// The episode was cut at this step, either by the environment or by the
    /// episode-length cap of the training loop.
    pub is_truncated: bool,
}

impl Experience {
    /// Constructs an experience.
    pub fn new(
        obs: Obs,
        act: usize,
        reward: f32,
        next_obs: Obs,
        is_terminated: bool,
        is_truncated: bool,
    ) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            is_terminated,
            is_truncated,
        }
    }

    /// If this experience closes an episode.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
