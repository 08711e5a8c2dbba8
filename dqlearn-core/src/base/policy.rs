//! Policy.
use super::{Env, Obs};
use anyhow::Result;
use std::marker::PhantomData;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to the index of an action in
/// the ordering given by [`Env::actions`].
pub trait Policy<E: Env> {
    /// Sample an action given an observation.
    fn sample(&mut self, obs: &Obs) -> Result<usize>;

    /// Resets the internal state of the policy at the start of an episode.
    ///
    /// Policies without memory do nothing.
    fn reset_state(&mut self) {}
}

/// A policy always taking the first action.
///
/// Used as a baseline and in tests.
pub struct FirstActionPolicy<E> {
    phantom: PhantomData<E>,
}

impl<E> Default for FirstActionPolicy<E> {
    fn default() -> Self {
        Self {
            phantom: PhantomData,
        }
    }
}

impl<E: Env> Policy<E> for FirstActionPolicy<E> {
    fn sample(&mut self, _obs: &Obs) -> Result<usize> {
        Ok(0)
    }
}
