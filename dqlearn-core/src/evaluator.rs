//! Evaluate policies.
use crate::{Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluates policies on an environment.
pub trait Evaluator<E: Env> {
    /// Returns a score of the policy, higher is better.
    ///
    /// The caller handles the mode of the policy, like training/evaluation mode,
    /// and any hidden state it needs to keep across the call.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<f32>;
}
