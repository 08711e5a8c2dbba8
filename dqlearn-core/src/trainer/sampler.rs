//! Environment interaction of the training loop.
use super::TrainContext;
use crate::{Agent, Env, EpsilonGreedy, Experience, ExperienceBufferBase, Obs, ReplayBufferBase};
use anyhow::Result;
use log::debug;

/// Takes environment steps and pushes the resulting transitions into a replay store.
///
/// The sampler owns the training environment and the observation `o_t` the next
/// action is chosen from.
pub struct Sampler<E: Env> {
    env: E,
    actions: Vec<E::Act>,
    obs: Option<Obs>,
    max_episode_length: usize,
}

impl<E: Env> Sampler<E> {
    /// Creates a sampler stepping `env`.
    pub fn new(env: E, max_episode_length: usize) -> Self {
        let actions = env.actions();
        Self {
            env,
            actions,
            obs: None,
            max_episode_length,
        }
    }

    /// Runs the act, step, store and episode-boundary sub-phases of step `ctx.t`.
    ///
    /// For recurrent agents the greedy action is computed at every step, even when
    /// the explorer then acts randomly, so that the hidden state of the agent sees
    /// the whole episode.
    pub fn sample_and_push<A, R>(
        &mut self,
        agent: &mut A,
        explorer: &EpsilonGreedy,
        ctx: &mut TrainContext,
        buffer: &mut R,
    ) -> Result<()>
    where
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Experience> + ReplayBufferBase,
    {
        let obs = match self.obs.take() {
            Some(obs) => obs,
            None => {
                agent.reset_state();
                self.env.reset()?
            }
        };

        // Act
        let n_actions = self.actions.len();
        let (act, eps) = if agent.is_recurrent() {
            let greedy = agent.sample(&obs)?;
            explorer.action(ctx.t, n_actions, || Ok(greedy), &mut ctx.rng)?
        } else {
            explorer.action(ctx.t, n_actions, || agent.sample(&obs), &mut ctx.rng)?
        };
        ctx.eps = eps;

        // Step
        let step = self.env.step(&self.actions[act])?;
        ctx.episode_return += step.reward;
        ctx.episode_length += 1;
        let is_truncated = step.is_truncated || ctx.episode_length >= self.max_episode_length;

        // Store
        buffer.push(Experience::new(
            obs,
            act,
            step.reward,
            step.obs.clone(),
            step.is_terminated,
            is_truncated,
        ))?;

        // Episode boundary
        if step.is_terminated || is_truncated {
            let (ret, len) = ctx.end_episode();
            debug!(
                "Episode {} ended at step {}: return = {}, length = {}",
                ctx.n_episodes, ctx.t, ret, len
            );
            self.obs = Some(self.env.reset()?);
            agent.reset_state();
        } else {
            self.obs = Some(step.obs);
        }
        Ok(())
    }
}
