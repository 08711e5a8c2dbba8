//! Train [`Agent`].
mod config;
mod context;
mod sampler;
use crate::{
    error::DqlError,
    record::{Record, RecordValue, Recorder},
    Agent, Env, EpsilonGreedy, Evaluator, Experience, ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
pub use context::{TrainContext, RETURN_WINDOW};
use log::{debug, info, warn};
pub use sampler::Sampler;
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop of a DQN agent.
///
/// # Training loop
///
/// [`Trainer::train`] first validates the configuration against the agent and the
/// replay store, then runs environment steps `t = 1..=max_steps`. Each step executes
/// the following sub-phases in this order:
///
/// 1. **Act**: [`EpsilonGreedy`] selects an action with epsilon annealed over
///    `exploration_fraction * max_steps` steps.
/// 2. **Step**: the environment advances.
/// 3. **Store**: the transition is pushed into the replay store.
/// 4. **Episode boundary**: if the episode terminated, was truncated or reached
///    `max_episode_length`, the environment and the state of the agent are reset.
/// 5. **Train**: if `t >= train_start`, `t % train_freq == 0` and the store holds
///    sampleable data, the hidden state of the agent is saved, [`Agent::opt`] runs,
///    the hidden state is restored and priorities are updated with the TD errors.
/// 6. **Target sync**: if `t % target_update_freq == 0`, [`Agent::sync_target`].
/// 7. **Evaluate**: if `t % eval_freq == 0`, the agent is evaluated in eval mode
///    and the best-scoring parameters are saved in `(model_dir)/best`.
/// 8. **Log**: if `t % log_freq == 0`, epsilon, the mean return of the last
///    [`RETURN_WINDOW`] episodes, the latest loss and gradient norm are written
///    to the recorder.
///
/// After `max_steps`, the agent is turned into its policy with [`Agent::into_policy`].
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action index|X[EpsilonGreedy]
///     X-->|Env::Act|B[Env]
///     B-->|Step|C[Sampler]
///     C-->|Experience|D[ReplayBufferBase]
///     D-->|Batch|A
///     A-->|OptInfo::td_err|D
/// ```
///
/// # Configuration errors
///
/// Training refuses to start when
/// * the agent is recurrent but `recurrent` is not set ([`DqlError::RecurrenceNotDeclared`]),
/// * `recurrent` disagrees with the replay discipline; recurrent training needs an
///   episodic store and vice versa ([`DqlError::ReplayDisciplineMismatch`]),
/// * `train_freq` or `target_update_freq` is zero, or the replay store cannot be
///   built from its configuration ([`DqlError::InvalidConfig`]).
pub struct Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = Experience> + ReplayBufferBase,
{
    config: TrainerConfig,

    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,
}

impl<E, R> Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = Experience> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig, env_config: E::Config, replay_buffer_config: R::Config) -> Self {
        Self {
            config,
            env_config,
            replay_buffer_config,
        }
    }

    /// The configuration of the trainer.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn validate<A: Agent<E, R>>(&self, agent: &A, buffer: &R) -> Result<()> {
        if agent.is_recurrent() && !self.config.recurrent {
            return Err(DqlError::RecurrenceNotDeclared.into());
        }
        if buffer.is_episodic() != self.config.recurrent {
            return Err(DqlError::ReplayDisciplineMismatch {
                recurrent: self.config.recurrent,
                episodic: buffer.is_episodic(),
            }
            .into());
        }
        if self.config.train_freq == 0 {
            return Err(DqlError::InvalidConfig("train_freq must be positive".into()).into());
        }
        if self.config.target_update_freq == 0 {
            return Err(
                DqlError::InvalidConfig("target_update_freq must be positive".into()).into(),
            );
        }
        Ok(())
    }

    fn is_tick(t: usize, freq: usize) -> bool {
        freq > 0 && t % freq == 0
    }

    /// Save hidden state, optimize, restore hidden state, update priorities.
    fn train_step<A: Agent<E, R>>(agent: &mut A, buffer: &mut R, ctx: &mut TrainContext) -> Result<()> {
        let hidden = agent.hidden_state();
        let opt_info = agent.opt(buffer);
        agent.set_hidden_state(hidden);
        let opt_info = opt_info?;

        buffer.update_priority(&opt_info.ix_sample, &opt_info.td_err);
        if !opt_info.loss.is_finite() {
            warn!("Non-finite loss {} at step {}", opt_info.loss, ctx.t);
        }
        ctx.record_opt(&opt_info);
        Ok(())
    }

    fn evaluate<A, D>(&self, agent: &mut A, evaluator: &mut D, ctx: &mut TrainContext) -> Result<f32>
    where
        A: Agent<E, R>,
        D: Evaluator<E>,
    {
        info!("Starts evaluation at step {}", ctx.t);
        let hidden = agent.hidden_state();
        agent.eval();
        let score = evaluator.evaluate(agent);
        agent.train();
        agent.set_hidden_state(hidden);
        let score = score?;
        info!("Evaluation score = {}", score);

        if ctx.improve_eval(score) {
            if let Some(model_dir) = &self.config.model_dir {
                let path = Path::new(model_dir).join("best");
                match agent.save_params(&path) {
                    Ok(()) => info!("Saved the best model in {:?}", &path),
                    Err(e) => warn!("Failed to save the model in {:?}: {}", &path, e),
                }
            }
        }
        Ok(score)
    }

    fn log_record(ctx: &TrainContext) -> Record {
        let mut record = Record::from_slice(&[
            ("env_steps", RecordValue::Scalar(ctx.t as f32)),
            ("eps", RecordValue::Scalar(ctx.eps)),
            ("episodes", RecordValue::Scalar(ctx.n_episodes as f32)),
            ("datetime", RecordValue::DateTime(Local::now())),
        ]);
        if let Some(r) = ctx.mean_return() {
            record.insert("mean_return", RecordValue::Scalar(r));
        }
        if let Some(loss) = ctx.loss {
            record.insert("loss", RecordValue::Scalar(loss));
        }
        if let Some(grad_norm) = ctx.grad_norm {
            record.insert("grad_norm", RecordValue::Scalar(grad_norm));
        }
        record
    }

    /// Trains the agent and returns its policy.
    pub fn train<A, D>(
        &mut self,
        mut agent: A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<A::Policy>
    where
        A: Agent<E, R>,
        D: Evaluator<E>,
    {
        let mut buffer = R::build(&self.replay_buffer_config)?;
        self.validate(&agent, &buffer)?;

        let env = E::build(&self.env_config, self.config.seed as i64)?;
        let mut sampler = Sampler::new(env, self.config.max_episode_length);
        let explorer = EpsilonGreedy::new(
            self.config.max_steps,
            self.config.exploration_fraction,
            self.config.eps_end,
        );
        let mut ctx = TrainContext::new(self.config.seed);
        agent.train();

        for t in 1..=self.config.max_steps {
            ctx.t = t;
            sampler.sample_and_push(&mut agent, &explorer, &mut ctx, &mut buffer)?;

            if t >= self.config.train_start
                && Self::is_tick(t, self.config.train_freq)
                && !buffer.is_empty()
            {
                Self::train_step(&mut agent, &mut buffer, &mut ctx)?;
            }

            if Self::is_tick(t, self.config.target_update_freq) {
                agent.sync_target()?;
                debug!("Synchronized the target network at step {}", t);
            }

            if Self::is_tick(t, self.config.eval_freq) {
                let score = self.evaluate(&mut agent, evaluator, &mut ctx)?;
                let mut record = Record::from_scalar("eval_reward", score);
                record.insert("env_steps", RecordValue::Scalar(t as f32));
                recorder.write(record);
            }

            if Self::is_tick(t, self.config.log_freq) {
                let record = Self::log_record(&ctx);
                info!(
                    "step = {}, eps = {:.3}, mean_return = {:?}, loss = {:?}, grad_norm = {:?}",
                    t,
                    ctx.eps,
                    ctx.mean_return(),
                    ctx.loss,
                    ctx.grad_norm
                );
                recorder.write(record);
                recorder.flush(t);
            }
        }

        info!(
            "Finished training: {} steps, {} episodes, {} optimization steps",
            self.config.max_steps, ctx.n_episodes, ctx.n_opts
        );
        Ok(agent.into_policy())
    }
}
