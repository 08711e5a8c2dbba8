//! DQN agent implemented with candle.
use super::{config::DqnConfig, BatchUpdater, QModel, QPolicy, TargetNetwork, UpdateInfo};
use crate::{model::QNetwork, opt::Optimizer};
use anyhow::Result;
use candle_core::Tensor;
use dqlearn_core::{
    error::DqlError,
    replay_buffer::ReplayBatch, Agent, Env, Obs, OptInfo, Policy, ReplayBufferBase,
};
use log::trace;
use std::{fs, marker::PhantomData, path::Path};

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// Owns the active network (through its greedy [`QPolicy`]), the [`TargetNetwork`]
/// and the optimizer. Exploration is left to the trainer; [`Policy::sample`] of the
/// agent is greedy.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: QNetwork,
{
    pub(in crate::dqn) policy: QPolicy<E, Q>,
    pub(in crate::dqn) target: TargetNetwork<Q>,
    pub(in crate::dqn) opt: Optimizer,
    pub(in crate::dqn) updater: BatchUpdater,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) n_opts: usize,
    phantom: PhantomData<R>,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: QNetwork,
{
    /// Constructs DQN agent for the observation size, actions and discount factor of `env`.
    pub fn build(config: &DqnConfig<Q::Config>, env: &E) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(DqlError::InvalidConfig("batch_size must be positive".into()).into());
        }
        let device = config.device.unwrap_or_default().to_candle()?;
        let model_config = &config.model_config;
        let n_actions = env.actions().len();
        let qnet = QModel::build(model_config, env.obs_dim(), n_actions, &device)?;
        let target = TargetNetwork::new(model_config, &qnet)?;
        let opt = model_config.opt_config.build(qnet.varmap().all_vars())?;
        let updater = BatchUpdater::new(config.double_dqn, env.discount(), config.clip_grad_norm);

        Ok(Self {
            policy: QPolicy::new(qnet),
            target,
            opt,
            updater,
            batch_size: config.batch_size,
            train: false,
            n_opts: 0,
            phantom: PhantomData,
        })
    }

    /// The active network.
    pub fn qnet(&self) -> &QModel<Q> {
        self.policy.qnet()
    }

    /// The target network.
    pub fn target(&self) -> &TargetNetwork<Q> {
        &self.target
    }

    /// The number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn update(&mut self, batch: &ReplayBatch) -> Result<UpdateInfo> {
        let qnet = self.policy.qnet_mut();
        match batch {
            ReplayBatch::Transition(b) => self.updater.update(qnet, &mut self.target, &mut self.opt, b),
            ReplayBatch::Trace(b) => self.updater.update_trace(qnet, &mut self.target, &mut self.opt, b),
        }
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: QNetwork,
{
    fn sample(&mut self, obs: &Obs) -> Result<usize> {
        self.policy.greedy(obs)
    }

    fn reset_state(&mut self) {
        self.policy.reset_state();
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: QNetwork,
    R: ReplayBufferBase<Batch = ReplayBatch>,
{
    type Hidden = Option<Tensor>;
    type Policy = QPolicy<E, Q>;

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn is_recurrent(&self) -> bool {
        self.policy.qnet().is_recurrent()
    }

    fn hidden_state(&self) -> Self::Hidden {
        self.policy.hidden_state()
    }

    fn set_hidden_state(&mut self, hidden: Self::Hidden) {
        self.policy.set_hidden_state(hidden);
    }

    fn opt(&mut self, buffer: &mut R) -> Result<OptInfo> {
        let batch = buffer.batch(self.batch_size)?;
        let ix_sample = match &batch {
            ReplayBatch::Transition(b) => b.ix_sample.clone(),
            ReplayBatch::Trace(_) => None,
        };
        let info = self.update(&batch)?;
        self.n_opts += 1;
        trace!("opt {}: loss = {}", self.n_opts, info.loss);

        Ok(OptInfo {
            loss: info.loss,
            grad_norm: info.grad_norm,
            ix_sample,
            td_err: info.td_err,
        })
    }

    fn sync_target(&mut self) -> Result<()> {
        self.target.sync(self.policy.qnet())
    }

    fn into_policy(self) -> Self::Policy {
        self.policy
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.policy.qnet().save(path.join("qnet.safetensors"))?;
        self.target.model().save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.policy.qnet_mut().load(path.join("qnet.safetensors"))?;
        self.target.model_mut().load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}
