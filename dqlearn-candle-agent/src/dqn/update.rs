//! Batch update engine.
use super::{QModel, TargetNetwork};
use crate::{
    model::QNetwork,
    opt::Optimizer,
    util::{clip_grad_norm, grad_norm, huber},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use dqlearn_core::{
    error::DqlError,
    replay_buffer::{TraceBatch, TransitionBatch},
};

/// Result of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInfo {
    /// Value of the loss.
    pub loss: f32,

    /// TD errors, one per sample of the batch.
    pub td_err: Vec<f32>,

    /// Global norm of the gradient before clipping.
    pub grad_norm: f32,
}

/// Fields of a [`TransitionBatch`] as tensors.
pub struct BatchTensors {
    /// Observations, `[batch, obs_dim]`.
    pub obs: Tensor,

    /// Action indices, `[batch]` of `u32`.
    pub act: Tensor,

    /// Rewards, `[batch]`.
    pub reward: Tensor,

    /// Next observations, `[batch, obs_dim]`.
    pub next_obs: Tensor,

    /// Done flags, `[batch]`.
    pub is_done: Tensor,

    /// Importance-sampling weights, `[batch]`.
    pub weight: Tensor,
}

impl BatchTensors {
    /// Moves a batch to the device.
    pub fn from_batch(batch: &TransitionBatch, device: &Device) -> Result<Self> {
        let n = batch.len();
        let d = batch.obs_dim;
        let act = batch.act.iter().map(|&a| a as u32).collect::<Vec<_>>();

        Ok(Self {
            obs: Tensor::from_slice(&batch.obs[..], (n, d), device)?,
            act: Tensor::from_vec(act, (n,), device)?,
            reward: Tensor::from_slice(&batch.reward[..], (n,), device)?,
            next_obs: Tensor::from_slice(&batch.next_obs[..], (n, d), device)?,
            is_done: Tensor::from_slice(&batch.is_done[..], (n,), device)?,
            weight: Tensor::from_slice(&batch.weight[..], (n,), device)?,
        })
    }
}

/// Computes TD targets and losses, and applies gradient steps to the active network.
///
/// With double Q-learning the action at the next observation is selected by the active
/// network and evaluated by the target network:
/// `td_target = r + (1 - d) * gamma * Q_tgt(s', argmax_a Q(s', a))`.
/// Otherwise `td_target = r + (1 - d) * gamma * max_a Q_tgt(s', a)`.
///
/// The loss is `mean(huber(w * td_err))` with importance-sampling weights `w`.
pub struct BatchUpdater {
    double_dqn: bool,
    discount: f32,
    clip_grad_norm: Option<f64>,
}

impl BatchUpdater {
    /// Constructs the updater.
    pub fn new(double_dqn: bool, discount: f32, clip_grad_norm: Option<f64>) -> Self {
        Self {
            double_dqn,
            discount,
            clip_grad_norm,
        }
    }

    /// Greedy actions of the active network, `[batch, 1]` of `u32`.
    fn select<Q: QNetwork>(qnet: &mut QModel<Q>, next_obs: &Tensor) -> Result<Tensor> {
        Ok(qnet.forward(next_obs)?.detach().argmax_keepdim(D::Minus1)?)
    }

    /// Value of the next observations under the target network, given the selected actions.
    fn evaluate<Q: QNetwork>(
        tgt: &mut TargetNetwork<Q>,
        next_obs: &Tensor,
        selected: Option<&Tensor>,
    ) -> Result<Tensor> {
        let q = tgt.forward(next_obs)?;
        Ok(match selected {
            Some(a) => q.gather(a, D::Minus1)?.squeeze(D::Minus1)?,
            None => q.max(D::Minus1)?,
        })
    }

    fn bootstrap(&self, b: &BatchTensors, v: &Tensor) -> Result<Tensor> {
        let not_done = b.is_done.affine(-1.0, 1.0)?;
        let tgt = (&b.reward + (not_done * v)?.affine(self.discount as f64, 0.0)?)?;
        Ok(tgt.detach())
    }

    /// TD targets of a batch of transitions.
    pub fn td_target<Q: QNetwork>(
        &self,
        qnet: &mut QModel<Q>,
        tgt: &mut TargetNetwork<Q>,
        b: &BatchTensors,
    ) -> Result<Tensor> {
        let selected = match self.double_dqn {
            true => Some(Self::select(qnet, &b.next_obs)?),
            false => None,
        };
        let v = Self::evaluate(tgt, &b.next_obs, selected.as_ref())?;
        self.bootstrap(b, &v)
    }

    fn q_sa<Q: QNetwork>(qnet: &mut QModel<Q>, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok(qnet
            .forward(obs)?
            .gather(&act.unsqueeze(D::Minus1)?, D::Minus1)?
            .squeeze(D::Minus1)?)
    }

    fn step<Q: QNetwork>(&self, loss: &Tensor, qnet: &QModel<Q>, opt: &mut Optimizer) -> Result<f32> {
        let mut grads = loss.backward()?;
        let vars = qnet.varmap().all_vars();
        let norm = match self.clip_grad_norm {
            Some(max_norm) => clip_grad_norm(&mut grads, &vars, max_norm)?,
            None => grad_norm(&grads, &vars)?,
        };
        opt.step(&grads)?;
        Ok(norm)
    }

    fn clear_hidden_states<Q: QNetwork>(qnet: &mut QModel<Q>, tgt: &mut TargetNetwork<Q>) {
        qnet.reset_hidden_state();
        qnet.detach_hidden_state();
        tgt.clear_hidden_state();
    }

    /// Updates the active network with a batch of transitions.
    pub fn update<Q: QNetwork>(
        &self,
        qnet: &mut QModel<Q>,
        tgt: &mut TargetNetwork<Q>,
        opt: &mut Optimizer,
        batch: &TransitionBatch,
    ) -> Result<UpdateInfo> {
        if batch.is_empty() {
            return Err(DqlError::BatchMismatch("empty batch".into()).into());
        }
        Self::clear_hidden_states(qnet, tgt);
        let b = BatchTensors::from_batch(batch, qnet.device())?;

        let td_target = self.td_target(qnet, tgt, &b)?;
        let td_err = (Self::q_sa(qnet, &b.obs, &b.act)? - td_target)?;
        let loss = huber(&(&td_err * &b.weight)?)?.mean_all()?;
        let grad_norm = self.step(&loss, qnet, opt)?;
        Self::clear_hidden_states(qnet, tgt);

        Ok(UpdateInfo {
            loss: loss.to_scalar::<f32>()?,
            td_err: td_err.detach().to_vec1::<f32>()?,
            grad_norm,
        })
    }

    /// Updates the active network with a batch of sub-traces.
    ///
    /// Each of the three passes (action selection, target evaluation and the online
    /// estimate) unrolls its network over the trace from a clean hidden state. TD errors
    /// of padded timesteps are zeroed by the mask, and the loss is the mean over
    /// timesteps of the per-timestep loss. Hidden states of both networks are reset
    /// afterwards.
    ///
    /// The returned TD error of a trace is the mean absolute TD error over its real
    /// timesteps.
    pub fn update_trace<Q: QNetwork>(
        &self,
        qnet: &mut QModel<Q>,
        tgt: &mut TargetNetwork<Q>,
        opt: &mut Optimizer,
        batch: &TraceBatch,
    ) -> Result<UpdateInfo> {
        let l = batch.trace_length();
        let n = batch.batch_size();
        if l == 0 || n == 0 {
            return Err(DqlError::BatchMismatch("empty trace batch".into()).into());
        }
        let device = qnet.device().clone();
        let steps = batch
            .steps
            .iter()
            .map(|s| BatchTensors::from_batch(s, &device))
            .collect::<Result<Vec<_>>>()?;
        let masks = batch
            .mask
            .iter()
            .map(|m| Ok(Tensor::from_slice(&m[..], (n,), &device)?))
            .collect::<Result<Vec<_>>>()?;

        // action selection by the active network
        Self::clear_hidden_states(qnet, tgt);
        let mut selected = Vec::with_capacity(l);
        if self.double_dqn {
            for s in steps.iter() {
                selected.push(Self::select(qnet, &s.next_obs)?);
            }
        }

        // action evaluation by the target network
        let mut td_targets = Vec::with_capacity(l);
        for (t, s) in steps.iter().enumerate() {
            let v = Self::evaluate(tgt, &s.next_obs, selected.get(t))?;
            td_targets.push(self.bootstrap(s, &v)?);
        }

        // online estimates
        qnet.reset_hidden_state();
        let mut losses = Vec::with_capacity(l);
        let mut td_abs = Tensor::zeros((n,), DType::F32, &device)?;
        for ((s, mask), td_target) in steps.iter().zip(masks.iter()).zip(td_targets.iter()) {
            let td_err = ((Self::q_sa(qnet, &s.obs, &s.act)? - td_target)? * mask)?;
            losses.push(huber(&(&td_err * &s.weight)?)?.mean_all()?);
            td_abs = (td_abs + td_err.detach().abs()?)?;
        }
        let loss = Tensor::stack(&losses[..], 0)?.mean_all()?;
        let grad_norm = self.step(&loss, qnet, opt)?;
        Self::clear_hidden_states(qnet, tgt);

        let n_real = batch
            .mask
            .iter()
            .fold(vec![0f32; n], |acc, m| acc.iter().zip(m.iter()).map(|(a, b)| a + b).collect());
        let td_err = td_abs
            .to_vec1::<f32>()?
            .iter()
            .zip(n_real.iter())
            .map(|(e, c)| e / c.max(1.0))
            .collect();

        Ok(UpdateInfo {
            loss: loss.to_scalar::<f32>()?,
            td_err,
            grad_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dqn::QModelConfig,
        gru::GruConfig,
        gru::GruQNet,
        model::NetDims,
        opt::OptimizerConfig,
        util::{set_var, var_values},
    };
    use candle_nn::{Init, VarBuilder};
    use dqlearn_core::Experience;
    use serde::{Deserialize, Serialize};

    /// Outputs the same action values for every observation.
    struct ConstQ {
        values: Tensor,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct ConstQConfig {
        n_actions: usize,
    }

    impl NetDims for ConstQConfig {
        fn set_in_dim(&mut self, _v: usize) {}

        fn get_out_dim(&self) -> usize {
            self.n_actions
        }

        fn set_out_dim(&mut self, v: usize) {
            self.n_actions = v;
        }
    }

    impl QNetwork for ConstQ {
        type Config = ConstQConfig;

        fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
            let values = vb.get_with_hints((1, config.n_actions), "values", Init::Const(0.0))?;
            Ok(Self { values })
        }

        fn forward(&mut self, xs: &Tensor) -> Result<Tensor> {
            Ok(self.values.broadcast_as((xs.dims()[0], self.values.dims()[1]))?.contiguous()?)
        }
    }

    fn const_q(values: &[f32]) -> Result<QModel<ConstQ>> {
        let config = QModelConfig::default().q_config(ConstQConfig { n_actions: 2 });
        let qnet = QModel::<ConstQ>::build(&config, 1, 2, &Device::Cpu)?;
        set_var(qnet.varmap(), "q.values", &Tensor::from_slice(values, (1, 2), &Device::Cpu)?)?;
        Ok(qnet)
    }

    fn one_transition(reward: f32, is_terminated: bool) -> Result<BatchTensors> {
        let mut batch = TransitionBatch::with_capacity(1, 1);
        batch.push(&Experience::new(vec![0.0], 0, reward, vec![0.0], is_terminated, false));
        BatchTensors::from_batch(&batch, &Device::Cpu)
    }

    #[test]
    fn test_double_q_decouples_selection_and_evaluation() -> Result<()> {
        let config = QModelConfig::default().q_config(ConstQConfig { n_actions: 2 });
        let mut active = const_q(&[1.0, 5.0])?;
        let mut target = TargetNetwork::new(&config, &active)?;
        set_var(
            target.model().varmap(),
            "q.values",
            &Tensor::from_slice(&[3.0f32, 2.0], (1, 2), &Device::Cpu)?,
        )?;
        let b = one_transition(1.0, false)?;

        // argmax of the active network is action 1, valued 2 by the target
        let double = BatchUpdater::new(true, 0.9, None).td_target(&mut active, &mut target, &b)?;
        assert!((double.to_vec1::<f32>()?[0] - (1.0 + 0.9 * 2.0)).abs() < 1e-6);

        // the plain target takes the maximum of the target network
        let plain = BatchUpdater::new(false, 0.9, None).td_target(&mut active, &mut target, &b)?;
        assert!((plain.to_vec1::<f32>()?[0] - (1.0 + 0.9 * 3.0)).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_terminal_transitions_do_not_bootstrap() -> Result<()> {
        let config = QModelConfig::default().q_config(ConstQConfig { n_actions: 2 });
        let mut active = const_q(&[1.0, 5.0])?;
        let mut target = TargetNetwork::new(&config, &active)?;
        let b = one_transition(0.5, true)?;

        let td_target = BatchUpdater::new(true, 0.9, None).td_target(&mut active, &mut target, &b)?;
        assert_eq!(td_target.to_vec1::<f32>()?, vec![0.5]);
        Ok(())
    }

    #[test]
    fn test_target_is_isolated_from_updates() -> Result<()> {
        let config = QModelConfig::default()
            .q_config(ConstQConfig { n_actions: 2 })
            .opt_config(OptimizerConfig::Adam { lr: 0.1 });
        let mut active = const_q(&[1.0, 5.0])?;
        let mut target = TargetNetwork::new(&config, &active)?;
        let mut opt = config.opt_config.build(active.varmap().all_vars())?;

        let mut batch = TransitionBatch::with_capacity(1, 2);
        batch.push(&Experience::new(vec![0.0], 0, 10.0, vec![0.0], true, false));
        batch.push(&Experience::new(vec![0.0], 1, -10.0, vec![0.0], true, false));
        let info = BatchUpdater::new(true, 0.9, None).update(&mut active, &mut target, &mut opt, &batch)?;

        assert!(info.loss.is_finite() && info.grad_norm > 0.0);
        assert_eq!(info.td_err, vec![1.0 - 10.0, 5.0 + 10.0]);
        assert_ne!(var_values(active.varmap(), "q.values")?, vec![1.0, 5.0]);
        assert_eq!(var_values(target.model().varmap(), "q.values")?, vec![1.0, 5.0]);

        target.sync(&active)?;
        assert_eq!(
            var_values(target.model().varmap(), "q.values")?,
            var_values(active.varmap(), "q.values")?
        );
        Ok(())
    }

    #[test]
    fn test_padding_does_not_contribute_gradient() -> Result<()> {
        let config = QModelConfig::default().q_config(GruConfig::new(2, 4, 2));
        let mut active = QModel::<GruQNet>::build(&config, 2, 2, &Device::Cpu)?;
        let mut target = TargetNetwork::new(&config, &active)?;
        let mut opt = config.opt_config.build(active.varmap().all_vars())?;
        let before = var_values(active.varmap(), "q.readout.weight")?;

        // every timestep is padding
        let mut steps = Vec::new();
        for _ in 0..3 {
            let mut step = TransitionBatch::with_capacity(2, 2);
            step.push_padding();
            step.push_padding();
            steps.push(step);
        }
        let batch = TraceBatch {
            steps,
            mask: vec![vec![0.0, 0.0]; 3],
        };
        let info = BatchUpdater::new(true, 0.9, None).update_trace(&mut active, &mut target, &mut opt, &batch)?;

        assert_eq!(info.loss, 0.0);
        assert_eq!(info.grad_norm, 0.0);
        assert_eq!(info.td_err, vec![0.0, 0.0]);
        assert_eq!(var_values(active.varmap(), "q.readout.weight")?, before);
        assert!(active.hidden_state().is_none());
        assert!(target.model().hidden_state().is_none());
        Ok(())
    }

    #[test]
    fn test_trace_update_resets_hidden_states() -> Result<()> {
        let config = QModelConfig::default().q_config(GruConfig::new(2, 4, 2));
        let mut active = QModel::<GruQNet>::build(&config, 2, 2, &Device::Cpu)?;
        let mut target = TargetNetwork::new(&config, &active)?;
        let mut opt = config.opt_config.build(active.varmap().all_vars())?;

        let mut steps = Vec::new();
        for t in 0..4 {
            let mut step = TransitionBatch::with_capacity(2, 1);
            step.push(&Experience::new(vec![1.0, 0.0], t % 2, 1.0, vec![0.0, 1.0], t == 3, false));
            steps.push(step);
        }
        let batch = TraceBatch {
            steps,
            mask: vec![vec![1.0]; 4],
        };

        // an inference state of another batch size must not get in the way
        active.forward(&Tensor::zeros((3, 2), DType::F32, &Device::Cpu)?)?;
        let info = BatchUpdater::new(false, 0.9, Some(1.0)).update_trace(&mut active, &mut target, &mut opt, &batch)?;

        assert!(info.loss.is_finite() && info.loss > 0.0);
        assert_eq!(info.td_err.len(), 1);
        assert!(active.hidden_state().is_none());
        Ok(())
    }
}
