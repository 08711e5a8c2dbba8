use super::{QModel, QModelConfig};
use crate::{model::QNetwork, util::hard_update};
use anyhow::Result;
use candle_core::Tensor;
use log::trace;

/// Frozen copy of the active action-value function.
///
/// The target owns its own [`VarMap`](candle_nn::VarMap), never receives
/// gradients and is replaced wholesale by [`TargetNetwork::sync`].
pub struct TargetNetwork<Q: QNetwork> {
    model: QModel<Q>,
}

impl<Q: QNetwork> TargetNetwork<Q> {
    /// Builds a target holding a copy of the parameters of `active`.
    pub fn new(config: &QModelConfig<Q::Config>, active: &QModel<Q>) -> Result<Self> {
        let model = QModel::build(config, active.obs_dim(), active.n_actions(), active.device())?;
        let mut target = Self { model };
        target.sync(active)?;
        Ok(target)
    }

    /// Replaces the parameters with a deep copy of those of `active`.
    pub fn sync(&mut self, active: &QModel<Q>) -> Result<()> {
        trace!("Copy parameters to the target network");
        hard_update(self.model.varmap(), active.varmap())
    }

    /// Action values, detached from the computation graph.
    pub fn forward(&mut self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.model.forward(obs)?.detach())
    }

    /// The model of the target.
    pub fn model(&self) -> &QModel<Q> {
        &self.model
    }

    /// Mutable access to the model of the target.
    pub fn model_mut(&mut self) -> &mut QModel<Q> {
        &mut self.model
    }

    /// Resets the hidden state and cuts the computation graph behind it.
    pub fn clear_hidden_state(&mut self) {
        self.model.reset_hidden_state();
        self.model.detach_hidden_state();
    }
}
