use super::QModel;
use crate::model::QNetwork;
use anyhow::Result;
use candle_core::{Tensor, D};
use dqlearn_core::{error::DqlError, Env, Obs, Policy};
use std::marker::PhantomData;

/// Greedy policy over the action values of a [`QModel`].
///
/// The network keeps its hidden state across calls, so a recurrent policy is
/// conditioned on the episode so far. [`Policy::reset_state`] clears it.
pub struct QPolicy<E, Q: QNetwork> {
    qnet: QModel<Q>,
    phantom: PhantomData<E>,
}

impl<E, Q> QPolicy<E, Q>
where
    E: Env,
    Q: QNetwork,
{
    /// Wraps a model.
    pub fn new(qnet: QModel<Q>) -> Self {
        Self {
            qnet,
            phantom: PhantomData,
        }
    }

    /// The model.
    pub fn qnet(&self) -> &QModel<Q> {
        &self.qnet
    }

    /// Mutable access to the model.
    pub fn qnet_mut(&mut self) -> &mut QModel<Q> {
        &mut self.qnet
    }

    /// Consumes the policy and returns the model.
    pub fn into_qnet(self) -> QModel<Q> {
        self.qnet
    }

    fn obs_tensor(&self, obs: &Obs) -> Result<Tensor> {
        let obs_dim = self.qnet.obs_dim();
        if obs.len() != obs_dim {
            return Err(DqlError::BatchMismatch(format!(
                "observation of dimension {} given to a network of input dimension {}",
                obs.len(),
                obs_dim
            ))
            .into());
        }
        Ok(Tensor::from_slice(&obs[..], (1, obs_dim), self.qnet.device())?)
    }

    /// Action values of a single observation, advancing the hidden state.
    pub fn action_values(&mut self, obs: &Obs) -> Result<Vec<f32>> {
        let xs = self.obs_tensor(obs)?;
        let q = self.qnet.forward(&xs)?.detach();
        self.qnet.detach_hidden_state();
        Ok(q.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Index of the action with the largest value.
    pub fn greedy(&mut self, obs: &Obs) -> Result<usize> {
        let xs = self.obs_tensor(obs)?;
        let a = self.qnet.forward(&xs)?.detach().argmax(D::Minus1)?;
        self.qnet.detach_hidden_state();
        Ok(a.squeeze(0)?.to_scalar::<u32>()? as usize)
    }

    /// Returns the hidden state of the model.
    pub fn hidden_state(&self) -> Option<Tensor> {
        self.qnet.hidden_state()
    }

    /// Replaces the hidden state of the model.
    pub fn set_hidden_state(&mut self, hidden: Option<Tensor>) {
        self.qnet.set_hidden_state(hidden)
    }
}

impl<E, Q> Policy<E> for QPolicy<E, Q>
where
    E: Env,
    Q: QNetwork,
{
    fn sample(&mut self, obs: &Obs) -> Result<usize> {
        self.greedy(obs)
    }

    fn reset_state(&mut self) {
        self.qnet.reset_hidden_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dqn::QModelConfig, gru::GruConfig, gru::GruQNet, mlp::Mlp, mlp::MlpConfig};
    use candle_core::Device;
    use dqlearn_core::toy_env::TwoStateEnv;

    #[test]
    fn test_greedy_is_argmax() -> Result<()> {
        let config = QModelConfig::default().q_config(MlpConfig::new(2, vec![8], 3, false));
        let qnet = QModel::<Mlp>::build(&config, 2, 3, &Device::Cpu)?;
        let mut policy = QPolicy::<TwoStateEnv, _>::new(qnet);

        let obs = vec![1.0, 0.0];
        let q = policy.action_values(&obs)?;
        let a = policy.sample(&obs)?;
        assert_eq!(q.len(), 3);
        assert!(q.iter().all(|&v| v <= q[a]));
        Ok(())
    }

    #[test]
    fn test_wrong_observation_dimension() -> Result<()> {
        let config = QModelConfig::default().q_config(MlpConfig::new(2, vec![8], 2, false));
        let qnet = QModel::<Mlp>::build(&config, 2, 2, &Device::Cpu)?;
        let mut policy = QPolicy::<TwoStateEnv, _>::new(qnet);
        assert!(policy.sample(&vec![1.0, 0.0, 0.0]).is_err());
        Ok(())
    }

    #[test]
    fn test_reset_state_clears_memory() -> Result<()> {
        let config = QModelConfig::default().q_config(GruConfig::new(2, 4, 2));
        let qnet = QModel::<GruQNet>::build(&config, 2, 2, &Device::Cpu)?;
        let mut policy = QPolicy::<TwoStateEnv, _>::new(qnet);

        let obs = vec![0.0, 1.0];
        let first = policy.action_values(&obs)?;
        policy.action_values(&obs)?;
        assert!(policy.hidden_state().is_some());

        policy.reset_state();
        assert!(policy.hidden_state().is_none());
        assert_eq!(policy.action_values(&obs)?, first);
        Ok(())
    }
}
