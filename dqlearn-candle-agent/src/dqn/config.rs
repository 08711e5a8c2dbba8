//! Configuration of DQN agent.
use super::QModelConfig;
use crate::{opt::OptimizerConfig, Device};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_double_dqn() -> bool {
    true
}

/// Constructs [`Dqn`](super::Dqn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C> {
    pub(super) model_config: QModelConfig<C>,
    pub(super) batch_size: usize,
    #[serde(default = "default_double_dqn")]
    pub(super) double_dqn: bool,
    #[serde(default)]
    pub(super) clip_grad_norm: Option<f64>,
    pub device: Option<Device>,
}

impl<C> Default for DqnConfig<C> {
    /// Constructs DQN builder with default parameters.
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 32,
            double_dqn: true,
            clip_grad_norm: Some(10.0),
            device: None,
        }
    }
}

impl<C> DqnConfig<C>
where
    C: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: QModelConfig<C>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the configuration of the action-value network.
    pub fn q_config(mut self, v: C) -> Self {
        self.model_config = self.model_config.q_config(v);
        self
    }

    /// Uses the dueling decomposition.
    pub fn dueling(mut self, v: bool) -> Self {
        self.model_config = self.model_config.dueling(v);
        self
    }

    /// Sets the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.model_config = self.model_config.opt_config(v);
        self
    }

    /// Overrides the learning rate of the optimizer.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        let opt_config = self.model_config.opt_config.clone().learning_rate(lr);
        self.model_config = self.model_config.opt_config(opt_config);
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Selects next actions with the active network and evaluates them with the target.
    pub fn double_dqn(mut self, v: bool) -> Self {
        self.double_dqn = v;
        self
    }

    /// Maximum global norm of gradients, `None` for no clipping.
    pub fn clip_grad_norm(mut self, v: Option<f64>) -> Self {
        self.clip_grad_norm = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}
