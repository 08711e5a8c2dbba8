use crate::{
    head::QHead,
    model::{NetDims, QNetwork},
    opt::OptimizerConfig,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`QModel`].
pub struct QModelConfig<C> {
    pub(super) q_config: Option<C>,

    #[serde(default)]
    pub(super) dueling: bool,

    pub(super) opt_config: OptimizerConfig,
}

impl<C> Default for QModelConfig<C> {
    fn default() -> Self {
        Self {
            q_config: None,
            dueling: false,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<C> QModelConfig<C>
where
    C: DeserializeOwned + Serialize,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: C) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Uses the dueling decomposition.
    ///
    /// The output dimension of the network is then the width of the shared trunk.
    pub fn dueling(mut self, v: bool) -> Self {
        self.dueling = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`QModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value function owning its [`VarMap`].
///
/// A [`QNetwork`] followed by a [`QHead`]. The head is chosen once in
/// [`QModel::build`] from [`QModelConfig`].
pub struct QModel<Q: QNetwork> {
    device: Device,
    varmap: VarMap,
    obs_dim: usize,
    n_actions: usize,
    q: Q,
    head: QHead,
}

impl<Q: QNetwork> QModel<Q> {
    /// Constructs [`QModel`] for observations of `obs_dim` and `n_actions` actions.
    pub fn build(
        config: &QModelConfig<Q::Config>,
        obs_dim: usize,
        n_actions: usize,
        device: &Device,
    ) -> Result<Self> {
        let mut q_config = config.q_config.clone().context("q_config is not set.")?;
        q_config.set_in_dim(obs_dim);
        if !config.dueling {
            q_config.set_out_dim(n_actions);
        }
        let feature_dim = q_config.get_out_dim();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let q = Q::build(vb.pp("q"), q_config)?;
        let head = match config.dueling {
            true => QHead::dueling(vb.pp("head"), feature_dim, n_actions)?,
            false => QHead::Plain,
        };

        Ok(Self {
            device: device.clone(),
            varmap,
            obs_dim,
            n_actions,
            q,
            head,
        })
    }

    /// Outputs the action values of shape `[batch, n_actions]` given observations.
    pub fn forward(&mut self, obs: &Tensor) -> Result<Tensor> {
        let xs = self.q.forward(obs)?;
        self.head.forward(xs)
    }

    /// The variables of the model.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// The device of the model.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Dimension of observations.
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// The number of actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Returns `true` if the model uses the dueling decomposition.
    pub fn is_dueling(&self) -> bool {
        self.head.is_dueling()
    }

    /// Returns `true` if the network carries a hidden state.
    pub fn is_recurrent(&self) -> bool {
        self.q.is_recurrent()
    }

    /// Returns the hidden state of the network.
    pub fn hidden_state(&self) -> Option<Tensor> {
        self.q.hidden_state()
    }

    /// Replaces the hidden state of the network.
    pub fn set_hidden_state(&mut self, hidden: Option<Tensor>) {
        self.q.set_hidden_state(hidden)
    }

    /// Resets the hidden state of the network.
    pub fn reset_hidden_state(&mut self) {
        self.q.reset_hidden_state()
    }

    /// Cuts the computation graph behind the hidden state.
    pub fn detach_hidden_state(&mut self) {
        self.q.detach_hidden_state()
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save qmodel to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters saved with [`QModel::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load qmodel from {:?}", path.as_ref());
        Ok(())
    }
}
