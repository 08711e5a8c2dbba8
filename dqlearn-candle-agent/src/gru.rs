//! Recurrent action-value network built on a GRU cell.
use crate::model::{NetDims, QNetwork};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{linear, ops::sigmoid, Linear, Module, VarBuilder};
use dqlearn_core::error::DqlError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`GruQNet`].
pub struct GruConfig {
    in_dim: usize,
    hidden_dim: usize,
    out_dim: usize,
}

impl GruConfig {
    /// Creates configuration of [`GruQNet`].
    pub fn new(in_dim: usize, hidden_dim: usize, out_dim: usize) -> Self {
        Self {
            in_dim,
            hidden_dim,
            out_dim,
        }
    }
}

impl NetDims for GruConfig {
    fn set_in_dim(&mut self, v: usize) {
        self.in_dim = v;
    }

    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: usize) {
        self.out_dim = v;
    }
}

/// GRU cell followed by a linear readout.
///
/// Each call of [`QNetwork::forward`] advances the hidden state by one timestep.
/// The hidden state starts from zeros whenever it is `None`.
pub struct GruQNet {
    device: Device,
    hidden_dim: usize,

    /// Input-to-hidden weights of the reset, update and new gates.
    w_ih: Linear,

    /// Hidden-to-hidden weights of the reset, update and new gates.
    w_hh: Linear,

    readout: Linear,
    hidden: Option<Tensor>,
}

impl GruQNet {
    fn step(&self, xs: &Tensor, h: &Tensor) -> Result<Tensor> {
        let gi = self.w_ih.forward(xs)?.chunk(3, D::Minus1)?;
        let gh = self.w_hh.forward(h)?.chunk(3, D::Minus1)?;
        let r = sigmoid(&(&gi[0] + &gh[0])?)?;
        let z = sigmoid(&(&gi[1] + &gh[1])?)?;
        let n = (&gi[2] + (&r * &gh[2])?)?.tanh()?;

        // h' = (1 - z) * n + z * h
        Ok(((z.affine(-1.0, 1.0)? * n)? + (&z * h)?)?)
    }
}

impl QNetwork for GruQNet {
    type Config = GruConfig;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let h = config.hidden_dim;
        Ok(Self {
            device: vb.device().clone(),
            hidden_dim: h,
            w_ih: linear(config.in_dim, 3 * h, vb.pp("w_ih"))?,
            w_hh: linear(h, 3 * h, vb.pp("w_hh"))?,
            readout: linear(h, config.out_dim, vb.pp("readout"))?,
            hidden: None,
        })
    }

    fn forward(&mut self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        let batch_size = xs.dims()[0];
        let h = match &self.hidden {
            None => Tensor::zeros((batch_size, self.hidden_dim), DType::F32, &self.device)?,
            Some(h) if h.dims()[0] == batch_size => h.clone(),
            Some(h) => {
                return Err(DqlError::BatchMismatch(format!(
                    "hidden state of batch size {} given inputs of batch size {}",
                    h.dims()[0],
                    batch_size
                ))
                .into())
            }
        };
        let h = self.step(&xs, &h)?;
        let out = self.readout.forward(&h)?;
        self.hidden = Some(h);
        Ok(out)
    }

    fn is_recurrent(&self) -> bool {
        true
    }

    fn hidden_state(&self) -> Option<Tensor> {
        self.hidden.clone()
    }

    fn set_hidden_state(&mut self, hidden: Option<Tensor>) {
        self.hidden = hidden;
    }

    fn reset_hidden_state(&mut self) {
        self.hidden = None;
    }

    fn detach_hidden_state(&mut self) {
        self.hidden = self.hidden.as_ref().map(|h| h.detach());
    }
}
