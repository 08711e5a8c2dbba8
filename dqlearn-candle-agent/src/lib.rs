//! Deep Q-learning agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The agent [`Dqn`](dqn::Dqn) plugs into [`dqlearn_core::Trainer`]. Its action-value
//! function is any [`QNetwork`](model::QNetwork); [`Mlp`](mlp::Mlp) and the recurrent
//! [`GruQNet`](gru::GruQNet) are provided.
pub mod dqn;
pub mod gru;
pub mod head;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Returns the corresponding candle device.
    pub fn to_candle(self) -> Result<candle_core::Device> {
        Ok(match self {
            Self::Cpu => candle_core::Device::Cpu,
            Self::Cuda(n) => candle_core::Device::new_cuda(n)?,
        })
    }
}
