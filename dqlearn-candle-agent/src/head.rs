//! Output heads turning network outputs into action values.
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Maps the output of a [`QNetwork`](crate::model::QNetwork) to action values.
///
/// Selected once when the model is built.
pub enum QHead {
    /// The network outputs action values directly.
    Plain,

    /// Dueling decomposition: the network output is a shared trunk feeding a
    /// state-value stream and an advantage stream, recombined as
    /// `Q(s, a) = V(s) + A(s, a) - mean_a' A(s, a')`.
    Dueling {
        /// State-value stream.
        value: Linear,

        /// Advantage stream.
        advantage: Linear,
    },
}

impl QHead {
    /// Builds the dueling head on a trunk of `feature_dim` features.
    pub fn dueling(vb: VarBuilder, feature_dim: usize, n_actions: usize) -> Result<Self> {
        Ok(Self::Dueling {
            value: linear(feature_dim, 1, vb.pp("value"))?,
            advantage: linear(feature_dim, n_actions, vb.pp("advantage"))?,
        })
    }

    /// Maps outputs of shape `[batch, feature_dim]` to action values of shape `[batch, n_actions]`.
    pub fn forward(&self, xs: Tensor) -> Result<Tensor> {
        match self {
            Self::Plain => Ok(xs),
            Self::Dueling { value, advantage } => {
                let xs = xs.relu()?;
                let v = value.forward(&xs)?;
                let a = advantage.forward(&xs)?;
                let a = a.broadcast_sub(&a.mean_keepdim(D::Minus1)?)?;
                Ok(a.broadcast_add(&v)?)
            }
        }
    }

    /// Returns `true` for the dueling head.
    pub fn is_dueling(&self) -> bool {
        matches!(self, Self::Dueling { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_dueling_mean_equals_value() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let head = QHead::dueling(vb.pp("head"), 4, 3)?;

        let xs = Tensor::from_slice(&[0.5f32, -1.0, 2.0, 0.1, 1.0, 1.0, 0.0, 3.0], (2, 4), &Device::Cpu)?;
        let q = head.forward(xs.clone())?;
        assert_eq!(q.dims(), &[2, 3]);

        let v = match &head {
            QHead::Dueling { value, .. } => value.forward(&xs.relu()?)?,
            QHead::Plain => unreachable!(),
        };
        let mean_q = q.mean_keepdim(D::Minus1)?;
        let diff = (mean_q - v)?.abs()?.max_keepdim(0)?.flatten_all()?.to_vec1::<f32>()?;
        assert!(diff[0] < 1e-5);
        Ok(())
    }
}
