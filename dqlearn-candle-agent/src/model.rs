//! Interface of action-value networks.
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarBuilder;

/// Input and output dimensions of a network configuration.
///
/// [`QModel`](crate::dqn::QModel) sets them from the environment before
/// building the network.
pub trait NetDims {
    /// Sets the input dimension.
    fn set_in_dim(&mut self, v: usize);

    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// Network mapping a batch of observations to one output per action, or to
/// features when followed by a dueling head.
///
/// The network does not own its [`VarMap`]; parameters are created through the
/// given [`VarBuilder`].
///
/// Recurrent networks carry a hidden state across calls of [`QNetwork::forward`].
/// The default implementations of the hidden-state methods describe a network
/// without memory.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait QNetwork {
    /// Configuration from which the network is constructed.
    type Config: NetDims + Clone;

    /// Builds the network.
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Maps observations of shape `[batch, in_dim]` to outputs of shape `[batch, out_dim]`.
    fn forward(&mut self, xs: &Tensor) -> Result<Tensor>;

    /// Returns `true` if the network carries a hidden state.
    fn is_recurrent(&self) -> bool {
        false
    }

    /// Returns the hidden state, `None` if it is in its initial value.
    fn hidden_state(&self) -> Option<Tensor> {
        None
    }

    /// Replaces the hidden state.
    fn set_hidden_state(&mut self, _hidden: Option<Tensor>) {}

    /// Resets the hidden state to its initial value.
    fn reset_hidden_state(&mut self) {}

    /// Cuts the computation graph behind the hidden state.
    fn detach_hidden_state(&mut self) {}
}
