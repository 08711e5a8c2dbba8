//! Batches generated by replay stores.
use crate::Experience;

/// A batch of transitions with fields stacked along the batch axis.
///
/// Observations are flattened row-major, `obs.len() == len() * obs_dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// Dimension of an observation.
    pub obs_dim: usize,

    /// Observations `o_t`.
    pub obs: Vec<f32>,

    /// Action indices `a_t`.
    pub act: Vec<usize>,

    /// Rewards `r_t`.
    pub reward: Vec<f32>,

    /// Observations `o_t+1`.
    pub next_obs: Vec<f32>,

    /// Done flags `d_t` as `0.0` or `1.0`.
    pub is_done: Vec<f32>,

    /// Importance-sampling weights, all ones unless sampled by priority.
    pub weight: Vec<f32>,

    /// Slots the transitions were sampled from, when the store tracks them.
    pub ix_sample: Option<Vec<usize>>,
}

impl TransitionBatch {
    /// Creates an empty batch with room for `n` transitions.
    pub fn with_capacity(obs_dim: usize, n: usize) -> Self {
        Self {
            obs_dim,
            obs: Vec::with_capacity(n * obs_dim),
            act: Vec::with_capacity(n),
            reward: Vec::with_capacity(n),
            next_obs: Vec::with_capacity(n * obs_dim),
            is_done: Vec::with_capacity(n),
            weight: Vec::with_capacity(n),
            ix_sample: None,
        }
    }

    /// Appends a transition with unit weight.
    pub fn push(&mut self, tr: &Experience) {
        debug_assert_eq!(tr.obs.len(), self.obs_dim);
        self.obs.extend_from_slice(&tr.obs);
        self.act.push(tr.act);
        self.reward.push(tr.reward);
        self.next_obs.extend_from_slice(&tr.next_obs);
        self.is_done.push(if tr.is_terminated { 1.0 } else { 0.0 });
        self.weight.push(1.0);
    }

    /// Appends a padding entry: zero observations, action `0`, zero reward and done.
    ///
    /// Action `0` is a placeholder, not a taken action; padded entries are masked out
    /// of the loss.
    pub fn push_padding(&mut self) {
        self.obs.extend(std::iter::repeat(0.0).take(self.obs_dim));
        self.act.push(0);
        self.reward.push(0.0);
        self.next_obs.extend(std::iter::repeat(0.0).take(self.obs_dim));
        self.is_done.push(1.0);
        self.weight.push(1.0);
    }

    /// The number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }
}

/// A batch of fixed-length sub-traces of episodes.
///
/// `steps[t]` holds timestep `t` of every trace in the batch, and `mask[t][b]`
/// is `1.0` for a real timestep and `0.0` for left padding.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceBatch {
    /// Per-timestep transition batches.
    pub steps: Vec<TransitionBatch>,

    /// Per-timestep masks.
    pub mask: Vec<Vec<f32>>,
}

impl TraceBatch {
    /// Length of the traces.
    pub fn trace_length(&self) -> usize {
        self.steps.len()
    }

    /// The number of traces.
    pub fn batch_size(&self) -> usize {
        self.steps.first().map_or(0, |s| s.len())
    }
}

/// A batch produced by [`ReplayStore`](super::ReplayStore).
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayBatch {
    /// Independent transitions.
    Transition(TransitionBatch),

    /// Sub-traces of episodes.
    Trace(TraceBatch),
}

impl ReplayBatch {
    /// The number of samples (transitions or traces) in the batch.
    pub fn len(&self) -> usize {
        match self {
            Self::Transition(b) => b.len(),
            Self::Trace(b) => b.batch_size(),
        }
    }

    /// Returns `true` if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
