//! Replay store sampling transitions uniformly.
use super::{RingBuffer, TransitionBatch};
use crate::{error::DqlError, Experience, ExperienceBufferBase};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Replay store sampling transitions uniformly with replacement.
pub struct UniformReplayBuffer {
    ring: RingBuffer<Experience>,
    rng: StdRng,
}

impl UniformReplayBuffer {
    /// Creates an empty store.
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Samples `size` transitions; every importance weight is one.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch> {
        if self.ring.is_empty() {
            return Err(DqlError::EmptyReplayBuffer.into());
        }
        let n = self.ring.len();
        let obs_dim = self.ring.get(0).obs.len();
        let mut batch = TransitionBatch::with_capacity(obs_dim, size);
        for _ in 0..size {
            let ix = self.rng.gen_range(0..n);
            batch.push(self.ring.get(ix));
        }
        Ok(batch)
    }

    /// Returns the transition stored in slot `ix`.
    pub fn get(&self, ix: usize) -> &Experience {
        self.ring.get(ix)
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl ExperienceBufferBase for UniformReplayBuffer {
    type Item = Experience;

    fn push(&mut self, tr: Experience) -> Result<()> {
        self.ring.push(tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.ring.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(id: usize) -> Experience {
        Experience::new(vec![id as f32], 0, id as f32, vec![id as f32 + 1.0], false, false)
    }

    #[test]
    fn test_capacity_and_fifo_overwrite() -> Result<()> {
        let mut buffer = UniformReplayBuffer::new(4, 0);
        for id in 0..10 {
            buffer.push(tr(id))?;
        }

        assert_eq!(buffer.len(), 4);
        // ids 6..10 survive, id 8 landed in slot 0 after two full cycles
        let ids = (0..4).map(|ix| buffer.get(ix).reward as usize).collect::<Vec<_>>();
        assert_eq!(ids, vec![8, 9, 6, 7]);
        Ok(())
    }

    #[test]
    fn test_uniform_batch_has_unit_weights() -> Result<()> {
        let mut buffer = UniformReplayBuffer::new(8, 0);
        for id in 0..3 {
            buffer.push(tr(id))?;
        }

        let batch = buffer.batch(16)?;
        assert_eq!(batch.len(), 16);
        assert_eq!(batch.obs.len(), 16);
        assert!(batch.weight.iter().all(|&w| w == 1.0));
        assert!(batch.reward.iter().all(|&r| r < 3.0));
        assert!(batch.ix_sample.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let mut buffer = UniformReplayBuffer::new(8, 0);
        assert!(buffer.batch(4).is_err());
    }
}
