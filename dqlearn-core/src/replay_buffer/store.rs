//! Tagged union of the replay stores.
use super::{
    EpisodicReplayBuffer, PrioritizedReplayBuffer, ReplayBatch, ReplayKind, ReplayStoreConfig,
    UniformReplayBuffer,
};
use crate::{Experience, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;

/// A replay store whose discipline is selected once from [`ReplayStoreConfig`].
pub enum ReplayStore {
    /// Uniform sampling of transitions.
    Uniform(UniformReplayBuffer),

    /// Prioritized sampling of transitions.
    Prioritized(PrioritizedReplayBuffer),

    /// Sub-traces of whole episodes.
    Episodic(EpisodicReplayBuffer),
}

impl ExperienceBufferBase for ReplayStore {
    type Item = Experience;

    fn push(&mut self, tr: Experience) -> Result<()> {
        match self {
            Self::Uniform(b) => b.push(tr),
            Self::Prioritized(b) => b.push(tr),
            Self::Episodic(b) => b.push(tr),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Uniform(b) => b.len(),
            Self::Prioritized(b) => b.len(),
            Self::Episodic(b) => b.len(),
        }
    }
}

impl ReplayBufferBase for ReplayStore {
    type Config = ReplayStoreConfig;
    type Batch = ReplayBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        Ok(match &config.kind {
            ReplayKind::Uniform => {
                Self::Uniform(UniformReplayBuffer::new(config.capacity, config.seed))
            }
            ReplayKind::Prioritized(per_config) => Self::Prioritized(
                PrioritizedReplayBuffer::new(config.capacity, config.seed, per_config),
            ),
            ReplayKind::Episodic { trace_length } => Self::Episodic(EpisodicReplayBuffer::new(
                config.capacity,
                config.seed,
                *trace_length,
            )),
        })
    }

    fn batch(&mut self, size: usize) -> Result<ReplayBatch> {
        Ok(match self {
            Self::Uniform(b) => ReplayBatch::Transition(b.batch(size)?),
            Self::Prioritized(b) => ReplayBatch::Transition(b.batch(size)?),
            Self::Episodic(b) => ReplayBatch::Trace(b.batch(size)?),
        })
    }

    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_err: &[f32]) {
        if let (Self::Prioritized(b), Some(ixs)) = (self, ixs) {
            b.update_priority(ixs, td_err);
        }
    }

    fn is_episodic(&self) -> bool {
        matches!(self, Self::Episodic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::DqlError, replay_buffer::PerConfig};

    fn tr(id: usize, is_terminated: bool) -> Experience {
        Experience::new(vec![id as f32], 0, id as f32, vec![0.0], is_terminated, false)
    }

    #[test]
    fn test_build_selects_discipline() -> Result<()> {
        let config = ReplayStoreConfig::default().capacity(8);
        let mut uniform = ReplayStore::build(&config)?;
        let mut prioritized = ReplayStore::build(&config.clone().prioritized(PerConfig::default()))?;
        let mut episodic = ReplayStore::build(&config.episodic(2))?;

        assert!(!uniform.is_episodic());
        assert!(!prioritized.is_episodic());
        assert!(episodic.is_episodic());

        for id in 0..4 {
            uniform.push(tr(id, id == 3))?;
            prioritized.push(tr(id, id == 3))?;
            episodic.push(tr(id, id == 3))?;
        }
        assert_eq!(uniform.len(), 4);
        assert_eq!(episodic.len(), 1);

        match uniform.batch(2)? {
            ReplayBatch::Transition(b) => assert!(b.ix_sample.is_none()),
            _ => panic!("expected transitions"),
        }
        match prioritized.batch(2)? {
            ReplayBatch::Transition(b) => assert_eq!(b.ix_sample.map(|ix| ix.len()), Some(2)),
            _ => panic!("expected transitions"),
        }
        match episodic.batch(2)? {
            ReplayBatch::Trace(b) => assert_eq!(b.trace_length(), 2),
            _ => panic!("expected traces"),
        }
        Ok(())
    }

    #[test]
    fn test_update_priority_reaches_prioritized_store() -> Result<()> {
        let config = ReplayStoreConfig::default()
            .capacity(4)
            .prioritized(PerConfig::default().eps(0.0));
        let mut store = ReplayStore::build(&config)?;
        for id in 0..4 {
            store.push(tr(id, false))?;
        }

        store.update_priority(&Some(vec![1]), &[3.0]);
        match &store {
            ReplayStore::Prioritized(b) => assert_eq!(b.priority(1), 3.0),
            _ => panic!("expected a prioritized store"),
        }

        // uniform stores ignore the call
        let mut uniform = ReplayStore::build(&ReplayStoreConfig::default())?;
        uniform.update_priority(&Some(vec![0]), &[1.0]);
        Ok(())
    }

    #[test]
    fn test_zero_capacity_is_a_config_error() {
        for config in [
            ReplayStoreConfig::default().capacity(0),
            ReplayStoreConfig::default().capacity(0).prioritized(PerConfig::default()),
            ReplayStoreConfig::default().capacity(0).episodic(4),
            ReplayStoreConfig::default().episodic(0),
        ]
        .iter()
        {
            let err = ReplayStore::build(config)
                .err()
                .and_then(|e| e.downcast::<DqlError>().ok());
            assert!(matches!(err, Some(DqlError::InvalidConfig(_))));
        }
    }
}
