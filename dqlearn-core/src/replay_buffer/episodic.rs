//! Replay store keeping whole episodes for recurrent value functions.
use super::{RingBuffer, TraceBatch, TransitionBatch};
use crate::{error::DqlError, Experience, ExperienceBufferBase};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::mem;

/// Replay store keeping whole episodes.
///
/// Pushed transitions are appended to an open episode, which is sealed when a
/// transition is terminated or truncated. Only sealed episodes are sampled, and
/// [`len`](ExperienceBufferBase::len) counts sealed episodes.
///
/// Each sampled episode yields a contiguous sub-trace of `trace_length` timesteps.
/// Episodes shorter than that are left-padded with entries having zero observations,
/// action `0`, zero reward and done set, and a mask of `0.0`.
pub struct EpisodicReplayBuffer {
    episodes: RingBuffer<Vec<Experience>>,
    open: Vec<Experience>,
    trace_length: usize,
    rng: StdRng,
}

impl EpisodicReplayBuffer {
    /// Creates an empty store holding at most `capacity` episodes.
    pub fn new(capacity: usize, seed: u64, trace_length: usize) -> Self {
        Self {
            episodes: RingBuffer::new(capacity),
            open: Vec::new(),
            trace_length,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Length of sampled sub-traces.
    pub fn trace_length(&self) -> usize {
        self.trace_length
    }

    /// The number of transitions in the episode not sealed yet.
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Returns the sealed episode stored in slot `ix`.
    pub fn episode(&self, ix: usize) -> &[Experience] {
        self.episodes.get(ix)
    }

    /// Samples `size` episodes uniformly with replacement and cuts a sub-trace from each.
    pub fn batch(&mut self, size: usize) -> Result<TraceBatch> {
        if self.episodes.is_empty() {
            return Err(DqlError::EmptyReplayBuffer.into());
        }
        if self.trace_length == 0 {
            return Err(DqlError::InvalidConfig("trace_length must be positive".into()).into());
        }
        let l = self.trace_length;
        let obs_dim = self.episodes.get(0)[0].obs.len();
        let mut steps = (0..l)
            .map(|_| TransitionBatch::with_capacity(obs_dim, size))
            .collect::<Vec<_>>();
        let mut mask = vec![Vec::with_capacity(size); l];

        for _ in 0..size {
            let ep = self.episodes.get(self.rng.gen_range(0..self.episodes.len()));

            if ep.len() >= l {
                let start = self.rng.gen_range(0..=ep.len() - l);
                for t in 0..l {
                    steps[t].push(&ep[start + t]);
                    mask[t].push(1.0);
                }
            } else {
                let n_pad = l - ep.len();
                for t in 0..l {
                    if t < n_pad {
                        steps[t].push_padding();
                        mask[t].push(0.0);
                    } else {
                        steps[t].push(&ep[t - n_pad]);
                        mask[t].push(1.0);
                    }
                }
            }
        }

        Ok(TraceBatch { steps, mask })
    }
}

impl ExperienceBufferBase for EpisodicReplayBuffer {
    type Item = Experience;

    fn push(&mut self, tr: Experience) -> Result<()> {
        let is_done = tr.is_done();
        self.open.push(tr);
        if is_done {
            let episode = mem::take(&mut self.open);
            self.episodes.push(episode);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.episodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pushes an episode of `len` steps whose rewards are `id * 100 + t`.
    fn push_episode(buffer: &mut EpisodicReplayBuffer, id: usize, len: usize) -> Result<()> {
        for t in 0..len {
            let is_last = t + 1 == len;
            let reward = (id * 100 + t) as f32;
            buffer.push(Experience::new(
                vec![reward, 1.0],
                1 + t % 2,
                reward,
                vec![reward + 1.0, 1.0],
                is_last,
                false,
            ))?;
        }
        Ok(())
    }

    #[test]
    fn test_short_episode_is_left_padded() -> Result<()> {
        let mut buffer = EpisodicReplayBuffer::new(4, 0, 5);
        push_episode(&mut buffer, 0, 3)?;

        let batch = buffer.batch(2)?;
        assert_eq!(batch.trace_length(), 5);
        assert_eq!(batch.batch_size(), 2);

        for t in 0..2 {
            assert_eq!(batch.mask[t], vec![0.0, 0.0]);
            assert_eq!(batch.steps[t].act, vec![0, 0]);
            assert_eq!(batch.steps[t].reward, vec![0.0, 0.0]);
            assert_eq!(batch.steps[t].is_done, vec![1.0, 1.0]);
            assert!(batch.steps[t].obs.iter().all(|&o| o == 0.0));
        }
        for t in 2..5 {
            let stored = &buffer.episode(0)[t - 2];
            assert_eq!(batch.mask[t], vec![1.0, 1.0]);
            assert_eq!(batch.steps[t].reward, vec![stored.reward; 2]);
            assert_eq!(batch.steps[t].act, vec![stored.act; 2]);
        }
        Ok(())
    }

    #[test]
    fn test_long_episode_yields_contiguous_trace() -> Result<()> {
        let mut buffer = EpisodicReplayBuffer::new(4, 1, 4);
        push_episode(&mut buffer, 1, 10)?;

        let batch = buffer.batch(8)?;
        for b in 0..8 {
            let rewards = (0..4).map(|t| batch.steps[t].reward[b]).collect::<Vec<_>>();
            for w in rewards.windows(2) {
                assert_eq!(w[1] - w[0], 1.0);
            }
            assert!(batch.mask.iter().all(|m| m[b] == 1.0));
        }
        Ok(())
    }

    #[test]
    fn test_open_episode_is_not_sampled() -> Result<()> {
        let mut buffer = EpisodicReplayBuffer::new(4, 0, 2);
        buffer.push(Experience::new(vec![0.0], 0, 1.0, vec![0.0], false, false))?;

        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.open_len(), 1);
        assert!(buffer.batch(1).is_err());

        // truncation seals the episode as well
        buffer.push(Experience::new(vec![0.0], 0, 1.0, vec![0.0], false, true))?;
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.open_len(), 0);
        Ok(())
    }

    #[test]
    fn test_capacity_counts_episodes() -> Result<()> {
        let mut buffer = EpisodicReplayBuffer::new(2, 0, 2);
        for id in 0..5 {
            push_episode(&mut buffer, id, 2)?;
        }

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.episode(0)[0].reward, 400.0);
        assert_eq!(buffer.episode(1)[0].reward, 300.0);
        Ok(())
    }
}
