//! Replay store sampling transitions by priority.
mod sum_tree;
use super::{PerConfig, RingBuffer, TransitionBatch};
use crate::{error::DqlError, Experience, ExperienceBufferBase};
use anyhow::Result;
use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sum_tree::SumTree;

/// Replay store sampling transitions in proportion to `p_i^alpha`.
///
/// A new transition gets the largest priority seen so far (`1.0` initially), so it is
/// likely to be sampled before its TD error is known. After each optimization step the
/// caller reports TD errors with [`PrioritizedReplayBuffer::update_priority`], which sets
/// `p_i = |td_err_i| + eps`.
pub struct PrioritizedReplayBuffer {
    ring: RingBuffer<Experience>,

    /// Raw priorities, index-aligned with the slots of `ring`.
    priorities: Vec<f32>,

    sum_tree: SumTree,
    max_priority: f32,
    alpha: f32,
    beta: f32,
    eps: f32,
    rng: StdRng,
}

impl PrioritizedReplayBuffer {
    /// Creates an empty store.
    pub fn new(capacity: usize, seed: u64, config: &PerConfig) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            priorities: vec![0f32; capacity],
            sum_tree: SumTree::new(capacity),
            max_priority: 1.0,
            alpha: config.alpha,
            beta: config.beta,
            eps: config.eps.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn set_priority(&mut self, ix: usize, p: f32) {
        self.priorities[ix] = p;
        self.sum_tree.update(ix, (p as f64).powf(self.alpha as f64));
    }

    /// Samples `size` transitions by priority.
    ///
    /// The importance weight of slot `i` is $(n P(i))^{-\beta}$, divided by the largest
    /// weight in the batch so that the maximum is exactly one.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch> {
        if self.ring.is_empty() {
            return Err(DqlError::EmptyReplayBuffer.into());
        }
        let n = self.ring.len();
        let total = self.sum_tree.total();
        let obs_dim = self.ring.get(0).obs.len();

        // all priorities zero, e.g. eps = 0 and zero TD errors
        if !(total > 0.0 && total.is_finite()) {
            warn!("Sum of priorities is {}, sampling uniformly", total);
            let ixs = (0..size).map(|_| self.rng.gen_range(0..n)).collect::<Vec<_>>();
            let mut batch = TransitionBatch::with_capacity(obs_dim, size);
            for &ix in ixs.iter() {
                batch.push(self.ring.get(ix));
            }
            batch.ix_sample = Some(ixs);
            return Ok(batch);
        }

        let ixs = (0..size)
            .map(|_| self.sum_tree.get(total * self.rng.gen::<f64>()).min(n - 1))
            .collect::<Vec<_>>();

        let ws = ixs
            .iter()
            .map(|&ix| (n as f64 * self.sum_tree.leaf(ix) / total).powf(-self.beta as f64))
            .collect::<Vec<_>>();
        let w_max = ws.iter().cloned().fold(f64::MIN, f64::max);

        let mut batch = TransitionBatch::with_capacity(obs_dim, size);
        for &ix in ixs.iter() {
            batch.push(self.ring.get(ix));
        }
        batch.weight = ws.iter().map(|w| (w / w_max) as f32).collect();
        batch.ix_sample = Some(ixs);

        Ok(batch)
    }

    /// Sets the priorities of the given slots to `|td_err| + eps`.
    ///
    /// Non-finite TD errors leave the previous priority in place.
    pub fn update_priority(&mut self, ixs: &[usize], td_err: &[f32]) {
        for (&ix, &e) in ixs.iter().zip(td_err.iter()) {
            let p = e.abs() + self.eps;
            if !p.is_finite() {
                warn!("Skip priority update of slot {} with TD error {}", ix, e);
                continue;
            }
            self.set_priority(ix, p);
            self.max_priority = self.max_priority.max(p);
        }
    }

    /// Returns the priority of slot `ix`.
    pub fn priority(&self, ix: usize) -> f32 {
        self.priorities[ix]
    }

    /// The largest priority seen so far.
    pub fn max_priority(&self) -> f32 {
        self.max_priority
    }

    /// Returns the transition stored in slot `ix`.
    pub fn get(&self, ix: usize) -> &Experience {
        self.ring.get(ix)
    }
}

impl ExperienceBufferBase for PrioritizedReplayBuffer {
    type Item = Experience;

    fn push(&mut self, tr: Experience) -> Result<()> {
        let ix = self.ring.push(tr);
        let p = self.max_priority;
        self.set_priority(ix, p);
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
        Experience::new(vec![id as f32], 0, id as f32, vec![0.0], false, false)
    }

    fn buffer_with_priorities(ps: &[f32], alpha: f32, seed: u64) -> Result<PrioritizedReplayBuffer> {
        let config = PerConfig::default().alpha(alpha).beta(0.4).eps(0.0);
        let mut buffer = PrioritizedReplayBuffer::new(ps.len(), seed, &config);
        for id in 0..ps.len() {
            buffer.push(tr(id))?;
        }
        let ixs = (0..ps.len()).collect::<Vec<_>>();
        buffer.update_priority(&ixs, ps);
        Ok(buffer)
    }

    #[test]
    fn test_new_entries_get_max_priority() -> Result<()> {
        let config = PerConfig::default();
        let mut buffer = PrioritizedReplayBuffer::new(4, 0, &config);
        buffer.push(tr(0))?;
        assert_eq!(buffer.priority(0), 1.0);

        buffer.update_priority(&[0], &[2.5]);
        buffer.push(tr(1))?;
        assert_eq!(buffer.priority(1), buffer.max_priority());
        assert!((buffer.max_priority() - (2.5 + config.eps)).abs() < 1e-6);

        // lowering a priority does not lower the running maximum
        buffer.update_priority(&[0], &[0.1]);
        buffer.push(tr(2))?;
        assert!((buffer.priority(2) - (2.5 + config.eps)).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_priority_update_is_exact() -> Result<()> {
        let config = PerConfig::default().eps(0.01);
        let mut buffer = PrioritizedReplayBuffer::new(4, 0, &config);
        for id in 0..4 {
            buffer.push(tr(id))?;
        }

        buffer.update_priority(&[2], &[-0.5]);
        assert_eq!(buffer.priority(2), 0.5f32 + 0.01f32);

        buffer.update_priority(&[1], &[f32::NAN]);
        assert_eq!(buffer.priority(1), 1.0);
        Ok(())
    }

    #[test]
    fn test_capacity_and_fifo_overwrite() -> Result<()> {
        let mut buffer = PrioritizedReplayBuffer::new(3, 0, &PerConfig::default());
        for id in 0..7 {
            buffer.push(tr(id))?;
        }

        assert_eq!(buffer.len(), 3);
        let ids = (0..3).map(|ix| buffer.get(ix).reward as usize).collect::<Vec<_>>();
        assert_eq!(ids, vec![6, 4, 5]);
        Ok(())
    }

    #[test]
    fn test_sampling_follows_priorities() -> Result<()> {
        let mut buffer = buffer_with_priorities(&[1.0, 2.0, 3.0], 1.0, 42)?;
        let n_draws = 12000;
        let mut counts = [0usize; 3];
        for _ in 0..(n_draws / 100) {
            let batch = buffer.batch(100)?;
            for &ix in batch.ix_sample.as_ref().unwrap().iter() {
                counts[ix] += 1;
            }
        }

        // chi-square test, 2 degrees of freedom, critical value at p = 0.001
        let probs = [1.0 / 6.0, 2.0 / 6.0, 3.0 / 6.0];
        let chi2 = counts
            .iter()
            .zip(probs.iter())
            .map(|(&c, &p)| {
                let expected = p * n_draws as f64;
                (c as f64 - expected).powi(2) / expected
            })
            .sum::<f64>();
        assert!(chi2 < 13.82, "counts = {:?}, chi2 = {}", counts, chi2);
        Ok(())
    }

    #[test]
    fn test_importance_weights_are_normalized() -> Result<()> {
        let mut buffer = buffer_with_priorities(&[0.5, 1.0, 4.0, 0.1, 2.0], 0.6, 3)?;

        for _ in 0..20 {
            let batch = buffer.batch(8)?;
            assert!(batch.weight.iter().all(|&w| w > 0.0 && w <= 1.0));
            let w_max = batch.weight.iter().cloned().fold(f32::MIN, f32::max);
            assert_eq!(w_max, 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_zero_priorities_fall_back_to_uniform() -> Result<()> {
        let mut buffer = buffer_with_priorities(&[0.0, 0.0, 0.0], 0.6, 11)?;
        assert_eq!(buffer.priority(1), 0.0);

        let batch = buffer.batch(64)?;
        assert_eq!(batch.weight, vec![1.0; 64]);
        let ixs = batch.ix_sample.as_ref().unwrap();
        assert!(ixs.iter().all(|&ix| ix < 3));
        assert!((0..3).all(|ix| ixs.contains(&ix)));

        // a positive priority brings back prioritized sampling
        buffer.update_priority(&[2], &[1.0]);
        let batch = buffer.batch(16)?;
        assert_eq!(batch.ix_sample, Some(vec![2; 16]));
        assert!(batch.weight.iter().all(|w| w.is_finite()));
        Ok(())
    }

    #[test]
    fn test_rare_transitions_get_larger_weights() -> Result<()> {
        let mut buffer = buffer_with_priorities(&[1.0, 9.0], 1.0, 5)?;
        let batch = buffer.batch(64)?;
        let ixs = batch.ix_sample.as_ref().unwrap();
        for (&ix, &w) in ixs.iter().zip(batch.weight.iter()) {
            if ix == 1 && ixs.contains(&0) {
                assert!(w < 1.0);
            }
        }
        Ok(())
    }
}
