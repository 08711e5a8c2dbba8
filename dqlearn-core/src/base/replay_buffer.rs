//! Replay buffer interface.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of sampleable entries in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if nothing can be sampled from the buffer.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated by the buffer.
    type Batch;

    /// Build a replay buffer from [Self::Config].
    ///
    /// Fails if the configuration cannot describe a buffer, e.g. zero capacity.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Updates priority.
    ///
    /// Buffers sampling uniformly ignore the call.
    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_err: &[f32]);

    /// Returns `true` if the buffer stores whole episodes for recurrent value functions.
    fn is_episodic(&self) -> bool {
        false
    }
}
