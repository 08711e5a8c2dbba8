//! Replay stores.
//!
//! Three disciplines share one sampling contract ([`ExperienceBufferBase`] and
//! [`ReplayBufferBase`]):
//!
//! - [`UniformReplayBuffer`]: transitions sampled uniformly with replacement.
//! - [`PrioritizedReplayBuffer`]: transitions sampled in proportion to `p_i^alpha`,
//!   with importance-sampling weights normalized within the batch.
//! - [`EpisodicReplayBuffer`]: whole episodes, sampled as fixed-length sub-traces
//!   for recurrent value functions.
//!
//! All of them keep their entries in a fixed-capacity [`RingBuffer`], overwriting
//! the oldest entry once full. [`ReplayStore`] is the tagged union selected once from
//! [`ReplayStoreConfig`].
//!
//! ```rust
//! use dqlearn_core::{
//!     replay_buffer::{PerConfig, ReplayStore, ReplayStoreConfig},
//!     Experience, ExperienceBufferBase, ReplayBufferBase,
//! };
//!
//! let config = ReplayStoreConfig::default()
//!     .capacity(1000)
//!     .seed(42)
//!     .prioritized(PerConfig::default().alpha(0.6).beta(0.4));
//! let mut buffer = ReplayStore::build(&config).unwrap();
//! buffer
//!     .push(Experience::new(vec![0.0], 1, 1.0, vec![1.0], false, false))
//!     .unwrap();
//! let batch = buffer.batch(4).unwrap();
//! assert_eq!(batch.len(), 4);
//! ```
//!
//! [`ExperienceBufferBase`]: crate::ExperienceBufferBase
//! [`ReplayBufferBase`]: crate::ReplayBufferBase
mod batch;
mod config;
mod episodic;
mod prioritized;
mod ring;
mod store;
mod uniform;
pub use batch::{ReplayBatch, TraceBatch, TransitionBatch};
pub use config::{PerConfig, ReplayKind, ReplayStoreConfig};
pub use episodic::EpisodicReplayBuffer;
pub use prioritized::PrioritizedReplayBuffer;
pub use ring::RingBuffer;
pub use store::ReplayStore;
pub use uniform::UniformReplayBuffer;
