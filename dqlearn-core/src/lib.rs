#![warn(missing_docs)]
//! Core of a Deep Q-Learning trainer.
//!
//! This crate is independent of any tensor backend. It provides
//! * interfaces of environments, policies, agents and replay stores ([`Env`], [`Policy`],
//!   [`Agent`], [`ReplayBufferBase`]),
//! * the uniform, prioritized and episodic replay stores ([`replay_buffer`]),
//! * linearly annealed epsilon-greedy exploration ([`EpsilonGreedy`]),
//! * the training loop ([`Trainer`]) and evaluation ([`DefaultEvaluator`]).
//!
//! Value functions are implemented by backend crates through [`Agent`].
pub mod error;
pub mod record;
pub mod replay_buffer;
pub mod toy_env;

mod base;
pub use base::{
    Agent, Env, Experience, ExperienceBufferBase, FirstActionPolicy, Info, Obs, OptInfo, Policy,
    ReplayBufferBase, Step,
};

mod explorer;
pub use explorer::EpsilonGreedy;

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Sampler, TrainContext, Trainer, TrainerConfig, RETURN_WINDOW};
