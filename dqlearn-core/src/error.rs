//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum DqlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The agent carries a recurrent network but the configuration does not declare recurrence.
    ///
    /// Running a recurrent network through the transition pipeline silently corrupts
    /// its hidden state, so training refuses to start.
    #[error("the network is recurrent but `recurrent` is not set in the trainer configuration")]
    RecurrenceNotDeclared,

    /// The replay discipline does not match the recurrence flag.
    #[error("replay discipline mismatch: recurrent = {recurrent}, episodic replay store = {episodic}")]
    ReplayDisciplineMismatch {
        /// Value of the recurrence flag in the trainer configuration.
        recurrent: bool,

        /// If the replay store samples whole episodes.
        episodic: bool,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A batch was requested from a replay store holding no sampleable data.
    #[error("cannot sample a batch from an empty replay store")]
    EmptyReplayBuffer,

    /// A batch of an unexpected kind was given to an agent.
    #[error("unexpected batch: {0}")]
    BatchMismatch(String),
}
