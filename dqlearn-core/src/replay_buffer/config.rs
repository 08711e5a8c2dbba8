//! Configuration of the replay stores.
use crate::error::DqlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration for prioritized experience replay.
///
/// ```rust
/// use dqlearn_core::replay_buffer::PerConfig;
///
/// let config = PerConfig::default().alpha(0.6).beta(0.4).eps(1e-6);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Exponent for prioritization. A value of 0 results in uniform sampling.
    pub alpha: f32,

    /// Exponent of importance sampling weights.
    pub beta: f32,

    /// Added to absolute TD errors so that no transition gets zero priority.
    pub eps: f32,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.4,
            eps: 1e-6,
        }
    }
}

impl PerConfig {
    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the importance sampling exponent `beta`.
    pub fn beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// Sets the priority floor `eps`.
    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }
}

/// Sampling discipline of a replay store.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ReplayKind {
    /// Transitions sampled uniformly.
    Uniform,

    /// Transitions sampled by priority.
    Prioritized(PerConfig),

    /// Whole episodes, sampled as sub-traces of `trace_length` timesteps.
    Episodic {
        /// Length of sampled sub-traces.
        trace_length: usize,
    },
}

/// Configuration of [`ReplayStore`](super::ReplayStore).
///
/// `capacity` counts transitions for the uniform and prioritized disciplines and
/// whole episodes for the episodic one.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayStoreConfig {
    /// Maximum number of entries.
    pub capacity: usize,

    /// Random seed used for sampling.
    pub seed: u64,

    /// Sampling discipline.
    pub kind: ReplayKind,
}

impl Default for ReplayStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
            kind: ReplayKind::Uniform,
        }
    }
}

impl ReplayStoreConfig {
    /// Sets the capacity of the replay store.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the sampling discipline.
    pub fn kind(mut self, kind: ReplayKind) -> Self {
        self.kind = kind;
        self
    }

    /// Uses prioritized sampling.
    pub fn prioritized(self, per_config: PerConfig) -> Self {
        self.kind(ReplayKind::Prioritized(per_config))
    }

    /// Uses episodic storage with sub-traces of the given length.
    pub fn episodic(self, trace_length: usize) -> Self {
        self.kind(ReplayKind::Episodic { trace_length })
    }

    /// Checks that a store can be built from the configuration.
    pub fn validate(&self) -> Result<(), DqlError> {
        if self.capacity == 0 {
            return Err(DqlError::InvalidConfig(
                "capacity of the replay store must be positive".into(),
            ));
        }
        if let ReplayKind::Episodic { trace_length: 0 } = self.kind {
            return Err(DqlError::InvalidConfig("trace_length must be positive".into()));
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_store_config() -> Result<()> {
        let config = ReplayStoreConfig::default()
            .capacity(500)
            .seed(7)
            .prioritized(PerConfig::default().alpha(0.7));

        let dir = TempDir::new("replay_store_config")?;
        let path = dir.path().join("replay_store_config.yaml");

        config.save(&path)?;
        let config_ = ReplayStoreConfig::load(&path)?;
        assert_eq!(config, config_);

        Ok(())
    }

    #[test]
    fn test_validate_rejects_empty_stores() {
        assert!(ReplayStoreConfig::default().validate().is_ok());
        assert!(matches!(
            ReplayStoreConfig::default().capacity(0).validate(),
            Err(DqlError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReplayStoreConfig::default().episodic(0).validate(),
            Err(DqlError::InvalidConfig(_))
        ));
    }
}
