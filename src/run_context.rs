#![warn(missing_docs)]
//! Run configuration and run-scoped context.
//!
//! A [`RunConfig`] holds the user supplied parameters of a run and can be (de)serialized from / to YAML. A
//! [`RunContext`] is created from a config once per run and handed to all components which need run-scoped
//! values (seed, step cap, run id). There is no global state.
use crate::error::{LxeError, LxeResult};
use chrono::{DateTime, Local};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offset mixed into the seed of the emission random stream. Keeps it apart from all photon streams.
const SOURCE_STREAM: u64 = 0x5EED_50CE;

/// Configuration data of a simulation run.
///
/// The config contains the following info
///   - seed of all random streams of the run
///   - maximum number of step events per photon
///   - number of photons to be emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    seed: u64,
    max_steps: usize,
    nr_of_photons: usize,
}
impl Default for RunConfig {
    /// Create a default config with the following parameters:
    ///   - seed: `0`
    ///   - maximum number of steps / photon: `1000`
    ///   - number of photons: `1000`
    fn default() -> Self {
        Self {
            seed: 0,
            max_steps: 1000,
            nr_of_photons: 1000,
        }
    }
}
impl RunConfig {
    /// Read a [`RunConfig`] from a YAML string. Missing entries are replaced by their defaults.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if the string cannot be parsed or contains
    /// invalid values.
    pub fn from_yaml(yaml: &str) -> LxeResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
    /// Serialize this [`RunConfig`] to a YAML string.
    ///
    /// # Errors
    ///
    /// This function will return an error if the serialization fails.
    pub fn to_yaml(&self) -> LxeResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
    fn validate(&self) -> LxeResult<()> {
        if self.max_steps == 0 {
            return Err(LxeError::Configuration(
                "maximum number of steps must be >= 1".into(),
            ));
        }
        Ok(())
    }
    /// Returns the seed of this [`RunConfig`].
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
    /// Sets the seed of this [`RunConfig`].
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
    /// Returns the maximum number of step events per photon.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.max_steps
    }
    /// Sets the maximum number of step events per photon.
    ///
    /// # Errors
    ///
    /// This function will return an error if `max_steps` is zero.
    pub fn set_max_steps(&mut self, max_steps: usize) -> LxeResult<()> {
        if max_steps == 0 {
            return Err(LxeError::Configuration(
                "maximum number of steps must be >= 1".into(),
            ));
        }
        self.max_steps = max_steps;
        Ok(())
    }
    /// Returns the number of photons to be emitted.
    #[must_use]
    pub const fn nr_of_photons(&self) -> usize {
        self.nr_of_photons
    }
    /// Sets the number of photons to be emitted.
    pub fn set_nr_of_photons(&mut self, nr_of_photons: usize) {
        self.nr_of_photons = nr_of_photons;
    }
}

/// Run-scoped values shared by all components of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    started: DateTime<Local>,
    config: RunConfig,
}
impl RunContext {
    /// Creates a new [`RunContext`] with a fresh run id.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let context = Self {
            run_id: Uuid::new_v4(),
            started: Local::now(),
            config,
        };
        info!(
            "starting run {} (seed: {}, max. steps: {})",
            context.run_id,
            context.seed(),
            context.max_steps()
        );
        context
    }
    /// Returns the id of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }
    /// Returns the start time of this run.
    #[must_use]
    pub const fn started(&self) -> DateTime<Local> {
        self.started
    }
    /// Returns the config of this run.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }
    /// Returns the seed of this run.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.config.seed
    }
    /// Returns the maximum number of step events per photon.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.config.max_steps
    }
    /// Returns the random stream of the photon with the given id.
    ///
    /// The stream only depends on the run seed and the photon id, not on the order in which photons are
    /// processed.
    #[must_use]
    pub fn photon_rng(&self, photon_id: usize) -> StdRng {
        StdRng::seed_from_u64(mix_seed(self.seed(), photon_id as u64))
    }
    /// Returns the random stream used for photon emission.
    #[must_use]
    pub fn source_rng(&self) -> StdRng {
        StdRng::seed_from_u64(mix_seed(self.seed(), SOURCE_STREAM).rotate_left(17))
    }
}
/// Combine a seed and a stream index into a new seed (splitmix64 finalizer).
const fn mix_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
