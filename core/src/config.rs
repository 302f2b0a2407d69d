//! Balancer configuration
//!
//! Values can come from serde (JSON files, embedded configs) or from the
//! environment via [`BalancerConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::hash::{FIRST_SEED, SECOND_SEED};

const SLOTS_ENV: &str = "PKG_SLOTS";
const FIRST_SEED_ENV: &str = "PKG_FIRST_SEED";
const SECOND_SEED_ENV: &str = "PKG_SECOND_SEED";
const RELEASE_POLICY_ENV: &str = "PKG_RELEASE_POLICY";

/// What `release` does when the slot's load is already zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Leave the load at zero and return [`Error::Underflow`] (default)
    #[default]
    Strict,
    /// Leave the load at zero without reporting
    Saturating,
    /// Unsigned wraparound to `u64::MAX`
    Wrapping,
}

impl ReleasePolicy {
    /// Name used in config files, env vars and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleasePolicy::Strict => "strict",
            ReleasePolicy::Saturating => "saturating",
            ReleasePolicy::Wrapping => "wrapping",
        }
    }
}

impl FromStr for ReleasePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ReleasePolicy::Strict),
            "saturating" => Ok(ReleasePolicy::Saturating),
            "wrapping" => Ok(ReleasePolicy::Wrapping),
            other => Err(Error::InvalidConfig(format!(
                "unknown release policy: {}",
                other
            ))),
        }
    }
}

/// Balancer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancerConfig {
    /// Number of downstream slots (default: 10)
    #[serde(default = "default_slots")]
    pub slots: usize,
    /// Seed for the preferred candidate (default: 13)
    #[serde(default = "default_first_seed")]
    pub first_seed: u64,
    /// Seed for the alternate candidate (default: 7)
    #[serde(default = "default_second_seed")]
    pub second_seed: u64,
    /// Behaviour of a release on an empty slot
    #[serde(default)]
    pub release_policy: ReleasePolicy,
}

fn default_slots() -> usize {
    10
}

fn default_first_seed() -> u64 {
    FIRST_SEED
}

fn default_second_seed() -> u64 {
    SECOND_SEED
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            first_seed: default_first_seed(),
            second_seed: default_second_seed(),
            release_policy: ReleasePolicy::default(),
        }
    }
}

impl BalancerConfig {
    /// Default config with the given slot count
    pub fn with_slots(slots: usize) -> Self {
        Self {
            slots,
            ..Self::default()
        }
    }

    /// Set the release policy
    pub fn release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    /// Set the `(first, second)` candidate seeds; they must differ
    pub fn seeds(mut self, first: u64, second: u64) -> Self {
        self.first_seed = first;
        self.second_seed = second;
        self
    }

    /// Check the config can build a balancer
    pub fn validate(&self) -> Result<()> {
        if self.slots == 0 {
            return Err(Error::InvalidSlotCount(self.slots));
        }
        if self.first_seed == self.second_seed {
            return Err(Error::InvalidConfig(format!(
                "first_seed and second_seed must differ (both {})",
                self.first_seed
            )));
        }
        Ok(())
    }

    /// Load from `PKG_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(SLOTS_ENV) {
            config.slots = parse_var(SLOTS_ENV, &v)?;
        }
        if let Some(v) = lookup(FIRST_SEED_ENV) {
            config.first_seed = parse_var(FIRST_SEED_ENV, &v)?;
        }
        if let Some(v) = lookup(SECOND_SEED_ENV) {
            config.second_seed = parse_var(SECOND_SEED_ENV, &v)?;
        }
        if let Some(v) = lookup(RELEASE_POLICY_ENV) {
            config.release_policy = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse an environment value, naming the variable on failure
pub fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{}={:?} is not valid", name, value)))
}
