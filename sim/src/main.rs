//! partialkey Simulator
//!
//! Routes a batch of random keys through a balancer and prints the resulting
//! slot distribution as JSON on stdout.
//!
//! Modes (`PKG_MODE`):
//! - `cumulative`: choose only, load counts every assignment
//! - `release`: release right after each choose
//! - `exec-time`: each item is held for a random time, never released
//! - `release-exec-time`: each item is held for a random time, then released

use partialkey_core::config::parse_var;
use partialkey_core::{Balancer, BalancerConfig, Distribution, Error, LoadSnapshot};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const KEYS_ENV: &str = "PKG_KEYS";
const KEY_LEN_ENV: &str = "PKG_KEY_LEN";
const MODE_ENV: &str = "PKG_MODE";
const MAX_HOLD_MS_ENV: &str = "PKG_MAX_HOLD_MS";
const RNG_SEED_ENV: &str = "PKG_RNG_SEED";

/// How dispatched items feed back into slot load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Mode {
    Cumulative,
    Release,
    ExecTime,
    ReleaseExecTime,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "cumulative" => Ok(Mode::Cumulative),
            "release" => Ok(Mode::Release),
            "exec-time" => Ok(Mode::ExecTime),
            "release-exec-time" => Ok(Mode::ReleaseExecTime),
            other => Err(Error::InvalidConfig(format!("unknown mode: {}", other))),
        }
    }
}

/// Simulation parameters
#[derive(Debug, Clone, Serialize)]
struct SimConfig {
    /// Number of keys to dispatch (default: 1000)
    keys: usize,
    /// Length of each random key in bytes (default: 8)
    key_len: usize,
    mode: Mode,
    /// Upper bound on how long an item is held in the exec-time modes
    max_hold_ms: u64,
    /// Fixed RNG seed for reproducible runs
    rng_seed: Option<u64>,
    balancer: BalancerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            keys: 1000,
            key_len: 8,
            mode: Mode::Cumulative,
            max_hold_ms: 2000,
            rng_seed: None,
            balancer: BalancerConfig::default(),
        }
    }
}

impl SimConfig {
    fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            balancer: BalancerConfig::from_lookup(&lookup)?,
            ..Self::default()
        };

        if let Some(v) = lookup(KEYS_ENV) {
            config.keys = parse_var(KEYS_ENV, &v)?;
        }
        if let Some(v) = lookup(KEY_LEN_ENV) {
            config.key_len = parse_var(KEY_LEN_ENV, &v)?;
        }
        if let Some(v) = lookup(MODE_ENV) {
            config.mode = v.parse()?;
        }
        if let Some(v) = lookup(MAX_HOLD_MS_ENV) {
            config.max_hold_ms = parse_var(MAX_HOLD_MS_ENV, &v)?;
        }
        if let Some(v) = lookup(RNG_SEED_ENV) {
            config.rng_seed = Some(parse_var(RNG_SEED_ENV, &v)?);
        }

        Ok(config)
    }
}

/// Result of a simulation run
#[derive(Debug, Clone, Serialize)]
struct SimReport {
    config: SimConfig,
    /// How many keys went to each slot
    distribution: Distribution,
    /// Same, in percent
    percentages: Vec<f64>,
    /// Slot loads after every item completed
    final_load: LoadSnapshot,
}

impl SimReport {
    /// Pretty-printed JSON for stdout
    fn to_json(&self) -> partialkey_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn random_keys(rng: &mut StdRng, count: usize, len: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| (0..len).map(|_| rng.sample(Alphanumeric)).collect())
        .collect()
}

async fn run_simulation(config: SimConfig) -> Result<SimReport, BoxError> {
    let balancer = Arc::new(Balancer::with_config(&config.balancer)?);
    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let keys = random_keys(&mut rng, config.keys, config.key_len);

    info!(
        mode = ?config.mode,
        keys = config.keys,
        slots = balancer.slot_count(),
        "Starting simulation"
    );

    let mut distribution = Distribution::new(balancer.slot_count());
    let mut tasks = JoinSet::new();

    for key in &keys {
        match config.mode {
            Mode::Cumulative => {
                distribution.record(balancer.choose(key))?;
            }
            Mode::Release => {
                let slot = balancer.choose(key);
                distribution.record(slot)?;
                balancer.release(slot)?;
            }
            Mode::ExecTime => {
                distribution.record(balancer.choose(key))?;
                let hold = Duration::from_millis(rng.random_range(0..=config.max_hold_ms));
                tasks.spawn(tokio::time::sleep(hold));
            }
            Mode::ReleaseExecTime => {
                let guard = balancer.acquire_owned(key);
                distribution.record(guard.slot())?;
                let hold = Duration::from_millis(rng.random_range(0..=config.max_hold_ms));
                tasks.spawn(async move {
                    tokio::time::sleep(hold).await;
                    drop(guard);
                });
            }
        }
    }

    while let Some(result) = tasks.join_next().await {
        result?;
    }

    let report = SimReport {
        percentages: distribution.percentages(),
        final_load: balancer.snapshot(),
        distribution,
        config,
    };

    info!(
        max_share = report.distribution.max_share(),
        min_share = report.distribution.min_share(),
        final_total = report.final_load.total,
        "Simulation complete"
    );

    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = SimConfig::from_env().map_err(|e| {
        error!(error = %e, code = e.code(), "Invalid configuration");
        e
    })?;

    let report = run_simulation(config).await?;
    println!("{}", report.to_json()?);

    Ok(())
}
