//! Load and distribution statistics
//!
//! - `LoadSnapshot`: point-in-time copy of a balancer's counters
//! - `Distribution`: per-slot assignment tally kept by a dispatcher or harness
//! - `Candidates`: the two slots a key may be routed to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// The two candidate slots for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidates {
    /// Preferred slot, chosen on ties
    pub first: usize,
    /// Alternate slot, chosen only when strictly less loaded
    pub second: usize,
}

impl Candidates {
    /// Whether both seeds mapped the key to the same slot
    pub fn is_degenerate(&self) -> bool {
        self.first == self.second
    }

    /// Whether `slot` is one of the two candidates
    pub fn contains(&self, slot: usize) -> bool {
        self.first == slot || self.second == slot
    }
}

/// Point-in-time view of all slot loads.
///
/// Counters are read one at a time, so under concurrent use the snapshot is
/// not linearizable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSnapshot {
    /// Load per slot
    pub loads: Vec<u64>,
    /// Sum of all loads (wrapping)
    pub total: u64,
    /// Highest slot load
    pub max: u64,
    /// Lowest slot load
    pub min: u64,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl LoadSnapshot {
    /// Build a snapshot from per-slot loads, computing the totals
    pub fn new(loads: Vec<u64>) -> Self {
        let total = loads.iter().fold(0u64, |acc, l| acc.wrapping_add(*l));
        let max = loads.iter().copied().max().unwrap_or(0);
        let min = loads.iter().copied().min().unwrap_or(0);
        Self {
            loads,
            total,
            max,
            min,
            taken_at: Utc::now(),
        }
    }

    /// Mean load per slot
    pub fn mean(&self) -> f64 {
        if self.loads.is_empty() {
            return 0.0;
        }
        self.total as f64 / self.loads.len() as f64
    }

    /// Ratio of the heaviest slot to the mean; 1.0 when perfectly even or idle
    pub fn imbalance(&self) -> f64 {
        let mean = self.mean();
        if mean == 0.0 {
            return 1.0;
        }
        self.max as f64 / mean
    }

    /// Encode as a JSON object
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Tally of how many items were routed to each slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Items per slot
    pub counts: Vec<u64>,
}

impl Distribution {
    /// Empty tally over `slots` slots
    pub fn new(slots: usize) -> Self {
        Self {
            counts: vec![0; slots],
        }
    }

    /// Number of slots this tally covers
    pub fn slot_count(&self) -> usize {
        self.counts.len()
    }

    /// Count one item routed to `slot`
    pub fn record(&mut self, slot: usize) -> Result<()> {
        let slots = self.counts.len();
        let count = self
            .counts
            .get_mut(slot)
            .ok_or(Error::SlotOutOfRange { slot, slots })?;
        *count += 1;
        Ok(())
    }

    /// Fold another tally over the same slots into this one (e.g. per-thread tallies)
    pub fn merge(&mut self, other: &Distribution) -> Result<()> {
        if other.counts.len() != self.counts.len() {
            return Err(Error::SlotCountMismatch {
                expected: self.counts.len(),
                actual: other.counts.len(),
            });
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        Ok(())
    }

    /// Number of items recorded across all slots
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Share of items per slot, in percent
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|c| *c as f64 / total as f64 * 100.0)
            .collect()
    }

    /// Largest per-slot share, in percent
    pub fn max_share(&self) -> f64 {
        self.percentages().into_iter().fold(0.0, f64::max)
    }

    /// Smallest per-slot share, in percent
    pub fn min_share(&self) -> f64 {
        self.percentages().into_iter().reduce(f64::min).unwrap_or(0.0)
    }
}
