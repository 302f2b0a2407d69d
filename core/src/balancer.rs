//! Partial key grouping balancer
//!
//! Every key hashes to two candidate slots. The key is routed to whichever
//! candidate currently carries less load, with ties going to the first
//! candidate so that a key keeps landing on the same slot while loads are even.
//!
//! Loads are plain atomic counters. `choose` reads both candidates and then
//! increments the winner without holding anything across the two steps, so
//! concurrent callers can both pick the same slot off a stale read. That
//! overshoot is bounded and accepted.
//!
//! Callers that `release` a slot once its work item completes get balancing on
//! in-flight load; callers that never release get balancing on cumulative
//! assignments.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::{BalancerConfig, ReleasePolicy};
use crate::errors::{Error, Result};
use crate::guard::{OwnedSlotGuard, SlotGuard};
use crate::hash;
use crate::stats::{Candidates, LoadSnapshot};

/// Routes keys to the less loaded of two hashed slots
#[derive(Debug)]
pub struct Balancer {
    slots: Box<[AtomicU64]>,
    first_seed: u64,
    second_seed: u64,
    release_policy: ReleasePolicy,
}

impl Balancer {
    /// Create a balancer with `slots` idle slots and default seeds and policy
    pub fn new(slots: usize) -> Result<Self> {
        Self::with_config(&BalancerConfig::with_slots(slots))
    }

    /// Create a balancer from a validated config
    pub fn with_config(config: &BalancerConfig) -> Result<Self> {
        config.validate()?;

        debug!(
            slots = config.slots,
            first_seed = config.first_seed,
            second_seed = config.second_seed,
            release_policy = config.release_policy.as_str(),
            "Creating balancer"
        );

        Ok(Self {
            slots: (0..config.slots).map(|_| AtomicU64::new(0)).collect(),
            first_seed: config.first_seed,
            second_seed: config.second_seed,
            release_policy: config.release_policy,
        })
    }

    /// Number of slots, fixed for the life of the balancer
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The `(first, second)` seeds used for candidate derivation
    pub fn seeds(&self) -> (u64, u64) {
        (self.first_seed, self.second_seed)
    }

    /// How `release` treats a slot whose load is already zero
    pub fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }

    /// The two candidate slots for `key`. Depends only on the key, the seeds
    /// and the slot count, never on load.
    pub fn candidates(&self, key: impl AsRef<[u8]>) -> Candidates {
        let key = key.as_ref();
        let slots = self.slots.len();
        Candidates {
            first: hash::candidate(key, self.first_seed, slots),
            second: hash::candidate(key, self.second_seed, slots),
        }
    }

    /// Pick the less loaded candidate for `key` and count one unit of load on it.
    ///
    /// Always returns an index in `[0, slot_count())`. Safe to call concurrently.
    pub fn choose(&self, key: impl AsRef<[u8]>) -> usize {
        let Candidates { first, second } = self.candidates(key);

        let first_load = self.slots[first].load(Ordering::Relaxed);
        let second_load = self.slots[second].load(Ordering::Relaxed);
        let slot = if first_load > second_load { second } else { first };

        self.slots[slot].fetch_add(1, Ordering::Relaxed);

        trace!(slot, first, second, first_load, second_load, "Chose slot");
        slot
    }

    /// Remove one unit of load from `slot`.
    ///
    /// Intended to be called once per `choose` result whose work completed.
    /// An out-of-range slot is an error. Releasing a slot with zero load is
    /// handled according to the configured [`ReleasePolicy`].
    pub fn release(&self, slot: usize) -> Result<()> {
        let counter = self.counter(slot)?;

        match self.release_policy {
            ReleasePolicy::Wrapping => {
                counter.fetch_sub(1, Ordering::Relaxed);
            }
            ReleasePolicy::Saturating => {
                if counter
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |load| load.checked_sub(1))
                    .is_err()
                {
                    debug!(slot, "Release on idle slot ignored");
                }
            }
            ReleasePolicy::Strict => {
                counter
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |load| load.checked_sub(1))
                    .map_err(|_| {
                        warn!(slot, "Release on idle slot rejected");
                        Error::Underflow { slot }
                    })?;
            }
        }

        trace!(slot, "Released slot");
        Ok(())
    }

    /// Choose a slot for `key` and release it when the returned guard drops
    pub fn acquire(&self, key: impl AsRef<[u8]>) -> SlotGuard<'_> {
        let slot = self.choose(key);
        SlotGuard::new(self, slot)
    }

    /// Like [`Balancer::acquire`], but the guard owns a handle to the balancer
    /// and can be moved into spawned tasks.
    pub fn acquire_owned(self: &Arc<Self>, key: impl AsRef<[u8]>) -> OwnedSlotGuard {
        let slot = self.choose(key);
        OwnedSlotGuard::new(Arc::clone(self), slot)
    }

    /// Current load of `slot`
    pub fn load(&self, slot: usize) -> Result<u64> {
        Ok(self.counter(slot)?.load(Ordering::Relaxed))
    }

    /// Sum of all slot loads (wrapping)
    pub fn total_load(&self) -> u64 {
        self.slots
            .iter()
            .fold(0u64, |acc, c| acc.wrapping_add(c.load(Ordering::Relaxed)))
    }

    /// Copy of every slot's load
    pub fn snapshot(&self) -> LoadSnapshot {
        LoadSnapshot::new(
            self.slots
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
        )
    }

    fn counter(&self, slot: usize) -> Result<&AtomicU64> {
        self.slots.get(slot).ok_or(Error::SlotOutOfRange {
            slot,
            slots: self.slots.len(),
        })
    }
}
