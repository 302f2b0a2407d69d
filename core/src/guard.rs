//! RAII guards for in-flight load
//!
//! A guard holds one unit of load on a slot and releases it when dropped, so
//! each `choose` is matched by exactly one `release`.

use std::sync::Arc;
use tracing::{error, warn};

use crate::balancer::Balancer;

/// One unit of in-flight load on a slot, borrowed from a [`Balancer`]
#[must_use = "dropping the guard releases the slot immediately"]
#[derive(Debug)]
pub struct SlotGuard<'a> {
    balancer: &'a Balancer,
    slot: usize,
    armed: bool,
}

impl<'a> SlotGuard<'a> {
    pub(crate) fn new(balancer: &'a Balancer, slot: usize) -> Self {
        Self {
            balancer,
            slot,
            armed: true,
        }
    }

    /// The slot this item was routed to
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Keep the load on the slot instead of releasing it
    pub fn forget(mut self) -> usize {
        self.armed = false;
        self.slot
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            release_held(self.balancer, self.slot);
        }
    }
}

/// Like [`SlotGuard`], but owns an `Arc` to the balancer so it can outlive the
/// caller's borrow
#[must_use = "dropping the guard releases the slot immediately"]
#[derive(Debug)]
pub struct OwnedSlotGuard {
    balancer: Arc<Balancer>,
    slot: usize,
    armed: bool,
}

impl OwnedSlotGuard {
    pub(crate) fn new(balancer: Arc<Balancer>, slot: usize) -> Self {
        Self {
            balancer,
            slot,
            armed: true,
        }
    }

    /// The slot this item was routed to
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Keep the load on the slot instead of releasing it
    pub fn forget(mut self) -> usize {
        self.armed = false;
        self.slot
    }
}

impl Drop for OwnedSlotGuard {
    fn drop(&mut self) {
        if self.armed {
            release_held(&self.balancer, self.slot);
        }
    }
}

fn release_held(balancer: &Balancer, slot: usize) {
    // The guard's own increment is still counted, so this only fails if a
    // caller released the same slot by hand as well.
    match balancer.release(slot) {
        Ok(()) => {}
        Err(e) if e.is_precondition() => {
            warn!(slot, code = e.code(), "Guarded slot was already released");
        }
        Err(e) => {
            error!(slot, error = %e, "Failed to release guarded slot");
        }
    }
}
