//! Workload drivers sharing a single balancer

use partialkey_core::{Balancer, Distribution};
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::fixtures::random_keys;

/// Outcome of a multi-threaded run
#[derive(Debug, Clone)]
pub struct ThreadedRun {
    /// Items routed to each slot, summed over all threads
    pub distribution: Distribution,
    /// Results that fell outside `[0, slots)`
    pub out_of_range: u64,
    /// Releases the balancer refused
    pub failed_releases: u64,
}

/// Spawn `threads` OS threads, each dispatching `per_thread` random keys.
///
/// With `release` set, every choose is immediately followed by its release.
pub fn run_threads(
    balancer: &Balancer,
    threads: usize,
    per_thread: usize,
    release: bool,
) -> ThreadedRun {
    let slots = balancer.slot_count();

    let tallies: Vec<(Distribution, u64, u64)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(move || {
                    let mut dist = Distribution::new(slots);
                    let mut out_of_range = 0;
                    let mut failed_releases = 0;

                    for key in random_keys(per_thread) {
                        let slot = balancer.choose(&key);
                        if dist.record(slot).is_err() {
                            out_of_range += 1;
                            continue;
                        }
                        if release && balancer.release(slot).is_err() {
                            failed_releases += 1;
                        }
                    }
                    (dist, out_of_range, failed_releases)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("worker thread panicked"))
            .collect()
    });

    let mut run = ThreadedRun {
        distribution: Distribution::new(slots),
        out_of_range: 0,
        failed_releases: 0,
    };
    for (dist, out_of_range, failed_releases) in &tallies {
        run.distribution
            .merge(dist)
            .expect("every thread tallies the same slots");
        run.out_of_range += out_of_range;
        run.failed_releases += failed_releases;
    }
    run
}

/// Dispatch `keys` as async tasks that each hold their slot for a random time
/// up to `max_hold`.
///
/// With `release` set, a task releases its slot when it finishes; otherwise
/// the load stays counted.
pub async fn run_tasks(
    balancer: Arc<Balancer>,
    keys: Vec<Vec<u8>>,
    max_hold: Duration,
    release: bool,
) -> Distribution {
    let mut dist = Distribution::new(balancer.slot_count());
    let mut tasks = JoinSet::new();
    let max_hold_ms = max_hold.as_millis() as u64;

    for key in keys {
        let guard = balancer.acquire_owned(&key);
        dist.record(guard.slot()).expect("balancer returned an out-of-range slot");

        let hold = Duration::from_millis(rand::rng().random_range(0..=max_hold_ms));
        tasks.spawn(async move {
            tokio::time::sleep(hold).await;
            if release {
                drop(guard);
            } else {
                guard.forget();
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.expect("task panicked");
    }
    dist
}
