//! In-process price generator.
//!
//! Ties the state store, scheduler, tick generator and snapshot assembler
//! together. One generator serves one subscriber (or the background
//! publisher); nothing here is shared between runs.

use std::time::Duration;

use feed_net::PriceEvent;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::trace;

use crate::scheduler::Scheduler;
use crate::snapshot::{self, SnapshotPolicy};
use crate::state::{EntityState, EntityStore};
use crate::tick;

/// Result of checking the schedule once.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// At least one key was due; this is the cycle's batch.
    Batch(Vec<PriceEvent>),
    /// Nothing was due; check again after this long.
    Wait(Duration),
}

/// Generates price batches on per-symbol jittered schedules.
#[derive(Debug)]
pub struct PriceGenerator {
    rng: StdRng,
    store: EntityStore,
    scheduler: Scheduler,
    policy: SnapshotPolicy,
}

impl PriceGenerator {
    /// Start a run for `symbols`. All randomness of the run (initial prices,
    /// pace factors, jitter and ticks) is drawn from `seed`.
    #[must_use]
    pub fn new(
        symbols: &[String],
        base_interval: Duration,
        wait_ceiling: Duration,
        seed: u64,
        policy: SnapshotPolicy,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let store = EntityStore::initialize(symbols, &mut rng);
        let scheduler = Scheduler::new(
            store.keys(),
            base_interval,
            wait_ceiling,
            Instant::now(),
            &mut rng,
        );
        Self {
            rng,
            store,
            scheduler,
            policy,
        }
    }

    /// Check the schedule at `now`.
    ///
    /// Due keys are ticked, the batch is assembled and the due keys are
    /// rescheduled relative to `now` before the batch is handed back.
    pub fn step(&mut self, now: Instant) -> Step {
        let due = self.scheduler.due(now);
        if due.is_empty() {
            return Step::Wait(self.scheduler.wait_hint(now));
        }

        for key in &due {
            let Some(prev) = self.store.get(key) else {
                continue;
            };
            let next = tick::tick(prev.value, &mut self.rng);
            self.store.set(
                key,
                EntityState {
                    value: next.value,
                    change_percent: next.change_percent,
                },
            );
        }

        let batch = snapshot::assemble(
            self.policy,
            self.store.keys(),
            &due,
            &self.store,
            snapshot::utc_timestamp,
        );

        for key in &due {
            self.scheduler.reschedule(key, now, &mut self.rng);
        }
        trace!(due = due.len(), events = batch.len(), "cycle assembled");
        Step::Batch(batch)
    }

    /// Wait until something is due and return that cycle's batch.
    ///
    /// Each sleep is bounded by the wait ceiling, and dropping the future
    /// abandons the wait immediately.
    pub async fn next_batch(&mut self) -> Vec<PriceEvent> {
        loop {
            match self.step(Instant::now()) {
                Step::Batch(batch) => return batch,
                Step::Wait(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// The run's state store.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The run's scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
