//! Per-entity scheduler.
//!
//! Every tracked key gets its own cadence: a pace factor drawn once per run
//! scales the base interval, and a fresh jitter is drawn every time the key
//! is rescheduled. Keys whose due time has passed are reported as due; they
//! are never pushed further back.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Range of the per-key pace factor, drawn once.
pub const PACE_RANGE: RangeInclusive<f64> = 0.5..=1.5;

/// Range of the jitter applied at every rescheduling.
pub const JITTER_RANGE: RangeInclusive<f64> = 0.8..=1.2;

/// Shortest wait the scheduler recommends.
pub const MIN_WAIT: Duration = Duration::from_millis(10);

/// Scheduling state of one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleEntry {
    /// Multiplier on the base interval, constant for the run.
    pub pace_factor: f64,
    /// When the key next becomes due.
    pub next_due: Instant,
}

/// Tracks when each key is next due for a tick.
#[derive(Debug, Clone)]
pub struct Scheduler {
    base_interval: Duration,
    wait_ceiling: Duration,
    order: Vec<String>,
    entries: HashMap<String, ScheduleEntry>,
}

impl Scheduler {
    /// Schedule every key for its first tick relative to `now`.
    pub fn new<R: Rng + ?Sized>(
        keys: &[String],
        base_interval: Duration,
        wait_ceiling: Duration,
        now: Instant,
        rng: &mut R,
    ) -> Self {
        let mut scheduler = Self {
            base_interval,
            wait_ceiling,
            order: Vec::with_capacity(keys.len()),
            entries: HashMap::with_capacity(keys.len()),
        };
        for key in keys {
            if scheduler.entries.contains_key(key) {
                continue;
            }
            let pace_factor = rng.gen_range(PACE_RANGE);
            let next_due = now + scheduler.delay(pace_factor, rng);
            scheduler.order.push(key.clone());
            scheduler.entries.insert(
                key.clone(),
                ScheduleEntry {
                    pace_factor,
                    next_due,
                },
            );
        }
        scheduler
    }

    /// Keys whose due time is at or before `now`, in tracking order.
    #[must_use]
    pub fn due(&self, now: Instant) -> Vec<String> {
        self.order
            .iter()
            .filter(|key| self.entries[key.as_str()].next_due <= now)
            .cloned()
            .collect()
    }

    /// How long to wait before checking again when nothing is due.
    ///
    /// The time until the earliest due key, floored at [`MIN_WAIT`] and capped
    /// at the wait ceiling so the caller stays responsive.
    #[must_use]
    pub fn wait_hint(&self, now: Instant) -> Duration {
        let until_next = self
            .entries
            .values()
            .map(|entry| entry.next_due.saturating_duration_since(now))
            .min()
            .unwrap_or(self.wait_ceiling);
        until_next.max(MIN_WAIT).min(self.wait_ceiling)
    }

    /// Schedule `key` again after a tick applied at `now`, with fresh jitter.
    ///
    /// Returns `false` if the key is not tracked.
    pub fn reschedule<R: Rng + ?Sized>(&mut self, key: &str, now: Instant, rng: &mut R) -> bool {
        let Some(pace_factor) = self.entries.get(key).map(|e| e.pace_factor) else {
            return false;
        };
        let next_due = now + self.delay(pace_factor, rng);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.next_due = next_due;
        }
        true
    }

    /// Returns the schedule entry for `key`.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<ScheduleEntry> {
        self.entries.get(key).copied()
    }

    /// Tracked keys in order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    /// Delay before the next tick: `base * pace * jitter`, never zero.
    fn delay<R: Rng + ?Sized>(&self, pace_factor: f64, rng: &mut R) -> Duration {
        let jitter = rng.gen_range(JITTER_RANGE);
        self.base_interval
            .mul_f64(pace_factor * jitter)
            .max(Duration::from_nanos(1))
    }
}
