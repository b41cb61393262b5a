//! Snapshot assembly.
//!
//! Turns the store's current state into the events emitted for one
//! scheduling cycle.

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use feed_net::PriceEvent;

use crate::state::EntityStore;

/// Which entities a cycle's batch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    /// One event per tracked key. Keys not ticked this cycle repeat their
    /// value with a zero change.
    #[default]
    Full,
    /// One event per key ticked this cycle.
    Delta,
}

/// Build the batch for one cycle.
///
/// Events follow `keys` order. `timestamp` is called once per event, at
/// assembly time. Keys missing from the store are skipped.
pub fn assemble<F>(
    policy: SnapshotPolicy,
    keys: &[String],
    due: &[String],
    store: &EntityStore,
    mut timestamp: F,
) -> Vec<PriceEvent>
where
    F: FnMut() -> String,
{
    let due: HashSet<&str> = due.iter().map(String::as_str).collect();
    let mut batch = Vec::with_capacity(match policy {
        SnapshotPolicy::Full => keys.len(),
        SnapshotPolicy::Delta => due.len(),
    });

    for key in keys {
        let ticked = due.contains(key.as_str());
        if policy == SnapshotPolicy::Delta && !ticked {
            continue;
        }
        let Some(state) = store.get(key) else {
            continue;
        };
        batch.push(PriceEvent {
            symbol: key.clone(),
            price: state.value,
            change_percent: if ticked { state.change_percent } else { 0.0 },
            timestamp: timestamp(),
        });
    }
    batch
}

/// Current UTC time as ISO-8601 with microseconds and a `Z` designator.
#[must_use]
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
