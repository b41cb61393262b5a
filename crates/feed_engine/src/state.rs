//! Entity state store.
//!
//! Holds the last known price (and the percent change that produced it) for
//! every tracked symbol. Symbols are added at initialisation and never
//! removed; iteration follows initialisation order.

use std::collections::HashMap;

use rand::Rng;

/// Range initial prices are drawn from.
const INITIAL_PRICE_RANGE: std::ops::RangeInclusive<f64> = 100.0..=400.0;

/// Last known state of one tracked entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityState {
    /// Current value.
    pub value: f64,
    /// Percent change applied by the most recent tick.
    pub change_percent: f64,
}

/// Per-run store of entity values.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    keys: Vec<String>,
    entities: HashMap<String, EntityState>,
}

impl EntityStore {
    /// Initialise a store for `keys`, drawing each starting value from `rng`.
    ///
    /// Starting values are uniform in `[100, 400]` and rounded to cents, so
    /// the same keys and the same seeded generator always produce the same
    /// store. Duplicate keys are tracked once.
    pub fn initialize<R: Rng + ?Sized>(keys: &[String], rng: &mut R) -> Self {
        let mut store = Self::default();
        for key in keys {
            if store.entities.contains_key(key) {
                continue;
            }
            let value = round2(rng.gen_range(INITIAL_PRICE_RANGE));
            store.keys.push(key.clone());
            store.entities.insert(
                key.clone(),
                EntityState {
                    value,
                    change_percent: 0.0,
                },
            );
        }
        store
    }

    /// Returns the state of `key`, if tracked.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<EntityState> {
        self.entities.get(key).copied()
    }

    /// Record a new state for `key`. Unknown keys start being tracked.
    pub fn set(&mut self, key: &str, state: EntityState) {
        match self.entities.get_mut(key) {
            Some(existing) => *existing = state,
            None => {
                self.keys.push(key.to_string());
                self.entities.insert(key.to_string(), state);
            }
        }
    }

    /// Tracked keys in initialisation order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_same_seed_same_initial_values() {
        let symbols = keys(&["AAPL", "MSFT", "GOOGL"]);
        let a = EntityStore::initialize(&symbols, &mut StdRng::seed_from_u64(42));
        let b = EntityStore::initialize(&symbols, &mut StdRng::seed_from_u64(42));
        for symbol in &symbols {
            assert_eq!(a.get(symbol), b.get(symbol));
        }
    }

    #[test]
    fn test_initial_values_in_range_and_rounded() {
        let symbols = keys(&["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"]);
        let store = EntityStore::initialize(&symbols, &mut StdRng::seed_from_u64(7));
        for symbol in &symbols {
            let state = store.get(symbol).unwrap();
            assert!((100.0..=400.0).contains(&state.value));
            assert_eq!(state.value, round2(state.value));
            assert_eq!(state.change_percent, 0.0);
        }
    }

    #[test]
    fn test_keys_keep_initialisation_order_without_duplicates() {
        let store = EntityStore::initialize(
            &keys(&["TSLA", "AAPL", "TSLA"]),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(store.keys(), ["TSLA", "AAPL"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_set_replaces_value() {
        let mut store = EntityStore::initialize(&keys(&["AAPL"]), &mut StdRng::seed_from_u64(1));
        let next = EntityState {
            value: 123.45,
            change_percent: 0.5,
        };
        store.set("AAPL", next);
        assert_eq!(store.get("AAPL"), Some(next));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_key() {
        let store = EntityStore::default();
        assert!(store.is_empty());
        assert!(store.get("NOPE").is_none());
    }
}
