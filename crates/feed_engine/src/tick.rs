//! Random-walk tick generator.

use rand::Rng;

use crate::state::round2;

/// Largest relative move a single tick can apply (±1%).
pub const MAX_STEP: f64 = 0.01;

/// Smallest value a tick can produce.
pub const MIN_VALUE: f64 = 0.01;

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// New value, rounded to cents and never below [`MIN_VALUE`].
    pub value: f64,
    /// Percent change from the previous value, rounded to two decimals.
    pub change_percent: f64,
}

/// Apply one random-walk step to `prev`.
pub fn tick<R: Rng + ?Sized>(prev: f64, rng: &mut R) -> Tick {
    apply_step(prev, rng.gen_range(-MAX_STEP..=MAX_STEP))
}

/// Apply a relative step `draw` (in `[-0.01, 0.01]`) to `prev`.
///
/// Deterministic in its inputs; [`tick`] only adds the random draw.
#[must_use]
pub fn apply_step(prev: f64, draw: f64) -> Tick {
    let value = round2(prev + prev * draw).max(MIN_VALUE);
    let change_percent = if prev > 0.0 {
        round2((value - prev) / prev * 100.0)
    } else {
        0.0
    };
    Tick {
        value,
        change_percent,
    }
}
