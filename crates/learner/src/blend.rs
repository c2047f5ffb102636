//! Rate-limited parameter blending.

use contracts::ScalarChange;

/// Move `current` toward `proposed` by at most `max_rate * |current|`.
///
/// Returns `proposed` when it is already within the allowed step. With
/// `current == 0` the allowed step is zero, so the value never leaves zero.
/// A non-finite `proposed` leaves `current` unchanged.
pub fn blend(current: f64, proposed: f64, max_rate: f64) -> f64 {
    if !proposed.is_finite() {
        return current;
    }

    let max_step = max_rate * current.abs();
    if (proposed - current).abs() < max_step {
        proposed
    } else if proposed > current {
        current + max_step
    } else {
        current - max_step
    }
}

/// Blend a named field and keep the record for the session report
pub fn blend_field(field: &'static str, current: f64, observed: f64, max_rate: f64) -> ScalarChange {
    ScalarChange {
        field,
        previous: current,
        observed,
        blended: blend(current, observed, max_rate),
    }
}
