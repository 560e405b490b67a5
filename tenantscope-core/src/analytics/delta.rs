//! Period-over-period change.

use serde::Serialize;

/// Percentage change from `previous` to `current`.
///
/// A zero (or negative) base reports `100` when `current` is positive and
/// `0` otherwise. The result is always finite.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if !current.is_finite() || !previous.is_finite() {
        return 0.0;
    }
    if previous > 0.0 {
        let change = (current - previous) / previous * 100.0;
        if change.is_finite() {
            change
        } else if change > 0.0 {
            100.0
        } else {
            0.0
        }
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && numerator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}

/// `numerator` as a percentage of `denominator`, or 0 for an empty base.
pub fn percent_of(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator) * 100.0
}

/// A metric in the current and comparison windows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricDelta {
    pub current: f64,
    pub previous: f64,
    pub percent_change: f64,
}

impl MetricDelta {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            percent_change: percent_change(current, previous),
        }
    }

    /// Delta between two counts.
    pub fn from_counts(current: usize, previous: usize) -> Self {
        Self::new(current as f64, previous as f64)
    }

    pub fn is_increase(&self) -> bool {
        self.percent_change >= 0.0
    }
}
