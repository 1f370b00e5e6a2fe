// src/services/delay.rs

//! Delay-hours computation.

use chrono::{DateTime, Utc};

/// Which input produced the delay value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySource {
    /// Explicit expected-delay hours from the source configuration
    Explicit,
    /// Estimated minus promised delivery
    Computed,
    /// Engine default fallback
    Fallback,
}

/// Effective delay hours, in priority order:
/// 1. a positive explicit value, verbatim;
/// 2. estimated minus promised, floored at zero;
/// 3. the fallback.
pub fn determine_delay_hours(
    expected_delay_hours: Option<f64>,
    promised: Option<DateTime<Utc>>,
    estimated: Option<DateTime<Utc>>,
    fallback: f64,
) -> (f64, DelaySource) {
    if let Some(hours) = expected_delay_hours.filter(|h| *h > 0.0) {
        return (hours, DelaySource::Explicit);
    }
    if let (Some(promised), Some(estimated)) = (promised, estimated) {
        let seconds = (estimated - promised).num_milliseconds() as f64 / 1000.0;
        return ((seconds / 3600.0).max(0.0), DelaySource::Computed);
    }
    (fallback, DelaySource::Fallback)
}
