//! Advertising interval selection from a desired packet rate.

use crate::core::config::{msec_to_units, Unit};

/// Fastest interval allowed for non-connectable advertising
pub const MIN_NONCONN_INTERVAL_MS: u32 = 100;

/// Time reserved per packet for the advertising event itself
const EVENT_OVERHEAD_MS: u32 = 5;

/// Interval (ms) that fits `packets_per_second` advertisements into a second.
///
/// A rate of zero is treated as one packet per second.
pub fn interval_ms_for_rate(packets_per_second: u16) -> u32 {
    let pps = u32::from(packets_per_second.max(1));
    let rate = 1000u32.saturating_sub(pps * EVENT_OVERHEAD_MS) / pps;
    rate.max(MIN_NONCONN_INTERVAL_MS)
}

/// [`interval_ms_for_rate`] in 0.625ms advertising units
pub fn interval_units_for_rate(packets_per_second: u16) -> u32 {
    msec_to_units(interval_ms_for_rate(packets_per_second), Unit::Unit0_625ms)
}
