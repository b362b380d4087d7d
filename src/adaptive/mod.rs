//! Adaptive Advertising
//!
//! Beacons that adjust how often they repeat each data item based on how busy
//! the channel sounded during a short scan.

pub mod epoch;
pub mod payload;
pub mod prr;
pub mod rate;
