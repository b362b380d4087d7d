//! Packet Reception Rate Estimator
//!
//! During a scan window every advertisement report heard lowers the expected
//! probability that one of our own packets gets through. After the window the
//! estimate is discounted by the loss expected at the gateway, and the number
//! of repeated transmissions needed to reach the target reliability is found
//! by combining independent attempts: `prr' = 1 - (1 - prr)^2`.
//!
//! All probabilities are fixed-point parts-per-million held in `u64`.

use defmt::{debug, Format};

/// Fixed-point representation of probability 1.0
pub const PPM: u64 = 1_000_000;

/// Loss expected at the gateway independent of channel load
pub const GATEWAY_LOSS_PPM: u64 = 78_800;

/// Reliability we try to reach by repeating each data item
pub const TARGET_PRR_PPM: u64 = 990_000;

/// Upper bound on transmissions per data item
pub const MAX_REPEATS: u8 = 10;

/// Bytes in our own (full length) advertisement
const OWN_ADV_LEN: u64 = 31;

/// Preamble, access address, header and CRC around every PDU
const PDU_OVERHEAD: u64 = 16;

/// Reception probability of one of our packets given one overheard report
pub const fn local_prr(report_len: u8) -> u64 {
    let collision = (OWN_ADV_LEN + PDU_OVERHEAD) * 8 + (report_len as u64 + PDU_OVERHEAD) * 8;
    PPM.saturating_sub(collision)
}

/// Accumulates the reception model over one scan window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct PrrEstimator {
    adv_count: u32,
    prr_product: u64,
}

impl PrrEstimator {
    pub const fn new() -> Self {
        Self {
            adv_count: 0,
            prr_product: PPM,
        }
    }

    /// Start a new scan window
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fold one advertisement report of `report_len` payload bytes into the model
    pub fn record_report(&mut self, report_len: u8) {
        self.prr_product = self.prr_product * local_prr(report_len) / PPM;
        self.adv_count = self.adv_count.saturating_add(1);
    }

    /// Reports seen since the last reset
    pub fn adv_count(&self) -> u32 {
        self.adv_count
    }

    /// Channel-only reception probability (ppm)
    pub fn prr_product(&self) -> u64 {
        self.prr_product
    }

    /// Reception probability including the gateway loss (ppm)
    pub fn expected_prr(&self, gateway_loss: u64) -> u64 {
        self.prr_product * PPM.saturating_sub(gateway_loss) / PPM
    }

    /// Number of transmissions per data item for the default thresholds
    pub fn packets_per_data(&self) -> Convergence {
        packets_per_data(self.expected_prr(GATEWAY_LOSS_PPM), TARGET_PRR_PPM, MAX_REPEATS)
    }
}

impl Default for PrrEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of the repeat-count search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct Convergence {
    /// Transmissions per data item, in `1..=max`
    pub count: u8,
    /// Reception probability reached with `count` transmissions (ppm)
    pub final_prr: u64,
}

/// One combination step: probability that at least one of two attempts succeeds
pub const fn combine(prr: u64) -> u64 {
    let prr = if prr > PPM { PPM } else { prr };
    let miss = PPM - prr;
    PPM - (miss * miss) / PPM
}

/// Find how many transmissions reach `target`, capped at `max`.
pub fn packets_per_data(prr: u64, target: u64, max: u8) -> Convergence {
    let mut steps = convergence_steps(prr, target, max);
    let mut last = Convergence {
        count: 1,
        final_prr: prr.min(PPM),
    };
    debug!("\tCount: {} Expected PRR: {}", last.count, last.final_prr);

    // The first item is the starting point already recorded above
    let _ = steps.next();
    for (count, prr) in steps {
        debug!("\tCount: {} Expected PRR: {}", count, prr);
        last = Convergence { count, final_prr: prr };
    }

    last
}

/// Successive `(count, prr)` pairs visited by the repeat-count search,
/// starting with `(1, prr)`.
pub fn convergence_steps(prr: u64, target: u64, max: u8) -> ConvergenceSteps {
    ConvergenceSteps {
        prr: prr.min(PPM),
        count: 0,
        target,
        max: max.max(1),
    }
}

/// Iterator returned by [`convergence_steps`]
#[derive(Debug, Clone)]
pub struct ConvergenceSteps {
    prr: u64,
    count: u8,
    target: u64,
    max: u8,
}

impl Iterator for ConvergenceSteps {
    type Item = (u8, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.count == 0 {
            self.count = 1;
            return Some((1, self.prr));
        }
        if self.prr >= self.target || self.count >= self.max {
            return None;
        }
        self.count += 1;
        self.prr = combine(self.prr);
        Some((self.count, self.prr))
    }
}
