//! Epoch Bookkeeping
//!
//! The adjusting beacon numbers its transmissions as
//! `epoch / data item in epoch / packet in data item`. Each data item is sent
//! `packets_per_data` times. Epoch boundaries are driven by a minute timer but
//! only take effect once the current data item is complete, at which point the
//! beacon pauses to re-measure the channel.

use defmt::{debug, info, Format};

use super::prr::{Convergence, PrrEstimator};

/// Default epoch length
pub const DEFAULT_MINUTES_IN_EPOCH: u8 = 10;

/// What the advertiser must do after an advertising event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum AdvEventOutcome {
    /// Keep advertising
    Continue,
    /// A new epoch started: stop advertising and run a scan window
    NewEpoch,
}

/// Sequence counters carried in every beacon payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct EpochTracker {
    pub epoch: u16,
    pub data_in_epoch: u32,
    pub packet_in_data: u16,
    pub packets_per_data: u16,
    pub tx_estimate: u32,
    minutes_in_epoch: u8,
    minutes: u8,
    start_new_epoch: bool,
}

impl EpochTracker {
    pub const fn new(minutes_in_epoch: u8) -> Self {
        Self {
            epoch: 0,
            data_in_epoch: 0,
            packet_in_data: 0,
            packets_per_data: 1,
            tx_estimate: 0,
            minutes_in_epoch,
            minutes: 0,
            start_new_epoch: false,
        }
    }

    /// Count one minute. Returns `true` when this minute completes an epoch.
    pub fn on_minute(&mut self) -> bool {
        self.minutes = self.minutes.saturating_add(1);
        debug!("Minute {}", self.minutes);
        if self.minutes >= self.minutes_in_epoch {
            self.minutes = 0;
            self.start_new_epoch = true;
            info!("New epoch pending");
            return true;
        }
        false
    }

    /// Whether an epoch boundary is waiting for the current data item to finish
    pub fn new_epoch_pending(&self) -> bool {
        self.start_new_epoch
    }

    /// Advance the packet counters after one advertising event
    pub fn after_adv_event(&mut self) -> AdvEventOutcome {
        debug!(
            "Epoch {} Data {} Packet {}",
            self.epoch, self.data_in_epoch, self.packet_in_data
        );

        self.packet_in_data = self.packet_in_data.wrapping_add(1);
        if self.packet_in_data < self.packets_per_data {
            return AdvEventOutcome::Continue;
        }

        self.packet_in_data = 0;
        self.data_in_epoch = self.data_in_epoch.wrapping_add(1);

        if self.start_new_epoch {
            self.start_new_epoch = false;
            self.data_in_epoch = 0;
            self.epoch = self.epoch.wrapping_add(1);
            return AdvEventOutcome::NewEpoch;
        }

        AdvEventOutcome::Continue
    }

    /// Apply the result of a scan window
    pub fn finish_scan(&mut self, estimator: &PrrEstimator) -> Convergence {
        self.tx_estimate = estimator.adv_count();

        let convergence = estimator.packets_per_data();
        info!(
            "Adv count: {}. Prr: {}. I should send {} packets.",
            estimator.adv_count(),
            estimator.prr_product(),
            convergence.count
        );
        self.packets_per_data = u16::from(convergence.count);
        convergence
    }
}

impl Default for EpochTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES_IN_EPOCH)
    }
}
