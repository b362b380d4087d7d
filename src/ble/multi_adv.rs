//! Round-Robin Advertisement Rotator
//!
//! Cycles the advertised payload through a small set of registered sources,
//! switching on a fixed interval. Each source is a function that builds the
//! payload fresh, so sources can embed counters or sensor readings.

use defmt::{debug, error, info, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, Timer};
use heapless::Vec;
use nrf_softdevice::Softdevice;

use crate::ble::adv_data::{AdvDataError, AdvPayload};
use crate::ble::stack;
use crate::core::error::AppError;

/// Max number of advertisements to iterate through
pub const MULTI_ADV_MAX_CONFIG_FUNCTIONS: usize = 3;

/// Default time each advertisement stays on air
pub const DEFAULT_SWITCH_INTERVAL_MS: u32 = 1000;

/// Builds the payload for one slot of the rotation
pub type AdvSource = fn() -> Result<AdvPayload, AdvDataError>;

/// Rotator errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum RotatorError {
    /// All slots are taken
    Full,
    /// Nothing has been registered
    Empty,
    /// The source failed to build its payload
    Payload(AdvDataError),
}

impl From<AdvDataError> for RotatorError {
    fn from(err: AdvDataError) -> Self {
        RotatorError::Payload(err)
    }
}

/// Rotation state
pub struct MultiAdv<const N: usize = MULTI_ADV_MAX_CONFIG_FUNCTIONS> {
    sources: Vec<AdvSource, N>,
    index: usize,
    switch_interval_ms: u32,
    running: bool,
}

impl<const N: usize> MultiAdv<N> {
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
            index: 0,
            switch_interval_ms: DEFAULT_SWITCH_INTERVAL_MS,
            running: false,
        }
    }

    /// Set the switching interval
    pub fn init(&mut self, switch_interval_ms: u32) {
        self.switch_interval_ms = switch_interval_ms;
    }

    /// Add a source to the end of the rotation
    pub fn register(&mut self, source: AdvSource) -> Result<(), RotatorError> {
        self.sources.push(source).map_err(|_| RotatorError::Full)
    }

    /// Enable switching
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop switching; takes effect at the next interval boundary
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn switch_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.switch_interval_ms))
    }

    /// Payload of the current slot
    pub fn current(&self) -> Result<AdvPayload, RotatorError> {
        let source = self.sources.get(self.index).ok_or(RotatorError::Empty)?;
        Ok(source()?)
    }

    /// Move to the next slot and build its payload
    pub fn advance(&mut self) -> Result<AdvPayload, RotatorError> {
        if self.sources.is_empty() {
            return Err(RotatorError::Empty);
        }
        self.index = (self.index + 1) % self.sources.len();
        debug!("Switching to advertisement {}", self.index);
        self.current()
    }
}

impl<const N: usize> Default for MultiAdv<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Global rotator instance
static MULTI_ADV: Mutex<CriticalSectionRawMutex, MultiAdv> = Mutex::new(MultiAdv::new());

/// Get reference to the global rotator
pub async fn rotator() -> MutexGuard<'static, CriticalSectionRawMutex, MultiAdv> {
    MULTI_ADV.lock().await
}

/// Drive the global rotator: advertise the current slot for one switch
/// interval, then move on. Polls once per interval while stopped.
#[embassy_executor::task]
pub async fn multi_adv_task(sd: &'static Softdevice, adv_interval: u32) {
    info!("Starting advertisement rotation task");

    // The current slot goes on air first whenever rotation (re)starts
    let mut resume = true;

    loop {
        let (slot, interval) = {
            let mut rotator = MULTI_ADV.lock().await;
            let interval = rotator.switch_interval();
            if !rotator.is_running() {
                resume = true;
                (None, interval)
            } else if resume {
                resume = false;
                (Some(rotator.current()), interval)
            } else {
                (Some(rotator.advance()), interval)
            }
        };

        match slot {
            None => Timer::after(interval).await,
            Some(Ok(payload)) => {
                if let Err(e) = stack::advertise_for(sd, &payload, adv_interval, interval).await {
                    error!("Rotating advertisement failed: {:?}", defmt::Debug2Format(&e));
                    Timer::after(interval).await;
                }
            }
            Some(Err(e)) => {
                error!("No advertisement to rotate: {:?}", AppError::from(e));
                Timer::after(interval).await;
            }
        }
    }
}
