#![no_std]
#![no_main]

//! Self-adjusting beacon
//!
//! Sends ex4 beacons, one payload per advertising event. Every epoch the
//! beacon stops, listens to the channel for a second and picks how many
//! times each data item must be repeated to reach the target reliability.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker, Timer};
use nrf_softdevice::Softdevice;
use panic_probe as _;

use nrf52840_ble_apps::adaptive::epoch::{AdvEventOutcome, EpochTracker, DEFAULT_MINUTES_IN_EPOCH};
use nrf52840_ble_apps::adaptive::payload::{encode_ex4, AdjustingFields};
use nrf52840_ble_apps::adaptive::prr::PrrEstimator;
use nrf52840_ble_apps::adaptive::rate::interval_units_for_rate;
use nrf52840_ble_apps::ble::stack::{self, PacedAdvertiser, Roles};
use nrf52840_ble_apps::core::config::BleConfig;
use nrf52840_ble_apps::core::error::AppError;
use nrf52840_ble_apps::drivers::led::{Led, Polarity};

// The advertising interval is replaced as soon as the first rate is chosen
static BLE_CONFIG: BleConfig = BleConfig::new("ADV TEST");

const SCAN_WINDOW: Duration = Duration::from_secs(1);
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Shared between the advertiser and the minute timer
static TRACKER: Mutex<CriticalSectionRawMutex, EpochTracker> =
    Mutex::new(EpochTracker::new(DEFAULT_MINUTES_IN_EPOCH));

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting adjusting beacon");

    // Configure interrupt priorities to avoid SoftDevice reserved levels (0, 1, 4)
    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let led = Led::new(p.P0_13, Polarity::ActiveLow);

    let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL_CENTRAL));
    unwrap!(stack::init(sd, &BLE_CONFIG));
    unwrap!(spawner.spawn(stack::softdevice_task(sd)));
    unwrap!(spawner.spawn(epoch_timer_task()));

    beacon(sd, led).await
}

#[embassy_executor::task]
async fn epoch_timer_task() {
    let mut ticker = Ticker::every(Duration::from_secs(60));
    loop {
        ticker.next().await;
        TRACKER.lock().await.on_minute();
    }
}

async fn beacon(sd: &Softdevice, mut led: Led) -> ! {
    let mut estimator = PrrEstimator::new();
    let mut advertiser = PacedAdvertiser::new(interval_units_for_rate(1));
    info!("Advertising interval {} units", advertiser.interval());

    loop {
        // The payload carries the counters as they were before this event
        let (adv_data, outcome) = {
            let mut tracker = TRACKER.lock().await;
            let adv_data = encode_ex4(&AdjustingFields {
                interval: advertiser.interval() as u16,
                epoch: tracker.epoch,
                data_in_epoch: tracker.data_in_epoch,
                packet_in_data: tracker.packet_in_data,
                tx_estimate: tracker.tx_estimate,
            });
            (adv_data, tracker.after_adv_event())
        };

        match outcome {
            AdvEventOutcome::Continue => {
                if let Err(e) = advertiser.send(sd, &adv_data, &[]).await {
                    error!("Advertising failed: {:?}", AppError::from(e));
                    Timer::after(RETRY_DELAY).await;
                    continue;
                }
                led.toggle();
            }
            AdvEventOutcome::NewEpoch => {
                info!("Starting scan");
                estimator.reset();
                match stack::scan_window(sd, SCAN_WINDOW, |len| estimator.record_report(len)).await {
                    Ok(reports) => debug!("Scan window heard {} reports", reports),
                    Err(e) => error!("Scan failed: {:?}", AppError::from(e)),
                }

                let convergence = TRACKER.lock().await.finish_scan(&estimator);
                advertiser.set_interval(interval_units_for_rate(u16::from(convergence.count)));
                info!("Advertising interval {} units", advertiser.interval());
            }
        }
    }
}
