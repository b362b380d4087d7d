#![no_std]
#![no_main]

//! Alternate one second scan windows with one second pauses and report how
//! many transmissions per data item the channel currently calls for.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf_softdevice::Softdevice;
use panic_probe as _;

use nrf52840_ble_apps::adaptive::prr::PrrEstimator;
use nrf52840_ble_apps::ble::stack::{self, Roles};
use nrf52840_ble_apps::core::config::BleConfig;
use nrf52840_ble_apps::core::error::AppError;
use nrf52840_ble_apps::drivers::led::{Led, Polarity};

static BLE_CONFIG: BleConfig = BleConfig::new("RTTTEST").with_platform_id(0x40);

const SCAN_WINDOW: Duration = Duration::from_secs(1);
const IDLE: Duration = Duration::from_secs(1);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting automatic adjusting scanner");

    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let mut led = Led::new(p.P0_13, Polarity::ActiveLow);

    let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL_CENTRAL));
    unwrap!(stack::init(sd, &BLE_CONFIG));
    unwrap!(spawner.spawn(stack::softdevice_task(sd)));

    let mut estimator = PrrEstimator::new();

    loop {
        Timer::after(IDLE).await;

        estimator.reset();
        let result = stack::scan_window(sd, SCAN_WINDOW, |len| {
            led.toggle();
            estimator.record_report(len);
        })
        .await;

        if let Err(e) = result {
            error!("Scan failed: {:?}", AppError::from(e));
            continue;
        }

        let convergence = estimator.packets_per_data();
        info!(
            "Adv count: {}. Prr: {}. I should send {} packets.",
            estimator.adv_count(),
            estimator.prr_product(),
            convergence.count
        );
    }
}
