#![no_std]
#![no_main]

//! Advertise the device name

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf_softdevice::Softdevice;
use panic_probe as _;

use nrf52840_ble_apps::ble::adv_data;
use nrf52840_ble_apps::ble::stack::{self, Roles};
use nrf52840_ble_apps::core::config::BleConfig;
use nrf52840_ble_apps::core::error::AppError;

static BLE_CONFIG: BleConfig = BleConfig::new("nrf52840");

/// Advertising is restarted periodically so failures get retried
const ADV_PERIOD: Duration = Duration::from_secs(60);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting name advertisement");

    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let _p = embassy_nrf::init(nrf_config);

    let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL));
    unwrap!(stack::init(sd, &BLE_CONFIG));
    unwrap!(spawner.spawn(stack::softdevice_task(sd)));

    let payload = unwrap!(adv_data::only_name(BLE_CONFIG.adv_name));

    loop {
        if let Err(e) = stack::advertise_for(sd, &payload, BLE_CONFIG.adv_interval, ADV_PERIOD).await {
            error!("Advertising failed: {:?}", AppError::from(e));
            Timer::after(Duration::from_secs(1)).await;
        }
    }
}
