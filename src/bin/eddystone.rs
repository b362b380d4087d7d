#![no_std]
#![no_main]

//! Advertise a URL according to the Eddystone protocol, with the device name
//! and manufacturer data in the scan response.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf_softdevice::Softdevice;
use panic_probe as _;

use nrf52840_ble_apps::ble::adv_data::{self, ManufData};
use nrf52840_ble_apps::ble::stack::{self, Roles};
use nrf52840_ble_apps::core::config::BleConfig;
use nrf52840_ble_apps::core::error::AppError;

const DEVICE_NAME: &str = "test";
const PHYSWEB_URL: &str = "j2x.us/12345";
const UMICH_COMPANY_IDENTIFIER: u16 = 0x02E0;

/// Calibrated TX power at 0 m (dBm)
const TX_POWER: i8 = -20;

static BLE_CONFIG: BleConfig = BleConfig::new(DEVICE_NAME);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting Eddystone beacon");

    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let _p = embassy_nrf::init(nrf_config);

    let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL));
    unwrap!(stack::init(sd, &BLE_CONFIG));
    unwrap!(spawner.spawn(stack::softdevice_task(sd)));

    let payload = unwrap!(adv_data::eddystone_with_manuf(
        PHYSWEB_URL,
        TX_POWER,
        DEVICE_NAME,
        ManufData {
            company_id: UMICH_COMPANY_IDENTIFIER,
            data: &[0x01],
        },
    ));
    info!("Advertising {} ({} + {} bytes)", PHYSWEB_URL, payload.adv.len(), payload.scan.len());

    loop {
        if let Err(e) = stack::advertise_for(sd, &payload, BLE_CONFIG.adv_interval, Duration::from_secs(60)).await {
            error!("Advertising failed: {:?}", AppError::from(e));
            Timer::after(Duration::from_secs(1)).await;
        }
    }
}
