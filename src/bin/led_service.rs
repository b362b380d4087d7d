#![no_std]
#![no_main]

//! LED control service
//!
//! Writing to `led_on` / `led_off` switches LED1; `led_state` can be read
//! and notifies subscribers on every change. A device information service
//! publishes the board and firmware revisions.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::{gatt_server, Connection};
use nrf_softdevice::Softdevice;
use panic_probe as _;

use nrf52840_ble_apps::ble::adv_data;
use nrf52840_ble_apps::ble::device_info::{DeviceInfo, DeviceInfoService, DeviceInfoServiceEvent};
use nrf52840_ble_apps::ble::stack::{self, Roles};
use nrf52840_ble_apps::core::config::BleConfig;
use nrf52840_ble_apps::core::error::AppError;
use nrf52840_ble_apps::drivers::led::{Led, Polarity};

static BLE_CONFIG: BleConfig = BleConfig::new("LED Service");

const DEVICE_INFO: DeviceInfo<'static> = DeviceInfo {
    hardware_revision: Some("nRF52840-DK"),
    firmware_revision: Some(env!("CARGO_PKG_VERSION")),
    software_revision: None,
};

#[nrf_softdevice::gatt_service(uuid = "7bad0f89-2883-4587-e64e-ea96a0dea487")]
struct LedService {
    #[characteristic(uuid = "7bad8910-2883-4587-e64e-ea96a0dea487", write)]
    led_on: u8,
    #[characteristic(uuid = "7bad8911-2883-4587-e64e-ea96a0dea487", write)]
    led_off: u8,
    #[characteristic(uuid = "7bad8912-2883-4587-e64e-ea96a0dea487", read, notify)]
    led_state: u8,
}

#[nrf_softdevice::gatt_server]
struct Server {
    led: LedService,
    device_info: DeviceInfoService,
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting LED service");

    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let mut led = Led::new(p.P0_13, Polarity::ActiveLow);

    let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL));
    let server = unwrap!(Server::new(sd));
    unwrap!(server.device_info.populate(&DEVICE_INFO));
    unwrap!(stack::init(sd, &BLE_CONFIG));
    unwrap!(spawner.spawn(stack::softdevice_task(sd)));

    let payload = unwrap!(adv_data::only_name(BLE_CONFIG.adv_name));

    loop {
        let conn = match stack::advertise_connectable(sd, &payload, &BLE_CONFIG).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Advertising failed: {:?}", AppError::from(e));
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };
        info!("Connected");

        let e = gatt_server::run(&conn, &server, |event| handle_event(&server, &conn, &mut led, event)).await;
        info!("Disconnected: {:?}", defmt::Debug2Format(&e));
    }
}

fn handle_event(server: &Server, conn: &Connection, led: &mut Led, event: ServerEvent) {
    let ServerEvent::Led(event) = event else {
        return;
    };
    let state = match event {
        LedServiceEvent::LedOnWrite(_) => {
            led.on();
            1
        }
        LedServiceEvent::LedOffWrite(_) => {
            led.off();
            0
        }
        LedServiceEvent::LedStateCccdWrite { notifications } => {
            debug!("led_state notifications: {}", notifications);
            return;
        }
    };

    if server.led.led_state_set(&state).is_err() {
        warn!("Failed to store LED state");
    }
    if server.led.led_state_notify(conn, &state).is_err() {
        debug!("LED state notification not sent");
    }
}
