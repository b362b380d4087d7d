#![no_std]
#![no_main]

//! ex3 deployment beacon
//!
//! Advertises while scanning. Once a second the payload is rebuilt with a new
//! data counter and the number of advertisements overheard since the last
//! update. Updates follow a timer rather than radio events, so every packet
//! of one data item carries the same counter.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf_softdevice::Softdevice;
use panic_probe as _;

use nrf52840_ble_apps::adaptive::payload::{encode_ex3, DeploymentFields};
use nrf52840_ble_apps::ble::adv_data::{self, AdvPayload};
use nrf52840_ble_apps::ble::stack::{self, Roles};
use nrf52840_ble_apps::core::config::BleConfig;
use nrf52840_ble_apps::core::error::AppError;
use nrf52840_ble_apps::drivers::led::{Led, Polarity};

static BLE_CONFIG: BleConfig = BleConfig::new("ADV TEST");

/// 995 ms in 0.625ms units
const ADV_INTERVAL: u32 = 1592;

const UPDATE_PERIOD: Duration = Duration::from_secs(1);

fn deployment_payload(fields: &DeploymentFields) -> Result<AdvPayload, AppError> {
    // The encoded frame is one manufacturer structure; skip its length and type bytes
    Ok(AdvPayload {
        adv: adv_data::manufacturer_frame(&encode_ex3(fields)[2..])?,
        scan: adv_data::empty()?,
    })
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting scanning deployment beacon");

    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let mut led = Led::new(p.P0_13, Polarity::ActiveLow);

    let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL_CENTRAL));
    unwrap!(stack::init(sd, &BLE_CONFIG));
    unwrap!(spawner.spawn(stack::softdevice_task(sd)));

    info!("App Configured!");

    let mut counter: u32 = 0;
    let mut seen: u32 = 0;

    loop {
        let fields = DeploymentFields {
            interval: ADV_INTERVAL as u16,
            data_counter: counter,
            redundant: 0,
            seen,
        };
        counter = counter.wrapping_add(1);
        info!("ADV COUNT: {}", seen);

        let payload = unwrap!(deployment_payload(&fields));

        let (adv, scan) = join(
            stack::advertise_for(sd, &payload, ADV_INTERVAL, UPDATE_PERIOD),
            stack::scan_window(sd, UPDATE_PERIOD, |len| {
                led.toggle();
                debug!("Report: {} bytes", len);
            }),
        )
        .await;

        if let Err(e) = adv {
            error!("Advertising failed: {:?}", AppError::from(e));
        }
        seen = match scan {
            Ok(reports) => reports,
            Err(e) => {
                error!("Scan failed: {:?}", AppError::from(e));
                Timer::after(UPDATE_PERIOD).await;
                0
            }
        };
    }
}
