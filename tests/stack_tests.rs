//! Tests for the SoftDevice convenience layer
//!
//! These tests run on the target hardware using defmt-test with the S140
//! SoftDevice flashed. The SoftDevice is enabled once in `init` and its
//! events are dispatched alongside each test future.

#![no_std]
#![no_main]

mod common;

use core::future::Future;

use embassy_futures::block_on;
use embassy_futures::select::{select, Either};
use embassy_nrf::interrupt::Priority;
use embassy_time::{Duration, Instant};
use nrf52840_ble_apps::ble::adv_data;
use nrf52840_ble_apps::ble::device_info::{system_id, DeviceInfo, DeviceInfoService, DeviceInfoServiceEvent, SYSTEM_ID_MANUFACTURER};
use nrf52840_ble_apps::ble::stack::{self, interval_duration, PacedAdvertiser, Roles};
use nrf52840_ble_apps::core::config::{resolve_address, BleConfig, ADDRESS_FLASH_LOCATION, ADDRESS_OUI};
use nrf_softdevice::ble::{self, peripheral::AdvertiseError};
use nrf_softdevice::Softdevice;

static BLE_CONFIG: BleConfig = BleConfig::new("stack test").with_platform_id(0x40);

/// 100 ms in 0.625ms units
const TEST_INTERVAL: u32 = 160;

#[nrf_softdevice::gatt_server]
struct TestServer {
    device_info: DeviceInfoService,
}

struct State {
    sd: &'static Softdevice,
    server: TestServer,
}

/// Drive `fut` to completion while the SoftDevice event loop runs
fn run_with_softdevice<F: Future>(sd: &Softdevice, fut: F) -> F::Output {
    match block_on(select(sd.run(), fut)) {
        Either::First(_) => unreachable!(),
        Either::Second(output) => output,
    }
}

fn flash_cell() -> [u8; 6] {
    unsafe { core::ptr::read_volatile(ADDRESS_FLASH_LOCATION as *const [u8; 6]) }
}

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq, unwrap};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() -> State {
        ensure_heap_initialized();

        let mut nrf_config = embassy_nrf::config::Config::default();
        nrf_config.gpiote_interrupt_priority = Priority::P2;
        nrf_config.time_interrupt_priority = Priority::P2;
        let _p = embassy_nrf::init(nrf_config);

        let sd = Softdevice::enable(&stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL_CENTRAL));
        let server = unwrap!(TestServer::new(sd));
        State { sd, server }
    }

    #[test]
    fn test_config_role_counts_and_name() {
        let config = stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL);
        let roles = config.gap_role_count.as_ref().unwrap();
        assert_eq!(roles.adv_set_count, 1);
        assert_eq!(roles.periph_role_count, 1);
        assert_eq!(roles.central_role_count, 0);

        let config = stack::softdevice_config(&BLE_CONFIG, Roles::PERIPHERAL_CENTRAL);
        assert_eq!(config.gap_role_count.as_ref().map(|r| r.central_role_count), Some(1));

        // The stack reads the name in place
        let name = config.gap_device_name.as_ref().unwrap();
        assert_eq!(name.current_len, BLE_CONFIG.adv_name.len() as u16);
        assert_eq!(name.max_len, name.current_len);
        assert!(name.p_value as *const u8 == BLE_CONFIG.adv_name.as_ptr());
    }

    #[test]
    fn test_interval_duration() {
        assert_eq!(interval_duration(TEST_INTERVAL), Duration::from_millis(100));
        assert_eq!(interval_duration(1600), Duration::from_secs(1));
        assert_eq!(interval_duration(3200), Duration::from_secs(2));
    }

    #[test]
    fn test_init_sets_derived_address(state: &mut State) {
        let factory = ble::get_address(state.sd).bytes();
        let expected = resolve_address(flash_cell(), factory, &BLE_CONFIG);

        assert!(stack::init(state.sd, &BLE_CONFIG).is_ok());
        assert_eq!(ble::get_address(state.sd).bytes(), expected);

        // Applying the same configuration again keeps the address
        assert!(stack::init(state.sd, &BLE_CONFIG).is_ok());
        assert_eq!(ble::get_address(state.sd).bytes(), expected);
    }

    #[test]
    fn test_advertise_once_returns(state: &mut State) {
        let sd = state.sd;
        let payload = adv_data::only_name(BLE_CONFIG.adv_name).unwrap();

        let result = run_with_softdevice(sd, stack::advertise_once(sd, &payload.adv, &[], TEST_INTERVAL));
        assert!(result.is_ok());
    }

    #[test]
    fn test_paced_events_are_an_interval_apart(state: &mut State) {
        const EVENTS: u32 = 5;
        let sd = state.sd;
        let payload = adv_data::only_name(BLE_CONFIG.adv_name).unwrap();
        let mut advertiser = PacedAdvertiser::new(TEST_INTERVAL);

        let start = Instant::now();
        let result = run_with_softdevice(sd, async {
            for _ in 0..EVENTS {
                advertiser.send(sd, &payload.adv, &[]).await?;
            }
            Ok::<(), AdvertiseError>(())
        });

        assert!(result.is_ok());
        assert!(start.elapsed() >= interval_duration(TEST_INTERVAL) * (EVENTS - 1));
    }

    #[test]
    fn test_interval_change_applies_to_next_event(state: &mut State) {
        let sd = state.sd;
        let payload = adv_data::only_name(BLE_CONFIG.adv_name).unwrap();
        let mut advertiser = PacedAdvertiser::new(TEST_INTERVAL);

        let result = run_with_softdevice(sd, async {
            advertiser.send(sd, &payload.adv, &[]).await?;
            advertiser.set_interval(TEST_INTERVAL * 2);
            let start = Instant::now();
            advertiser.send(sd, &payload.adv, &[]).await?;
            Ok::<Duration, AdvertiseError>(start.elapsed())
        });

        assert_eq!(advertiser.interval(), TEST_INTERVAL * 2);
        // Measured from after the first event returned, so allow for its airtime
        let min_wait = interval_duration(TEST_INTERVAL * 2) - Duration::from_millis(20);
        assert!(result.is_ok_and(|waited| waited >= min_wait));
    }

    #[test]
    fn test_device_info_attributes(state: &mut State) {
        let info = DeviceInfo {
            hardware_revision: Some("rev A"),
            firmware_revision: Some("0.1.0"),
            software_revision: None,
        };
        assert!(state.server.device_info.populate(&info).is_ok());

        let hardware = state.server.device_info.hardware_revision_get().ok();
        assert_eq!(hardware.as_ref().map(|r| r.as_bytes()), Some(&b"rev A"[..]));
        let firmware = state.server.device_info.firmware_revision_get().ok();
        assert_eq!(firmware.as_ref().map(|r| r.as_bytes()), Some(&b"0.1.0"[..]));

        assert_eq!(
            state.server.device_info.system_id_get().ok(),
            Some(system_id(SYSTEM_ID_MANUFACTURER, ADDRESS_OUI))
        );
    }
}
