//! SoftDevice Convenience Layer
//!
//! Wraps the handful of SoftDevice operations the applications need behind a
//! small configuration-driven API: stack configuration, device address and
//! connection parameters, one-shot and timed non-connectable advertising, and
//! fixed-length scan windows.

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};
use nrf_softdevice::ble::central::{self, ScanConfig, ScanError};
use nrf_softdevice::ble::peripheral::{
    self, AdvertiseError, ConnectableAdvertisement, NonconnectableAdvertisement,
};
use nrf_softdevice::ble::{self, Address, AddressType, Connection};
use nrf_softdevice::{raw, Config, RawError, Softdevice};

use crate::ble::adv_data::AdvPayload;
use crate::core::config::{msec_to_units, resolve_address, BleConfig, Unit, ADDRESS_FLASH_LOCATION};
use crate::core::error::AppError;

/// Connection supervision timeout
const CONN_SUP_TIMEOUT_MS: u32 = 4000;

/// Default ATT MTU
const ATT_MTU: u16 = 23;

/// Scan interval and window (0.625ms units); equal values scan continuously
const SCAN_INTERVAL: u32 = 160;

/// GAP roles the application needs from the SoftDevice
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct Roles {
    pub central: bool,
}

impl Roles {
    /// Advertising only
    pub const PERIPHERAL: Roles = Roles { central: false };
    /// Advertising plus scanning
    pub const PERIPHERAL_CENTRAL: Roles = Roles { central: true };
}

impl From<AdvertiseError> for AppError {
    fn from(_: AdvertiseError) -> Self {
        AppError::Advertise
    }
}

impl From<ScanError> for AppError {
    fn from(_: ScanError) -> Self {
        AppError::Scan
    }
}

/// Build the SoftDevice configuration for `cfg`.
///
/// The device name buffer is owned by the application (`adv_name` is
/// `'static`), so the stack is told not to copy it.
pub fn softdevice_config(cfg: &BleConfig, roles: Roles) -> Config {
    let name_len = cfg.adv_name.len() as u16;

    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: u8::from(roles.central),
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: cfg.adv_name.as_ptr() as _,
            current_len: name_len,
            max_len: name_len,
            write_perm: raw::ble_gap_conn_sec_mode_t {
                // disable write permissions
                _bitfield_1: raw::ble_gap_conn_sec_mode_t::new_bitfield_1(0, 0),
            },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_USER as u8),
        }),
        ..Default::default()
    }
}

/// Apply the device address and preferred connection parameters.
///
/// An address programmed at [`ADDRESS_FLASH_LOCATION`] is used as is;
/// otherwise it is derived from the factory address and `cfg`.
pub fn init(sd: &Softdevice, cfg: &BleConfig) -> Result<(), RawError> {
    let factory = ble::get_address(sd).bytes();
    // Flash is memory mapped and readable while the SoftDevice runs
    let cell = unsafe { core::ptr::read_volatile(ADDRESS_FLASH_LOCATION as *const [u8; 6]) };
    let addr = resolve_address(cell, factory, cfg);
    ble::set_address(sd, &Address::new(AddressType::Public, addr));
    info!(
        "Device address {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        addr[5], addr[4], addr[3], addr[2], addr[1], addr[0]
    );

    let params = raw::ble_gap_conn_params_t {
        min_conn_interval: cfg.min_conn_interval,
        max_conn_interval: cfg.max_conn_interval,
        slave_latency: 0,
        conn_sup_timeout: msec_to_units(CONN_SUP_TIMEOUT_MS, Unit::Unit10ms) as u16,
    };
    let ret = unsafe { raw::sd_ble_gap_ppcp_set(&params) };
    RawError::convert(ret)
}

fn nonconnectable<'a>(adv_data: &'a [u8], scan_data: &'a [u8]) -> NonconnectableAdvertisement<'a> {
    if scan_data.is_empty() {
        NonconnectableAdvertisement::NonscannableUndirected { adv_data }
    } else {
        NonconnectableAdvertisement::ScannableUndirected { adv_data, scan_data }
    }
}

/// Length of an advertising interval given in 0.625ms units
pub fn interval_duration(interval: u32) -> Duration {
    Duration::from_micros(u64::from(interval) * 625)
}

/// Transmit exactly one advertising event.
///
/// Returning from this call is the point at which the next payload may be
/// prepared, like an "after advertisement" radio notification. The call
/// returns as soon as the event is sent; callers that send a stream of
/// events pace them with [`PacedAdvertiser`].
pub async fn advertise_once(
    sd: &Softdevice,
    adv_data: &[u8],
    scan_data: &[u8],
    interval: u32,
) -> Result<(), AdvertiseError> {
    let config = peripheral::Config {
        interval,
        max_events: Some(1),
        ..Default::default()
    };

    match peripheral::advertise(sd, nonconnectable(adv_data, scan_data), &config).await {
        Ok(()) | Err(AdvertiseError::Timeout) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Single advertising events whose starts are at least one interval apart.
///
/// Spacing is measured from the start of the previous event, so time spent
/// scanning or backing off between events counts toward the wait.
pub struct PacedAdvertiser {
    interval: u32,
    last_event: Option<Instant>,
}

impl PacedAdvertiser {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            last_event: None,
        }
    }

    /// Advertising interval in 0.625ms units
    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: u32) {
        self.interval = interval;
    }

    /// Wait out the interval since the previous event, then send one event
    pub async fn send(&mut self, sd: &Softdevice, adv_data: &[u8], scan_data: &[u8]) -> Result<(), AdvertiseError> {
        if let Some(last) = self.last_event {
            Timer::at(last + interval_duration(self.interval)).await;
        }
        self.last_event = Some(Instant::now());
        advertise_once(sd, adv_data, scan_data, self.interval).await
    }
}

/// Advertise `payload` at `interval` until `duration` elapses.
pub async fn advertise_for(
    sd: &Softdevice,
    payload: &AdvPayload,
    interval: u32,
    duration: Duration,
) -> Result<(), AdvertiseError> {
    let config = peripheral::Config {
        interval,
        ..Default::default()
    };
    let adv = nonconnectable(&payload.adv, &payload.scan);

    match select(peripheral::advertise(sd, adv, &config), Timer::after(duration)).await {
        Either::First(Ok(())) | Either::First(Err(AdvertiseError::Timeout)) => Ok(()),
        Either::First(Err(e)) => Err(e),
        Either::Second(()) => Ok(()),
    }
}

/// Connectable, scannable advertising until a central connects.
pub async fn advertise_connectable(
    sd: &Softdevice,
    payload: &AdvPayload,
    cfg: &BleConfig,
) -> Result<Connection, AdvertiseError> {
    let config = peripheral::Config {
        interval: cfg.adv_interval,
        ..Default::default()
    };
    let adv = ConnectableAdvertisement::ScannableUndirected {
        adv_data: &payload.adv,
        scan_data: &payload.scan,
    };
    peripheral::advertise_connectable(sd, adv, &config).await
}

/// Passively scan for `window`, calling `on_report` with the payload length
/// of every advertisement report. Returns the number of reports seen.
pub async fn scan_window<F>(sd: &Softdevice, window: Duration, mut on_report: F) -> Result<u32, ScanError>
where
    F: FnMut(u8),
{
    let config = ScanConfig {
        active: false,
        interval: SCAN_INTERVAL,
        window: SCAN_INTERVAL,
        ..Default::default()
    };

    let mut count: u32 = 0;
    debug!("Starting scan");
    let result = select(
        central::scan::<_, ()>(sd, &config, |report| {
            count = count.saturating_add(1);
            on_report(report.data.len.min(u16::from(u8::MAX)) as u8);
            None
        }),
        Timer::after(window),
    )
    .await;

    match result {
        Either::First(Err(e)) => {
            warn!("Scan stopped early: {:?}", defmt::Debug2Format(&e));
            Err(e)
        }
        Either::First(Ok(())) | Either::Second(()) => Ok(count),
    }
}

/// Dispatch SoftDevice events; must be spawned right after `Softdevice::enable`
#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
