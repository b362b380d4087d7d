//! Advertisement Payload Construction
//!
//! Payload shapes the applications advertise (name only, service UUID,
//! manufacturer data, Eddystone-URL and the IoT gateway request), built
//! with the SoftDevice crate's advertisement builder, plus a parser for AD
//! structures in received reports.

use defmt::Format;
use heapless::Vec;
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
    ServiceUuid16,
};

/// Maximum legacy advertising / scan response payload length
pub const MAX_ADV_DATA_LEN: usize = 31;

/// Largest AD structure value that fits a legacy payload
const MAX_AD_VALUE_LEN: usize = MAX_ADV_DATA_LEN - 2;

/// Bluetooth assigned AD types, for matching parsed structures
pub mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const SERVICES_16_COMPLETE: u8 = 0x03;
    pub const SERVICES_128_COMPLETE: u8 = 0x07;
    pub const SHORT_NAME: u8 = 0x08;
    pub const FULL_NAME: u8 = 0x09;
    pub const SERVICE_DATA_16: u8 = 0x16;
    pub const MANUFACTURER_DATA: u8 = 0xff;
}

/// LE General Discoverable, BR/EDR not supported
pub const FLAGS_LE_ONLY_GENERAL_DISC: u8 = 0x06;

/// Eddystone service UUID
pub const EDDYSTONE_UUID: u16 = 0xFEAA;

/// Eddystone-URL frame type
const EDDYSTONE_URL_FRAME: u8 = 0x10;

/// Payload construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum AdvDataError {
    /// The AD structures do not fit in 31 bytes
    Overflow,
    /// A field is outside the range its encoding allows
    InvalidParam,
}

/// One encoded advertising or scan response payload
pub type AdvData = LegacyAdvertisementPayload;

/// Advertising data plus scan response
pub struct AdvPayload {
    pub adv: AdvData,
    pub scan: AdvData,
}

/// Manufacturer specific data for the `simple_adv` shapes
#[derive(Debug, Clone, Copy)]
pub struct ManufData<'a> {
    pub company_id: u16,
    pub data: &'a [u8],
}

fn finish(builder: LegacyAdvertisementBuilder) -> Result<AdvData, AdvDataError> {
    builder.try_build().map_err(|_| AdvDataError::Overflow)
}

/// Concatenate the pieces of one AD structure value
fn ad_value(parts: &[&[u8]]) -> Result<Vec<u8, MAX_AD_VALUE_LEN>, AdvDataError> {
    let mut value = Vec::new();
    for part in parts {
        value.extend_from_slice(part).map_err(|_| AdvDataError::Overflow)?;
    }
    Ok(value)
}

fn discoverable() -> LegacyAdvertisementBuilder {
    LegacyAdvertisementBuilder::new().flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
}

/// An empty payload, for advertising without a scan response
pub fn empty() -> Result<AdvData, AdvDataError> {
    finish(LegacyAdvertisementBuilder::new())
}

/// A payload holding a single manufacturer specific structure whose value
/// (company identifier included) is already encoded
pub fn manufacturer_frame(value: &[u8]) -> Result<AdvData, AdvDataError> {
    finish(LegacyAdvertisementBuilder::new().raw(AdvertisementDataType::MANUFACTURER_SPECIFIC_DATA, value))
}

fn full_adv(
    name: &str,
    name_in_adv: bool,
    service_uuid: Option<&[u8; 16]>,
    manuf: Option<ManufData<'_>>,
) -> Result<AdvPayload, AdvDataError> {
    let mut adv = discoverable();
    let mut scan = LegacyAdvertisementBuilder::new();

    if name_in_adv {
        adv = adv.full_name(name);
    } else {
        scan = scan.full_name(name);
    }

    if let Some(uuid) = service_uuid {
        adv = adv.services_128(ServiceList::Complete, core::slice::from_ref(uuid));
    }

    if let Some(manuf) = manuf {
        let value = ad_value(&[&manuf.company_id.to_le_bytes(), manuf.data])?;
        adv = adv.raw(AdvertisementDataType::MANUFACTURER_SPECIFIC_DATA, &value);
    }

    Ok(AdvPayload {
        adv: finish(adv)?,
        scan: finish(scan)?,
    })
}

/// Flags and device name
pub fn only_name(name: &str) -> Result<AdvPayload, AdvDataError> {
    full_adv(name, true, None, None)
}

/// Flags and a 128-bit service UUID (little-endian); the name moves to the
/// scan response
pub fn service(name: &str, service_uuid: &[u8; 16]) -> Result<AdvPayload, AdvDataError> {
    full_adv(name, false, Some(service_uuid), None)
}

/// Flags and manufacturer data; the name moves to the scan response
pub fn manuf_data(name: &str, manuf: ManufData<'_>) -> Result<AdvPayload, AdvDataError> {
    full_adv(name, false, None, Some(manuf))
}

/// Flags, service UUID and manufacturer data; the name moves to the scan response
pub fn service_manuf_data(
    name: &str,
    service_uuid: &[u8; 16],
    manuf: ManufData<'_>,
) -> Result<AdvPayload, AdvDataError> {
    full_adv(name, false, Some(service_uuid), Some(manuf))
}

/// Eddystone-URL scheme prefixes, indexed by their scheme byte
const URL_SCHEMES: [&str; 4] = ["http://www.", "https://www.", "http://", "https://"];

/// Split `url` into its Eddystone scheme byte and the remainder.
///
/// URLs without a known prefix are sent verbatim with the `http://` scheme.
pub fn url_scheme(url: &str) -> (u8, &str) {
    for (code, prefix) in URL_SCHEMES.iter().enumerate() {
        if let Some(rest) = url.strip_prefix(prefix) {
            return (code as u8, rest);
        }
    }
    (2, url)
}

fn eddystone_adv(url: &str, tx_power: i8) -> Result<AdvData, AdvDataError> {
    let (scheme, rest) = url_scheme(url);
    let frame = ad_value(&[
        &EDDYSTONE_UUID.to_le_bytes(),
        &[EDDYSTONE_URL_FRAME, tx_power as u8, scheme],
        rest.as_bytes(),
    ])?;

    finish(
        discoverable()
            .services_16(ServiceList::Complete, &[ServiceUuid16::from_u16(EDDYSTONE_UUID)])
            .raw(AdvertisementDataType::SERVICE_DATA_16, &frame),
    )
}

/// Eddystone-URL beacon with an empty scan response
pub fn eddystone_url(url: &str, tx_power: i8) -> Result<AdvPayload, AdvDataError> {
    Ok(AdvPayload {
        adv: eddystone_adv(url, tx_power)?,
        scan: empty()?,
    })
}

/// Eddystone-URL beacon with name and manufacturer data in the scan response
pub fn eddystone_with_manuf(
    url: &str,
    tx_power: i8,
    name: &str,
    manuf: ManufData<'_>,
) -> Result<AdvPayload, AdvDataError> {
    let manuf_value = ad_value(&[&manuf.company_id.to_le_bytes(), manuf.data])?;
    let scan = LegacyAdvertisementBuilder::new()
        .full_name(name)
        .raw(AdvertisementDataType::MANUFACTURER_SPECIFIC_DATA, &manuf_value);

    Ok(AdvPayload {
        adv: eddystone_adv(url, tx_power)?,
        scan: finish(scan)?,
    })
}

/// Sensors a phone acting as IoT gateway should sample when forwarding data
pub mod gateway_sensors {
    pub const TIME: u8 = 0x80;
    pub const GPS: u8 = 0x40;
    pub const ACCELEROMETER: u8 = 0x20;
    pub const AMBIENT_LIGHT: u8 = 0x10;
    pub const TEXT_INPUT: u8 = 0x08;
    pub const CAMERA: u8 = 0x04;
    pub const WEB_UI: u8 = 0x02;
    pub const IP_OVER_BLE: u8 = 0x01;
}

/// Destination URL bytes in a gateway request
pub const GATEWAY_URL_LEN: usize = 14;

/// URL, incentive/reliability and sensor bytes
const GATEWAY_HEADER_LEN: usize = 16;

/// Application data bytes in a gateway request
pub const GATEWAY_DATA_MAX_LEN: usize = 10;

/// IoT gateway request advertisement.
///
/// The frame is the destination URL truncated or zero padded to 14 bytes,
/// one byte with the incentive program level (high nibble) and reliability
/// level (low nibble), the sensor mask and up to 10 bytes of application
/// data. It travels as 16-bit service data whose UUID is the first two URL
/// bytes read big-endian.
pub fn iot_gateway(
    post_url: &str,
    incentive_level: u8,
    reliability_level: u8,
    sensors: u8,
    data: &[u8],
) -> Result<AdvData, AdvDataError> {
    if incentive_level > 0x0f || reliability_level > 0x0f || data.len() > GATEWAY_DATA_MAX_LEN {
        return Err(AdvDataError::InvalidParam);
    }

    let mut frame = [0u8; GATEWAY_HEADER_LEN + GATEWAY_DATA_MAX_LEN];
    let url = post_url.as_bytes();
    let url_len = url.len().min(GATEWAY_URL_LEN);
    frame[..url_len].copy_from_slice(&url[..url_len]);
    frame[GATEWAY_URL_LEN] = (incentive_level << 4) | reliability_level;
    frame[GATEWAY_URL_LEN + 1] = sensors;
    frame[GATEWAY_HEADER_LEN..GATEWAY_HEADER_LEN + data.len()].copy_from_slice(data);

    let uuid = u16::from_be_bytes([frame[0], frame[1]]);
    let value = ad_value(&[&uuid.to_le_bytes(), &frame[2..GATEWAY_HEADER_LEN + data.len()]])?;

    finish(discoverable().raw(AdvertisementDataType::SERVICE_DATA_16, &value))
}

/// Iterate over the `(ad_type, value)` structures of a received payload.
///
/// Iteration stops at the first zero-length or truncated structure.
pub fn parse_ad_structures(data: &[u8]) -> AdStructures<'_> {
    AdStructures { data }
}

/// Iterator returned by [`parse_ad_structures`]
#[derive(Debug, Clone)]
pub struct AdStructures<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.data.first()? as usize;
        if len < 1 || self.data.len() < len + 1 {
            self.data = &[];
            return None;
        }
        let ad_type = self.data[1];
        let value = &self.data[2..len + 1];
        self.data = &self.data[len + 1..];
        Some((ad_type, value))
    }
}
