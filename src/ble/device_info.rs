//! Device Information Service
//!
//! The standard 0x180A service with hardware, firmware and software revision
//! strings and a system id built from the manufacturer id and the OUI used
//! for device addresses.

use heapless::Vec;
use nrf_softdevice::ble::GattValue;

use crate::core::config::ADDRESS_OUI;
use crate::core::error::AppError;

/// Longest revision string kept
pub const REVISION_MAX_LEN: usize = 20;

/// 40-bit manufacturer-defined part of the system id
pub const SYSTEM_ID_MANUFACTURER: u64 = 0xFF_FE30_004F;

/// Variable length string characteristic value; longer input is truncated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GattString<const N: usize>(Vec<u8, N>);

impl<const N: usize> GattString<N> {
    pub fn new(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len().min(N);
        Self(Vec::from_slice(&bytes[..len]).unwrap_or_default())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> GattValue for GattString<N> {
    const MIN_SIZE: usize = 0;
    const MAX_SIZE: usize = N;

    fn from_gatt(data: &[u8]) -> Self {
        Self::from_bytes(data)
    }

    fn to_gatt(&self) -> &[u8] {
        &self.0
    }
}

pub type Revision = GattString<REVISION_MAX_LEN>;

#[nrf_softdevice::gatt_service(uuid = "180a")]
pub struct DeviceInfoService {
    #[characteristic(uuid = "2a27", read)]
    pub hardware_revision: Revision,
    #[characteristic(uuid = "2a26", read)]
    pub firmware_revision: Revision,
    #[characteristic(uuid = "2a28", read)]
    pub software_revision: Revision,
    #[characteristic(uuid = "2a23", read)]
    pub system_id: [u8; 8],
}

/// Revision strings to publish; `None` leaves the characteristic empty
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceInfo<'a> {
    pub hardware_revision: Option<&'a str>,
    pub firmware_revision: Option<&'a str>,
    pub software_revision: Option<&'a str>,
}

/// System id characteristic value: the manufacturer id (low 40 bits) then
/// the OUI, both little-endian
pub fn system_id(manufacturer_id: u64, oui: [u8; 3]) -> [u8; 8] {
    let m = manufacturer_id.to_le_bytes();
    [m[0], m[1], m[2], m[3], m[4], oui[0], oui[1], oui[2]]
}

impl DeviceInfoService {
    /// Write the revision strings and system id into the attribute table
    pub fn populate(&self, info: &DeviceInfo<'_>) -> Result<(), AppError> {
        if let Some(rev) = info.hardware_revision {
            self.hardware_revision_set(&Revision::new(rev)).map_err(|_| AppError::Gatt)?;
        }
        if let Some(rev) = info.firmware_revision {
            self.firmware_revision_set(&Revision::new(rev)).map_err(|_| AppError::Gatt)?;
        }
        if let Some(rev) = info.software_revision {
            self.software_revision_set(&Revision::new(rev)).map_err(|_| AppError::Gatt)?;
        }
        self.system_id_set(&system_id(SYSTEM_ID_MANUFACTURER, ADDRESS_OUI))
            .map_err(|_| AppError::Gatt)
    }
}
