//! Static BLE Configuration
//!
//! Every application describes its identity and timing with a [`BleConfig`]
//! built in a `const` context. Timing values are stored in the units the
//! SoftDevice expects; use [`msec_to_units`] to convert from milliseconds.

use defmt::Format;

/// Keep the two low address octets from the factory address
pub const DEVICE_ID_DEFAULT: u16 = 0xFFFF;

/// Upper three address octets (little-endian), OUI C0:98:E5
pub const ADDRESS_OUI: [u8; 3] = [0xe5, 0x98, 0xc0];

/// Flash cell holding a user-programmed device address (little-endian),
/// in the last page of the nRF52840 flash
pub const ADDRESS_FLASH_LOCATION: usize = 0x000F_FFF8;

/// Time units used by the SoftDevice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Unit {
    /// Advertising and scan intervals
    Unit0_625ms,
    /// Connection intervals
    Unit1_25ms,
    /// Supervision and advertising timeouts
    Unit10ms,
}

impl Unit {
    const fn micros(self) -> u32 {
        match self {
            Unit::Unit0_625ms => 625,
            Unit::Unit1_25ms => 1250,
            Unit::Unit10ms => 10_000,
        }
    }
}

/// Convert milliseconds into SoftDevice units (truncating)
pub const fn msec_to_units(ms: u32, unit: Unit) -> u32 {
    ((ms as u64 * 1000) / unit.micros() as u64) as u32
}

/// Device identity and timing shared by the applications
#[derive(Debug, Clone, Copy, Format)]
pub struct BleConfig {
    /// Used as the 4th octet of the device address
    pub platform_id: u8,
    /// Lower 16 bits of the address, or [`DEVICE_ID_DEFAULT`]
    pub device_id: u16,
    /// GAP device name, also used in advertisements if there is room
    pub adv_name: &'static str,
    /// Advertising interval (0.625ms units), 20ms to 10.24s
    pub adv_interval: u32,
    /// Minimum connection interval (1.25ms units)
    pub min_conn_interval: u16,
    /// Maximum connection interval (1.25ms units)
    pub max_conn_interval: u16,
}

impl BleConfig {
    pub const fn new(adv_name: &'static str) -> Self {
        Self {
            platform_id: 0x00,
            device_id: DEVICE_ID_DEFAULT,
            adv_name,
            adv_interval: msec_to_units(500, Unit::Unit0_625ms),
            min_conn_interval: msec_to_units(500, Unit::Unit1_25ms) as u16,
            max_conn_interval: msec_to_units(1000, Unit::Unit1_25ms) as u16,
        }
    }

    pub const fn with_platform_id(mut self, platform_id: u8) -> Self {
        self.platform_id = platform_id;
        self
    }

    pub const fn with_device_id(mut self, device_id: u16) -> Self {
        self.device_id = device_id;
        self
    }

    pub const fn with_adv_interval_ms(mut self, ms: u32) -> Self {
        self.adv_interval = msec_to_units(ms, Unit::Unit0_625ms);
        self
    }

    pub const fn with_conn_interval_ms(mut self, min_ms: u32, max_ms: u32) -> Self {
        self.min_conn_interval = msec_to_units(min_ms, Unit::Unit1_25ms) as u16;
        self.max_conn_interval = msec_to_units(max_ms, Unit::Unit1_25ms) as u16;
        self
    }
}

/// Derive the device address (little-endian) from the factory address.
///
/// The top three octets are the fixed OUI and the fourth is the platform id.
/// The bottom two come from `device_id` unless it is [`DEVICE_ID_DEFAULT`],
/// in which case the factory values are kept so boards stay distinct.
pub fn device_address(factory: [u8; 6], cfg: &BleConfig) -> [u8; 6] {
    let low = if cfg.device_id == DEVICE_ID_DEFAULT {
        [factory[0], factory[1]]
    } else {
        cfg.device_id.to_le_bytes()
    };

    [
        low[0],
        low[1],
        cfg.platform_id,
        ADDRESS_OUI[0],
        ADDRESS_OUI[1],
        ADDRESS_OUI[2],
    ]
}

/// Address programmed into the flash cell, or `None` while its two low
/// octets are still erased
pub fn stored_address(cell: [u8; 6]) -> Option<[u8; 6]> {
    if cell[0] == 0xFF && cell[1] == 0xFF {
        None
    } else {
        Some(cell)
    }
}

/// A programmed address wins over the derived one
pub fn resolve_address(cell: [u8; 6], factory: [u8; 6], cfg: &BleConfig) -> [u8; 6] {
    stored_address(cell).unwrap_or_else(|| device_address(factory, cfg))
}
