//! Application Error Types
//!
//! Each module reports failures through its own focused error enum. They all
//! convert into [`AppError`] so that application tasks can log a single type.

use defmt::Format;

use crate::ble::adv_data::AdvDataError;
use crate::ble::multi_adv::RotatorError;
use crate::drivers::nmea::NmeaError;

/// Top-level error for application tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum AppError {
    /// Advertisement payload could not be built
    AdvData(AdvDataError),
    /// Advertisement rotator rejected the request
    Rotator(RotatorError),
    /// NMEA sentence could not be parsed
    Nmea(NmeaError),
    /// Accelerometer transfer or identification failed
    Sensor,
    /// SoftDevice refused to start advertising
    Advertise,
    /// SoftDevice refused to start scanning
    Scan,
    /// Attribute value could not be stored
    Gatt,
}

impl From<AdvDataError> for AppError {
    fn from(err: AdvDataError) -> Self {
        AppError::AdvData(err)
    }
}

impl From<RotatorError> for AppError {
    fn from(err: RotatorError) -> Self {
        AppError::Rotator(err)
    }
}

impl From<NmeaError> for AppError {
    fn from(err: NmeaError) -> Self {
        AppError::Nmea(err)
    }
}
