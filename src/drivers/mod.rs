//! Peripheral and Device Drivers
//!
//! Board LEDs, UART line protocols and the ADXL362 accelerometer.

pub mod adxl362;
pub mod led;
pub mod nmea;
pub mod uart;
