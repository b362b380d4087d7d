#![no_std]

//! nRF52840 BLE Application Library
//!
//! Shared code for the BLE beacon and sensor applications, organized into
//! layers:
//!
//! - `core`: Configuration, device addressing and error types
//! - `ble`: SoftDevice setup, advertisement payloads and rotation
//! - `adaptive`: Packet reception rate estimation and epoch bookkeeping for
//!   the self-adjusting beacons
//! - `drivers`: LED, UART line protocol, NMEA GPS and ADXL362 accelerometer

pub mod adaptive;
pub mod ble;
pub mod core;
pub mod drivers;
