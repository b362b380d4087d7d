//! BLE Building Blocks
//!
//! Advertisement payloads, the advertisement rotator, the device information
//! service and the SoftDevice convenience layer. The link layer itself is
//! the SoftDevice's.

pub mod adv_data;
pub mod device_info;
pub mod multi_adv;
pub mod stack;
