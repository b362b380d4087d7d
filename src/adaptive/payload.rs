//! Beacon Manufacturer Payloads
//!
//! Raw 31-byte advertisements carrying a single manufacturer-specific AD
//! structure. The content is a comma separated list of two letter tags, each
//! followed by a binary field. Multi-byte fields are little-endian.

use defmt::Format;

/// Size of a legacy advertising payload
pub const ADV_LEN: usize = 31;

/// AD length byte: everything after it
const AD_LEN: u8 = (ADV_LEN - 1) as u8;

/// Manufacturer specific data AD type
const AD_TYPE_MANUFACTURER: u8 = 0xff;

/// Field offsets of the adjusting beacon ("ex4") payload
pub mod ex4 {
    pub const INTERVAL: usize = 9;
    pub const EPOCH: usize = 15;
    pub const DATA_IN_EPOCH: usize = 18;
    pub const PACKET_IN_DATA: usize = 23;
    pub const TX_ESTIMATE: usize = 26;
}

/// Field offsets of the scanning deployment ("ex3") payload
pub mod ex3 {
    pub const INTERVAL: usize = 9;
    pub const DATA_COUNTER: usize = 15;
    pub const REDUNDANT: usize = 20;
    pub const SEEN: usize = 26;
}

#[rustfmt::skip]
const EX4_TEMPLATE: [u8; ADV_LEN] = [
    AD_LEN, AD_TYPE_MANUFACTURER,
    b'e', b'x', b'4', b',',
    b'a', b'i', b',',             // advertising interval
    0x00, 0x00, b',',
    b's', b'n', b',',             // sequence numbers
    0x00, 0x00, b',',             // epoch
    0x00, 0x00, 0x00, 0x00, b',', // data in epoch
    0x00, 0x00, b',',             // packet in data
    0x00, 0x00, 0x00, 0x00, b',', // transmissions estimated this epoch
];

#[rustfmt::skip]
const EX3_TEMPLATE: [u8; ADV_LEN] = [
    AD_LEN, AD_TYPE_MANUFACTURER,
    b'e', b'x', b'3', b',',
    b'a', b'i', b',',             // advertising interval
    0x00, 0x00, b',',
    b'r', b'd', b',',             // redundancy counters
    0x00, 0x00, 0x00, 0x00, b',', // unique data counter
    0x00, 0x00, b',',             // redundant packet counter
    b's', b'd', b',',             // scan data
    0x00, 0x00, 0x00, 0x00, b',', // advertisements seen
];

/// Fields of the adjusting beacon advertisement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Format)]
pub struct AdjustingFields {
    /// Advertising interval (0.625ms units)
    pub interval: u16,
    pub epoch: u16,
    pub data_in_epoch: u32,
    pub packet_in_data: u16,
    pub tx_estimate: u32,
}

/// Fields of the scanning deployment advertisement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Format)]
pub struct DeploymentFields {
    /// Advertising interval (0.625ms units)
    pub interval: u16,
    pub data_counter: u32,
    pub redundant: u16,
    pub seen: u32,
}

fn put(buf: &mut [u8; ADV_LEN], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Encode the adjusting beacon payload
pub fn encode_ex4(fields: &AdjustingFields) -> [u8; ADV_LEN] {
    let mut buf = EX4_TEMPLATE;
    put(&mut buf, ex4::INTERVAL, &fields.interval.to_le_bytes());
    put(&mut buf, ex4::EPOCH, &fields.epoch.to_le_bytes());
    put(&mut buf, ex4::DATA_IN_EPOCH, &fields.data_in_epoch.to_le_bytes());
    put(&mut buf, ex4::PACKET_IN_DATA, &fields.packet_in_data.to_le_bytes());
    put(&mut buf, ex4::TX_ESTIMATE, &fields.tx_estimate.to_le_bytes());
    buf
}

/// Encode the scanning deployment payload
pub fn encode_ex3(fields: &DeploymentFields) -> [u8; ADV_LEN] {
    let mut buf = EX3_TEMPLATE;
    put(&mut buf, ex3::INTERVAL, &fields.interval.to_le_bytes());
    put(&mut buf, ex3::DATA_COUNTER, &fields.data_counter.to_le_bytes());
    put(&mut buf, ex3::REDUNDANT, &fields.redundant.to_le_bytes());
    put(&mut buf, ex3::SEEN, &fields.seen.to_le_bytes());
    buf
}
