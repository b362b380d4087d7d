//! Tests for the ADXL362 driver
//!
//! These tests run on the target hardware using defmt-test. The sensor is
//! replaced by a register file behind a mock `SpiDevice`.

#![no_std]
#![no_main]

mod common;

use core::convert::Infallible;

use embassy_futures::block_on;
use embedded_hal_async::spi::{ErrorType, Operation, SpiDevice};
use nrf52840_ble_apps::drivers::adxl362::{
    act_inact_ctl, cmd, fifo_ctl, filter_ctl, parse_fifo, power_ctl, reg, Adxl362, Adxl362Error, FifoMode,
    IntPin, InterruptMap, InterruptMode, MeasurementRange, NoiseMode, RESET_CODE,
};

/// Register file speaking the ADXL362 command protocol
struct MockAdxl362 {
    regs: [u8; 256],
    fifo: heapless::Vec<u8, 64>,
    fifo_pos: usize,
    resets: usize,
}

impl MockAdxl362 {
    fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[..4].copy_from_slice(&[0xAD, 0x1D, 0xF2, 0x02]);
        Self {
            regs,
            fifo: heapless::Vec::new(),
            fifo_pos: 0,
            resets: 0,
        }
    }
}

impl ErrorType for MockAdxl362 {
    type Error = Infallible;
}

impl SpiDevice for MockAdxl362 {
    async fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let mut command = None;
        let mut addr = 0u8;

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let mut bytes = bytes.iter().copied();
                    if command.is_none() {
                        command = bytes.next();
                        if command != Some(cmd::READ_FIFO) {
                            addr = bytes.next().unwrap_or(0);
                        }
                    }
                    for b in bytes {
                        if command == Some(cmd::WRITE_REG) {
                            if addr == reg::SOFT_RESET && b == RESET_CODE {
                                self.resets += 1;
                            }
                            self.regs[addr as usize] = b;
                            addr = addr.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        if command == Some(cmd::READ_FIFO) {
                            *b = self.fifo.get(self.fifo_pos).copied().unwrap_or(0);
                            self.fifo_pos += 1;
                        } else {
                            *b = self.regs[addr as usize];
                            addr = addr.wrapping_add(1);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() {
        ensure_heap_initialized();
    }

    #[test]
    fn test_register_encoders() {
        assert_eq!(act_inact_ctl(InterruptMode::Loop, true, true), 0x3A);
        assert_eq!(act_inact_ctl(InterruptMode::Linked, false, false), 0x10);
        assert_eq!(act_inact_ctl(InterruptMode::Default, false, true), 0x08);

        assert_eq!(fifo_ctl(FifoMode::Stream, true, 300), 0x0E);
        assert_eq!(fifo_ctl(FifoMode::Triggered, false, 255), 0x03);

        assert_eq!(filter_ctl(MeasurementRange::G8, 0xFF), 0xBF);
        assert_eq!(filter_ctl(MeasurementRange::G2, 0x13), 0x13);

        assert_eq!(power_ctl(NoiseMode::UltraLow, true, true, true), 0x2E);
        assert_eq!(power_ctl(NoiseMode::Normal, false, false, false), 0x00);
        assert_eq!(power_ctl(NoiseMode::Low, true, false, false), 0x12);
    }

    #[test]
    fn test_interrupt_map_bits() {
        let map = InterruptMap {
            awake: true,
            int_low: true,
            ..Default::default()
        };
        assert_eq!(map.bits(), 0xC0);

        let map = InterruptMap {
            data_ready: true,
            act: true,
            ..Default::default()
        };
        assert_eq!(map.bits(), 0x11);
    }

    #[test]
    fn test_parse_fifo_sign_extends() {
        // 0x3FFF is -1, axis tag bits are ignored, 0x2000 is the most negative value
        let bytes = [0xFF, 0x3F, 0x01, 0xC0, 0x00, 0x20, 0xAA];
        let mut out = [0i16; 4];
        assert_eq!(parse_fifo(&bytes, &mut out), 3);
        assert_eq!(&out[..3], &[-1, 1, -8192]);

        // Limited by the output slice
        let mut short = [0i16; 1];
        assert_eq!(parse_fifo(&bytes, &mut short), 1);
    }

    #[test]
    fn test_init_resets_and_sets_power() {
        let mut sensor = Adxl362::new(MockAdxl362::new());
        block_on(sensor.init(NoiseMode::Normal, true, false, false)).unwrap();

        let mock = sensor.release();
        assert_eq!(mock.resets, 1);
        assert_eq!(mock.regs[reg::POWER_CTL as usize], 0x02);
    }

    #[test]
    fn test_identify() {
        let mut sensor = Adxl362::new(MockAdxl362::new());
        assert_eq!(block_on(sensor.read_device_id()), Ok([0xAD, 0x1D, 0xF2, 0x02]));
        assert_eq!(block_on(sensor.identify()), Ok(0x02));

        let mut mock = sensor.release();
        mock.regs[reg::PARTID as usize] = 0x00;
        let mut sensor = Adxl362::new(mock);
        assert_eq!(block_on(sensor.identify()), Err(Adxl362Error::WrongDevice));
    }

    #[test]
    fn test_burst_limit() {
        let mut sensor = Adxl362::new(MockAdxl362::new());
        let data = [0u8; 127];
        assert_eq!(
            block_on(sensor.write_registers(reg::THRESH_ACT_L, &data)),
            Err(Adxl362Error::TooLong)
        );

        let mut buf = [0u8; 127];
        assert_eq!(block_on(sensor.read_registers(reg::DEVID_AD, &mut buf)), Err(Adxl362Error::TooLong));
        assert_eq!(block_on(sensor.read_registers(reg::DEVID_AD, &mut buf[..126])), Ok(()));
    }

    #[test]
    fn test_thresholds_and_times() {
        let mut mock = MockAdxl362::new();
        mock.regs[reg::THRESH_ACT_H as usize] = 0xA8;
        let mut sensor = Adxl362::new(mock);

        block_on(async {
            sensor.set_activity_threshold(0x222).await.unwrap();
            sensor.set_inactivity_threshold(0x96).await.unwrap();
            sensor.set_activity_time(4).await.unwrap();
            sensor.set_inactivity_time(0x1234).await.unwrap();
        });

        let mock = sensor.release();
        assert_eq!(mock.regs[reg::THRESH_ACT_L as usize], 0x22);
        // Upper bits of THRESH_ACT_H are preserved
        assert_eq!(mock.regs[reg::THRESH_ACT_H as usize], 0xAA);
        assert_eq!(mock.regs[reg::THRESH_INACT_L as usize], 0x96);
        assert_eq!(mock.regs[reg::THRESH_INACT_H as usize], 0x00);
        assert_eq!(mock.regs[reg::TIME_ACT as usize], 4);
        assert_eq!(mock.regs[reg::TIME_INACT_L as usize], 0x34);
        assert_eq!(mock.regs[reg::TIME_INACT_H as usize], 0x12);
    }

    #[test]
    fn test_interrupt_configuration() {
        let mut sensor = Adxl362::new(MockAdxl362::new());
        let map = InterruptMap {
            awake: true,
            int_low: true,
            ..Default::default()
        };

        block_on(async {
            sensor.config_intmap(&map, IntPin::Int2).await.unwrap();
            sensor.config_interrupt_mode(InterruptMode::Loop, true, true).await.unwrap();
            sensor.activity_inactivity_interrupt_enable().await.unwrap();
        });

        let mock = sensor.release();
        assert_eq!(mock.regs[reg::INTMAP1 as usize], 0x00);
        assert_eq!(mock.regs[reg::INTMAP2 as usize], 0xC0);
        assert_eq!(mock.regs[reg::ACT_INACT_CTL as usize], 0x3F);
    }

    #[test]
    fn test_single_interrupt_enables() {
        let mut sensor = Adxl362::new(MockAdxl362::new());
        block_on(sensor.activity_interrupt_enable()).unwrap();
        let mock = sensor.release();
        assert_eq!(mock.regs[reg::ACT_INACT_CTL as usize], 0x01);

        let mut sensor = Adxl362::new(mock);
        block_on(sensor.inactivity_interrupt_enable()).unwrap();
        let mock = sensor.release();
        assert_eq!(mock.regs[reg::ACT_INACT_CTL as usize], 0x05);
    }

    #[test]
    fn test_samples() {
        let mut mock = MockAdxl362::new();
        mock.regs[reg::XDATA as usize..reg::XDATA as usize + 3].copy_from_slice(&[0x7F, 0x80, 0x00]);
        mock.regs[reg::XDATA_L as usize..reg::XDATA_L as usize + 6]
            .copy_from_slice(&[0x10, 0x00, 0xF0, 0xFF, 0x00, 0x08]);
        let mut sensor = Adxl362::new(mock);

        assert_eq!(block_on(sensor.sample_byte()), Ok((127, -128, 0)));
        assert_eq!(block_on(sensor.sample_word()), Ok((16, -16, 2048)));
    }

    #[test]
    fn test_fifo() {
        let mut mock = MockAdxl362::new();
        mock.regs[reg::FIFO_ENTRIES_L as usize] = 0x34;
        mock.regs[reg::FIFO_ENTRIES_H as usize] = 0xFE;
        mock.fifo.extend_from_slice(&[0xFF, 0x3F, 0x05, 0x40]).unwrap();
        let mut sensor = Adxl362::new(mock);

        // Only the low two bits of the high byte count
        assert_eq!(block_on(sensor.fifo_entries()), Ok(0x234));

        block_on(sensor.config_fifo(FifoMode::Stream, false, 300)).unwrap();
        let mut buf = [0u8; 4];
        block_on(sensor.read_fifo(&mut buf)).unwrap();
        let mut samples = [0i16; 2];
        assert_eq!(parse_fifo(&buf, &mut samples), 2);
        assert_eq!(samples, [-1, 5]);

        let mock = sensor.release();
        assert_eq!(mock.regs[reg::FIFO_SAMPLES as usize], 300u16 as u8);
        assert_eq!(mock.regs[reg::FIFO_CTL as usize], 0x0A);
    }

    #[test]
    fn test_power_modes_preserve_other_bits() {
        let mut mock = MockAdxl362::new();
        mock.regs[reg::POWER_CTL as usize] = 0x21;
        mock.regs[reg::FILTER_CTL as usize] = 0x13;
        let mut sensor = Adxl362::new(mock);

        block_on(async {
            sensor.measurement_mode().await.unwrap();
            sensor.autosleep().await.unwrap();
            sensor.config_measurement_range(MeasurementRange::G4).await.unwrap();
        });

        let mock = sensor.release();
        assert_eq!(mock.regs[reg::POWER_CTL as usize], 0x26);
        assert_eq!(mock.regs[reg::FILTER_CTL as usize], 0x53);
        assert!(mock.resets == 0);
    }
}
